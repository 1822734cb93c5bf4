// Declare modules publicly so they are part of the library interface
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod reader;
pub mod source;
pub mod syntax;
pub mod types;

pub use environment::{EnvRef, Environment};
pub use evaluator::{EvalResult, LispError, eval_program, eval_str, evaluate};
pub use lexer::{LexerError, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_str};
pub use source::Span;
pub use types::{Value, ValueKind};

/// Installs a `tracing` subscriber when `RUST_LOG` is set; otherwise logging
/// stays off. Safe to call more than once.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .try_init();
    }
}
