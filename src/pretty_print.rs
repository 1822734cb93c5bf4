use crate::{LexerError, ParseError};
use ariadne::{Config, Label, Report, ReportKind, Source};

const SOURCE_ID: &str = "REPL";

type ReportBuilder = ariadne::ReportBuilder<'static, (&'static str, std::ops::Range<usize>)>;

impl LexerError {
    fn report(&self) -> ReportBuilder {
        Report::build(ReportKind::Error, (SOURCE_ID, self.span.to_range()))
            .with_message("Lexer Error")
            .with_label(
                Label::new((SOURCE_ID, self.span.to_range())).with_message(self.error.to_string()),
            )
    }
}

impl ParseError {
    fn report(&self, input: &str) -> ReportBuilder {
        match self {
            ParseError::UnexpectedToken { found, expected } => {
                Report::build(ReportKind::Error, (SOURCE_ID, found.span.to_range()))
                    .with_message(format!("Unexpected token: {}", found.kind))
                    .with_label(
                        Label::new((SOURCE_ID, found.span.to_range()))
                            .with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::UnexpectedEof(expected) => {
                let idx = input.len();
                let span = idx.saturating_sub(1)..idx;
                Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
                    .with_message("Unexpected EOF")
                    .with_label(
                        Label::new((SOURCE_ID, span.clone())).with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::LexerError(lex_err) => lex_err.report(),
        }
    }

    /// Renders the error as a plain (uncoloured) annotated report.
    pub fn render(&self, input: &str) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self
            .report(input)
            .with_config(Config::default().with_color(false))
            .finish()
            .write((SOURCE_ID, Source::from(input)), &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    pub fn pretty_print(&self, input: &str) {
        if let Err(e) = self
            .report(input)
            .finish()
            .eprint((SOURCE_ID, Source::from(input)))
        {
            eprintln!("{}", e);
        }
    }
}
