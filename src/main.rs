use std::io::Read;
use std::process::ExitCode;

use lispy::{Environment, eval_program};

/// Runs each file named on the command line (or standard input when none is
/// given) in one shared global environment, printing every result.
fn main() -> ExitCode {
    lispy::init_tracing();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    let sources = if paths.is_empty() {
        let mut input = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut input) {
            eprintln!("Failed to read standard input: {}", e);
            return ExitCode::FAILURE;
        }
        vec![("<stdin>".to_string(), input)]
    } else {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            match std::fs::read_to_string(&path) {
                Ok(text) => sources.push((path, text)),
                Err(e) => {
                    eprintln!("Failed to read '{}': {}", path, e);
                    return ExitCode::FAILURE;
                }
            }
        }
        sources
    };

    let env = Environment::new_global_populated();
    let mut status = ExitCode::SUCCESS;
    for (name, text) in sources {
        tracing::info!(source = %name, "running");
        match eval_program(&env, &text) {
            Ok(results) => {
                for result in results {
                    println!("{}", result);
                    if result.is_error() {
                        status = ExitCode::FAILURE;
                    }
                    if result.is_exit() {
                        return status;
                    }
                }
            }
            Err(parse_err) => {
                eprintln!("{}: parse failed", name);
                parse_err.pretty_print(&text);
                return ExitCode::FAILURE;
            }
        }
    }
    status
}
