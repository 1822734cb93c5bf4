use crate::environment::EnvRef;
use crate::parser::{ParseError, parse_str};
use crate::reader;
use crate::types::{Lambda, Value, ValueKind};
use thiserror::Error;
use tracing::trace;

// --- Evaluation Error ---

/// Every way evaluation can fail. Errors travel as ordinary values
/// (`ValueKind::Error`); the variant is the kind, `Display` is the message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LispError {
    #[error("Division by zero!")]
    DivisionByZero,
    #[error("Pow base on negative number!")]
    NegativePowBase,
    #[error("Cannot operate on non-number!")]
    NotANumber,
    #[error("This String cannot cast to number!")]
    InvalidNumber,
    #[error("Unsupported operator '{0}'!")]
    UnsupportedOperator(String),
    #[error("First element is not a function!")]
    NotAFunction,
    #[error("Numbers in mod-op must be integers! Overflow occurred in type cast!")]
    ModOverflow,
    #[error("Function '{0}' passed too many arguments!")]
    ListTooManyArguments(&'static str),
    #[error("Function '{0}' passed incorrect types!")]
    ListIncorrectType(&'static str),
    #[error("Function '{0}' passed {{}}!")]
    ListEmpty(&'static str),
    #[error(
        "Function '{func}' passed incorrect type for argument {index}. Got {got}, Expected {expected}."
    )]
    IncorrectType {
        func: &'static str,
        index: usize,
        got: &'static str,
        expected: &'static str,
    },
    #[error("Function '{func}' passed incorrect number of arguments. Got {got}, Expected {expected}.")]
    ArgumentCount {
        func: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("Function '{func}' cannot define non-symbol. Got {got}, Expected Symbol.")]
    NonSymbol { func: &'static str, got: &'static str },
    #[error("Function '{func}' passed too many arguments for symbols. Got {got}, Expected {expected}.")]
    SymbolCountMismatch {
        func: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("Function passed too many arguments. Got {given}, Expected {expected}.")]
    TooManyArguments { given: usize, expected: usize },
    #[error("Unbound symbol: {0}!")]
    UnboundSymbol(String),
    #[error("Symbol '&' not followed by single symbol.")]
    MalformedVariadic,
    #[error("No such function in environment!")]
    UnknownBuiltin,
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, LispError>;

// --- Evaluate Function ---

/// Evaluates a value within the given environment.
///
/// Symbols are resolved, s-expressions are reduced, everything else
/// evaluates to itself. Failures come back as `Error` values.
pub fn evaluate(env: &EnvRef, value: Value) -> Value {
    match value.kind {
        ValueKind::Symbol(name) => {
            let found = env.borrow().get(&name);
            match found {
                Ok(found) => found.with_name(name),
                Err(error) => Value::error(error),
            }
        }
        ValueKind::Sexpr(items) => evaluate_sexpr(env, items),
        kind => Value {
            kind,
            name: value.name,
        },
    }
}

fn evaluate_sexpr(env: &EnvRef, items: Vec<Value>) -> Value {
    // Every child is evaluated, even after an error has been produced.
    let mut items: Vec<Value> = items.into_iter().map(|item| evaluate(env, item)).collect();

    if let Some(index) = items.iter().position(Value::is_error) {
        return items.swap_remove(index);
    }

    let mut items = items.into_iter();
    let Some(head) = items.next() else {
        return Value::sexpr(Vec::new());
    };
    let args: Vec<Value> = items.collect();
    if args.is_empty() {
        return head;
    }
    call(env, head, args)
}

/// Applies a function value to already evaluated arguments.
pub fn call(env: &EnvRef, function: Value, args: Vec<Value>) -> Value {
    match function.kind {
        ValueKind::Builtin(builtin) => {
            trace!(builtin = %builtin.name, args = args.len(), "calling builtin");
            let result = (builtin.func)(env, args).unwrap_or_else(Value::error);
            let bound_name = env.borrow().lookup_by_builtin(builtin.func);
            match bound_name {
                Ok(name) => result.with_name(name),
                Err(_) => result,
            }
        }
        ValueKind::Lambda(lambda) => call_lambda(env, lambda, args),
        _ => Value::error(LispError::NotAFunction),
    }
}

fn call_lambda(env: &EnvRef, mut lambda: Lambda, args: Vec<Value>) -> Value {
    let given = args.len();
    let total = lambda.formals.len();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if lambda.formals.is_empty() {
            return Value::error(LispError::TooManyArguments {
                given,
                expected: total,
            });
        }
        let formal = lambda.formals.remove(0);
        if formal == "&" {
            if lambda.formals.len() != 1 {
                return Value::error(LispError::MalformedVariadic);
            }
            let rest = lambda.formals.remove(0);
            let rest_values: Vec<Value> = std::iter::once(arg).chain(args.by_ref()).collect();
            trace!(formal = %rest, count = rest_values.len(), "binding variadic");
            lambda.env.borrow_mut().put(rest, Value::qexpr(rest_values));
            break;
        }
        trace!(%formal, "binding");
        lambda.env.borrow_mut().put(formal, arg);
    }

    // Variadic formal with nothing left to collect.
    if lambda.formals.first().is_some_and(|formal| formal == "&") {
        if lambda.formals.len() != 2 {
            return Value::error(LispError::MalformedVariadic);
        }
        let rest = lambda.formals.remove(1);
        lambda.formals.clear();
        lambda.env.borrow_mut().put(rest, Value::qexpr(Vec::new()));
    }

    if !lambda.formals.is_empty() {
        trace!(remaining = lambda.formals.len(), "partial application");
        return Value::lambda(lambda);
    }

    // Free symbols in the body resolve through the caller's environment.
    lambda.env.borrow_mut().set_outer(env);
    let body = Value::sexpr(std::mem::take(&mut lambda.body));
    evaluate(&lambda.env, body)
}

/// Parses, reads and evaluates one line of input as a single s-expression.
pub fn eval_str(env: &EnvRef, input: &str) -> Result<Value, ParseError> {
    let root = parse_str(input)?;
    Ok(evaluate(env, reader::read(&root)))
}

/// Evaluates each top-level expression of `input` in turn, as a file would be.
pub fn eval_program(env: &EnvRef, input: &str) -> Result<Vec<Value>, ParseError> {
    let root = parse_str(input)?;
    Ok(reader::read_program(&root)
        .into_iter()
        .map(|value| evaluate(env, value))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    fn global_env() -> EnvRef {
        Environment::new_global_populated()
    }

    fn eval_in(env: &EnvRef, input: &str) -> Value {
        match eval_str(env, input) {
            Ok(value) => value,
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    // Evaluates each line in one fresh global environment, returning the last result.
    fn eval_lines(lines: &[&str]) -> Value {
        let env = global_env();
        let mut last = Value::sexpr(Vec::new());
        for line in lines {
            last = eval_in(&env, line);
        }
        last
    }

    fn assert_eval_display(input: &str, expected: &str) {
        let result = eval_in(&global_env(), input);
        assert_eq!(result.to_string(), expected, "Input: '{}'", input);
    }

    fn assert_eval_error(input: &str, expected: LispError) {
        let result = eval_in(&global_env(), input);
        assert_eq!(
            result.kind,
            ValueKind::Error(expected),
            "Input: '{}'",
            input
        );
    }

    #[test]
    fn test_eval_self_evaluating() {
        assert_eval_display("5", "5");
        assert_eval_display("-4.5", "-4.5");
        assert_eval_display("{a b (c)}", "{a b (c)}");
        assert_eval_display("()", "()");
        assert_eval_display("", "()");
    }

    #[test]
    fn test_eval_symbol_lookup() {
        let env = Environment::new();
        env.borrow_mut().put("x", Value::number(100.0));
        let result = eval_in(&env, "x");
        assert_eq!(result, Value::number(100.0));
        assert_eq!(result.name.as_deref(), Some("x"));

        assert_eq!(
            eval_in(&env, "y").kind,
            ValueKind::Error(LispError::UnboundSymbol("y".to_string()))
        );
    }

    #[test]
    fn test_single_child_is_transparent() {
        assert_eval_display("((5))", "5");
        assert_eval_display("(+)", "<builtin>: +");
        assert_eval_display("+ 1 2", "3");
    }

    #[test]
    fn test_not_a_function() {
        assert_eval_error("(1 2 3)", LispError::NotAFunction);
        assert_eval_error("({+} 1 2)", LispError::NotAFunction);
        assert_eval_error("(() 1)", LispError::NotAFunction);
    }

    #[test]
    fn test_arithmetic() {
        assert_eval_display("(+ 1 2 3)", "6");
        assert_eval_display("(- 5)", "-5");
        assert_eval_display("(- 10 3 2)", "5");
        assert_eval_display("(* 2 3 4)", "24");
        assert_eval_display("(/ 10 4)", "2.5");
        assert_eval_display("(% 7 3)", "1");
        assert_eval_display("(^ 2 10)", "1024");
        assert_eval_display("(^ 0 0)", "1");
        assert_eval_display("(+ 1 (* 2 3))", "7");
        assert_eval_error("(/ 1 0)", LispError::DivisionByZero);
        assert_eval_error("(^ -2 2)", LispError::NegativePowBase);
        assert_eval_error("(+ 1 {2})", LispError::NotANumber);
    }

    #[test]
    fn test_list_operations() {
        assert_eval_display("(head {1 2 3})", "{1}");
        assert_eval_display("(tail {1 2 3})", "{2 3}");
        assert_eval_display("(join {1} {2 3})", "{1 2 3}");
        assert_eval_display("(len {1 2 3})", "3");
        assert_eval_display("(cons 0 {1 2})", "{0 1 2}");
        assert_eval_display("(init {1 2 3})", "{1 2}");
        assert_eval_display("(list 1 2 (+ 1 2))", "{1 2 3}");
        assert_eval_display("(eval {+ 1 2})", "3");
        assert_eval_display("(eval (head {(+ 1 2) (+ 10 20)}))", "3");
        assert_eval_display("(eval (tail {tail tail {5 6 7}}))", "{6 7}");
    }

    #[test]
    fn test_def_is_global() {
        assert_eq!(eval_lines(&["(def {x} 5)", "x"]), Value::number(5.0));
        assert_eq!(
            eval_lines(&["(def {a b} 1 2)", "(+ a b)"]),
            Value::number(3.0)
        );
        assert_eval_display("(def {x} 5)", "()");
    }

    #[test]
    fn test_put_at_top_level_lands_in_global_frame() {
        let env = global_env();
        eval_in(&env, "(= {y} 1)");
        assert_eq!(env.borrow().get("y"), Ok(Value::number(1.0)));
    }

    #[test]
    fn test_put_inside_lambda_stays_local() {
        let env = global_env();
        eval_in(&env, "(def {f} (\\ {v} {= {local} v}))");
        eval_in(&env, "(f 3)");
        assert_eq!(
            eval_in(&env, "local").kind,
            ValueKind::Error(LispError::UnboundSymbol("local".to_string()))
        );

        eval_in(&env, "(def {g} (\\ {v} {def {shared} v}))");
        eval_in(&env, "(g 4)");
        assert_eq!(eval_in(&env, "shared"), Value::number(4.0));
    }

    #[test]
    fn test_currying() {
        let env = global_env();
        eval_in(&env, "(def {add} (\\ {a b} {+ a b}))");
        assert_eq!(eval_in(&env, "((add 1) 2)"), Value::number(3.0));
        assert_eq!(eval_in(&env, "(add 1 2)"), Value::number(3.0));

        let partial = eval_in(&env, "(add 1)");
        assert!(matches!(partial.kind, ValueKind::Lambda(_)));
        assert_eq!(partial.to_string(), "(\\ {b} {+ a b})");

        // The stored definition is untouched by partial application.
        assert_eq!(eval_in(&env, "add").to_string(), "(\\ {a b} {+ a b})");

        eval_in(&env, "(def {inc} (add 1))");
        assert_eq!(eval_in(&env, "(inc 41)"), Value::number(42.0));
        assert_eq!(eval_in(&env, "(inc 1)"), Value::number(2.0));
    }

    #[test]
    fn test_too_many_arguments() {
        let env = global_env();
        eval_in(&env, "(def {add} (\\ {a b} {+ a b}))");
        assert_eq!(
            eval_in(&env, "(add 1 2 3)").kind,
            ValueKind::Error(LispError::TooManyArguments {
                given: 3,
                expected: 2
            })
        );
        assert_eq!(
            eval_in(&env, "(add 1 2 3)").to_string(),
            "Error: Function passed too many arguments. Got 3, Expected 2."
        );
    }

    #[test]
    fn test_variadic() {
        let env = global_env();
        eval_in(&env, "(def {f} (\\ {a & b} {list a b}))");
        assert_eq!(eval_in(&env, "(f 1 2 3)").to_string(), "{1 {2 3}}");
        assert_eq!(eval_in(&env, "(f 1)").to_string(), "{1 {}}");

        eval_in(&env, "(def {all} (\\ {& xs} {xs}))");
        assert_eq!(eval_in(&env, "(all 1 2)").to_string(), "{1 2}");
    }

    #[test]
    fn test_malformed_variadic() {
        let env = global_env();
        eval_in(&env, "(def {f} (\\ {a &} {a}))");
        assert_eq!(
            eval_in(&env, "(f 1 2)").kind,
            ValueKind::Error(LispError::MalformedVariadic)
        );
        assert_eq!(
            eval_in(&env, "(f 1)").kind,
            ValueKind::Error(LispError::MalformedVariadic)
        );

        eval_in(&env, "(def {g} (\\ {& a b} {a}))");
        assert_eq!(
            eval_in(&env, "(g 1)").kind,
            ValueKind::Error(LispError::MalformedVariadic)
        );
    }

    #[test]
    fn test_first_error_wins() {
        // Both children fail; the leftmost error is returned.
        assert_eval_error("(+ 1 (/ 1 0) (head {}))", LispError::DivisionByZero);
        assert_eval_error("(+ 1 (head {}) (/ 1 0))", LispError::ListEmpty("head"));
        assert_eval_error("(undefined (/ 1 0))", LispError::UnboundSymbol("undefined".into()));
    }

    #[test]
    fn test_all_children_evaluated_before_error_check() {
        let env = global_env();
        // The definition happens even though an earlier sibling failed.
        let result = eval_in(&env, "(list (/ 1 0) (def {seen} 1))");
        assert_eq!(result.kind, ValueKind::Error(LispError::DivisionByZero));
        assert_eq!(eval_in(&env, "seen"), Value::number(1.0));
    }

    // Open question: free symbols in a lambda body resolve through the
    // *caller's* environment, not the one the lambda was defined in.
    #[test]
    fn test_free_symbols_resolve_at_call_site() {
        let env = global_env();
        eval_in(&env, "(def {show} (\\ {_} {late}))");
        // `late` does not exist when `show` is created.
        eval_in(&env, "(def {late} 7)");
        assert_eq!(eval_in(&env, "(show 0)"), Value::number(7.0));

        // A caller's local binding is visible to the callee's body.
        eval_in(&env, "(def {outer} (\\ {late} {show 0}))");
        assert_eq!(eval_in(&env, "(outer 99)"), Value::number(99.0));
    }

    #[test]
    fn test_builtin_results_are_named() {
        let result = eval_in(&global_env(), "(head {1 2})");
        assert_eq!(result.name.as_deref(), Some("head"));
    }

    #[test]
    fn test_exit_and_penv_sentinels() {
        let env = global_env();
        assert!(eval_in(&env, "exit").is_exit());
        assert!(!eval_in(&env, "penv").is_exit());
        assert_eq!(eval_in(&env, "(penv 0)"), Value::symbol("penv"));

        let result = eval_in(&env, "(exit 0)");
        assert!(result.is_exit());
        assert!(env.borrow().is_empty());
    }

    #[test]
    fn test_eval_program() {
        let env = global_env();
        let results = eval_program(&env, "(def {x} 5) x (+ x 1)").unwrap();
        let shown: Vec<String> = results.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["()", "5", "6"]);
    }

    #[test]
    fn test_eval_str_parse_error() {
        assert!(matches!(
            eval_str(&global_env(), "(+ 1"),
            Err(ParseError::UnexpectedEof(_))
        ));
    }
}
