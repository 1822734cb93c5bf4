//! Builtin functions registered in the global environment.
//!
//! Every builtin receives its already evaluated arguments by value and
//! validates them before doing any work; the first failed check becomes the
//! result.

use crate::environment::{EnvRef, Environment};
use crate::evaluator::{EvalResult, LispError, evaluate};
use crate::types::{Lambda, Value, ValueKind};
use tracing::debug;

// --- Argument helpers ---

/// Destructures exactly `N` arguments or reports the arity mismatch.
fn exact<const N: usize>(func: &'static str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let got = args.len();
    args.try_into().map_err(|_| LispError::ArgumentCount {
        func,
        got,
        expected: N,
    })
}

fn expect_qexpr(func: &'static str, index: usize, value: Value) -> EvalResult<Vec<Value>> {
    match value.kind {
        ValueKind::Qexpr(items) => Ok(items),
        other => Err(LispError::IncorrectType {
            func,
            index,
            got: other.type_name(),
            expected: "Q-Expression",
        }),
    }
}

fn expect_number(value: &Value) -> EvalResult<f64> {
    match value.kind {
        ValueKind::Number(n) => Ok(n),
        _ => Err(LispError::NotANumber),
    }
}

fn expect_symbols(func: &'static str, items: Vec<Value>) -> EvalResult<Vec<String>> {
    items
        .into_iter()
        .map(|item| match item.kind {
            ValueKind::Symbol(name) => Ok(name),
            other => Err(LispError::NonSymbol {
                func,
                got: other.type_name(),
            }),
        })
        .collect()
}

/// `head`, `tail` and `init` share one set of checks, each with its own
/// message: argument count, then type, then emptiness.
fn single_nonempty_list(func: &'static str, args: Vec<Value>) -> EvalResult<Vec<Value>> {
    let [list] = <[Value; 1]>::try_from(args).map_err(|_| LispError::ListTooManyArguments(func))?;
    match list.kind {
        ValueKind::Qexpr(items) if items.is_empty() => Err(LispError::ListEmpty(func)),
        ValueKind::Qexpr(items) => Ok(items),
        _ => Err(LispError::ListIncorrectType(func)),
    }
}

// --- Arithmetic ---

const OPERATORS: [&str; 6] = ["+", "-", "*", "/", "%", "^"];

/// Truncates towards zero, failing when the result does not fit an `i64`.
fn to_integer(n: f64) -> EvalResult<i64> {
    let truncated = n.trunc();
    if truncated.is_nan() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(LispError::ModOverflow);
    }
    Ok(truncated as i64)
}

fn modulo(x: f64, y: f64) -> EvalResult<f64> {
    let (x, y) = (to_integer(x)?, to_integer(y)?);
    if y == 0 {
        return Err(LispError::DivisionByZero);
    }
    x.checked_rem(y)
        .map(|r| r as f64)
        .ok_or(LispError::ModOverflow)
}

fn power(base: f64, exponent: f64) -> EvalResult<f64> {
    if base < 0.0 {
        Err(LispError::NegativePowBase)
    } else if base == 0.0 && exponent == 0.0 {
        Ok(1.0)
    } else {
        Ok(base.powf(exponent))
    }
}

/// Shared reducer for the arithmetic builtins: folds left to right from the
/// first operand. A lone operand to `-` is negated.
pub fn fold_numbers(args: Vec<Value>, operator: &'static str) -> EvalResult {
    if !OPERATORS.contains(&operator) {
        return Err(LispError::UnsupportedOperator(operator.to_string()));
    }
    let numbers = args
        .iter()
        .map(expect_number)
        .collect::<EvalResult<Vec<f64>>>()?;
    let Some((&first, rest)) = numbers.split_first() else {
        return Err(LispError::ArgumentCount {
            func: operator,
            got: 0,
            expected: 1,
        });
    };

    if operator == "-" && rest.is_empty() {
        return Ok(Value::number(-first));
    }

    let mut acc = first;
    for &y in rest {
        acc = match operator {
            "+" => acc + y,
            "-" => acc - y,
            "*" => acc * y,
            "/" if y == 0.0 => return Err(LispError::DivisionByZero),
            "/" => acc / y,
            "%" => modulo(acc, y)?,
            _ => power(acc, y)?,
        };
    }
    Ok(Value::number(acc))
}

pub fn prim_add(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "+")
}

pub fn prim_sub(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "-")
}

pub fn prim_mul(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "*")
}

pub fn prim_div(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "/")
}

pub fn prim_mod(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "%")
}

pub fn prim_pow(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    fold_numbers(args, "^")
}

// --- List operations ---

pub fn prim_list(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    Ok(Value::qexpr(args))
}

pub fn prim_head(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    let mut items = single_nonempty_list("head", args)?;
    items.truncate(1);
    Ok(Value::qexpr(items))
}

pub fn prim_tail(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    let mut items = single_nonempty_list("tail", args)?;
    items.remove(0);
    Ok(Value::qexpr(items))
}

pub fn prim_init(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    let mut items = single_nonempty_list("init", args)?;
    items.pop();
    Ok(Value::qexpr(items))
}

pub fn prim_eval(env: &EnvRef, args: Vec<Value>) -> EvalResult {
    let [list] = exact::<1>("eval", args)?;
    let items = expect_qexpr("eval", 0, list)?;
    Ok(evaluate(env, Value::sexpr(items)))
}

pub fn prim_join(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    if args.is_empty() {
        return Err(LispError::ArgumentCount {
            func: "join",
            got: 0,
            expected: 1,
        });
    }
    let mut joined = Vec::new();
    for (index, arg) in args.into_iter().enumerate() {
        joined.extend(expect_qexpr("join", index, arg)?);
    }
    Ok(Value::qexpr(joined))
}

pub fn prim_cons(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    let [value, list] = exact::<2>("cons", args)?;
    let mut items = expect_qexpr("cons", 1, list)?;
    items.insert(0, value);
    Ok(Value::qexpr(items))
}

pub fn prim_len(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    let [list] = exact::<1>("len", args)?;
    let items = expect_qexpr("len", 0, list)?;
    Ok(Value::number(items.len() as f64))
}

// --- Definitions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    Local,
}

fn define_vars(env: &EnvRef, args: Vec<Value>, func: &'static str, scope: Scope) -> EvalResult {
    let mut args = args.into_iter();
    let Some(symbols) = args.next() else {
        return Err(LispError::ArgumentCount {
            func,
            got: 0,
            expected: 1,
        });
    };
    let names = expect_symbols(func, expect_qexpr(func, 0, symbols)?)?;
    let values: Vec<Value> = args.collect();
    if names.len() != values.len() {
        return Err(LispError::SymbolCountMismatch {
            func,
            got: names.len(),
            expected: values.len(),
        });
    }

    for (name, value) in names.into_iter().zip(values) {
        match scope {
            Scope::Global => Environment::define_global(env, name, value),
            Scope::Local => {
                debug!(%name, "local definition");
                env.borrow_mut().put(name, value);
            }
        }
    }
    Ok(Value::sexpr(Vec::new()))
}

pub fn prim_def(env: &EnvRef, args: Vec<Value>) -> EvalResult {
    define_vars(env, args, "def", Scope::Global)
}

pub fn prim_put(env: &EnvRef, args: Vec<Value>) -> EvalResult {
    define_vars(env, args, "=", Scope::Local)
}

pub fn prim_lambda(_env: &EnvRef, args: Vec<Value>) -> EvalResult {
    let [formals, body] = exact::<2>("\\", args)?;
    let formals = expect_qexpr("\\", 0, formals)?;
    let body = expect_qexpr("\\", 1, body)?;
    let formals = expect_symbols("\\", formals)?;
    Ok(Value::lambda(Lambda::new(formals, body)))
}

// --- Session control ---

pub fn prim_exit(env: &EnvRef, args: Vec<Value>) -> EvalResult {
    exact::<1>("exit", args)?;
    env.borrow_mut().clear();
    Ok(Value::symbol("exit"))
}

pub fn prim_penv(env: &EnvRef, args: Vec<Value>) -> EvalResult {
    exact::<1>("penv", args)?;
    print!("{}", env.borrow().frame_summary());
    Ok(Value::symbol("penv"))
}
