use crate::environment::{EnvRef, Environment};
use crate::evaluator::{EvalResult, LispError};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value together with the name it was last resolved under.
///
/// The name is diagnostic only: it is set when a symbol is looked up (or a
/// builtin produces the value) and is ignored by equality.
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub name: Option<String>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Number(f64),
    Error(LispError),
    Symbol(String),
    Builtin(Builtin),
    Lambda(Lambda),
    Sexpr(Vec<Value>),
    Qexpr(Vec<Value>),
}

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Value { kind, name: None }
    }

    pub fn number(n: f64) -> Self {
        Value::new(ValueKind::Number(n))
    }

    pub fn error(error: LispError) -> Self {
        Value::new(ValueKind::Error(error))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::new(ValueKind::Symbol(name.into()))
    }

    pub fn builtin(name: impl Into<String>, func: BuiltinFn) -> Self {
        Value::new(ValueKind::Builtin(Builtin {
            name: name.into(),
            func,
        }))
    }

    pub fn lambda(lambda: Lambda) -> Self {
        Value::new(ValueKind::Lambda(lambda))
    }

    pub fn sexpr(items: Vec<Value>) -> Self {
        Value::new(ValueKind::Sexpr(items))
    }

    pub fn qexpr(items: Vec<Value>) -> Self {
        Value::new(ValueKind::Qexpr(items))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ValueKind::Error(_))
    }

    /// True for the sentinel returned by `exit`, and for the `exit` builtin
    /// itself so a bare `exit` at the prompt also ends the session.
    pub fn is_exit(&self) -> bool {
        match &self.kind {
            ValueKind::Symbol(name) => name == "exit",
            ValueKind::Builtin(builtin) => builtin.name == "exit",
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl From<LispError> for Value {
    fn from(error: LispError) -> Self {
        Value::error(error)
    }
}

impl ValueKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Number(_) => "Number",
            ValueKind::Error(_) => "Error",
            ValueKind::Symbol(_) => "Symbol",
            ValueKind::Builtin(_) | ValueKind::Lambda(_) => "Function",
            ValueKind::Sexpr(_) => "S-Expression",
            ValueKind::Qexpr(_) => "Q-Expression",
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{}", open)?;
    let mut first = true;
    for item in items {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
        first = false;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Number(n) => write!(f, "{}", n),
            ValueKind::Error(e) => write!(f, "Error: {}", e),
            ValueKind::Symbol(s) => write!(f, "{}", s),
            ValueKind::Builtin(builtin) => write!(f, "<builtin>: {}", builtin.name),
            ValueKind::Lambda(lambda) => write!(f, "{}", lambda),
            ValueKind::Sexpr(items) => write_seq(f, items, '(', ')'),
            ValueKind::Qexpr(items) => write_seq(f, items, '{', '}'),
        }
    }
}

pub type BuiltinFn = fn(&EnvRef, Vec<Value>) -> EvalResult;

#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::fn_addr_eq(self.func, other.func) && self.name == other.name
    }
}

/// A user-defined function. Each lambda exclusively owns its environment;
/// arguments of a partial application are bound into it.
pub struct Lambda {
    pub formals: Vec<String>,
    pub body: Vec<Value>,
    pub env: EnvRef,
}

impl Lambda {
    pub fn new(formals: Vec<String>, body: Vec<Value>) -> Self {
        Lambda {
            formals,
            body,
            env: Environment::new(),
        }
    }
}

// Copying a lambda copies its environment too, so no frame is ever shared
// between two values.
impl Clone for Lambda {
    fn clone(&self) -> Self {
        Lambda {
            formals: self.formals.clone(),
            body: self.body.clone(),
            env: Rc::new(RefCell::new(self.env.borrow().clone())),
        }
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.formals == other.formals
            && self.body == other.body
            && *self.env.borrow() == *other.env.borrow()
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("formals", &self.formals)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(\\ {{{}}} ", self.formals.join(" "))?;
        write_seq(f, &self.body, '{', '}')?;
        write!(f, ")")
    }
}
