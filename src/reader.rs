//! Converts the parser's tree into values the evaluator understands.

use crate::evaluator::LispError;
use crate::syntax::{SyntaxNode, Tag};
use crate::types::Value;

/// Reads a whole tree. The root becomes an s-expression of its top-level
/// expressions, which is how a single line of input is evaluated.
pub fn read(node: &SyntaxNode) -> Value {
    match node.tag {
        Tag::Number => read_number(&node.text),
        Tag::Symbol => Value::symbol(node.text.as_str()),
        Tag::Root | Tag::Sexpr => Value::sexpr(read_children(node)),
        Tag::Qexpr => Value::qexpr(read_children(node)),
        // Brackets carry no value of their own.
        Tag::Delimiter => Value::sexpr(Vec::new()),
    }
}

/// Reads each top-level expression separately, for evaluating a file one
/// form at a time.
pub fn read_program(root: &SyntaxNode) -> Vec<Value> {
    read_children(root)
}

fn read_children(node: &SyntaxNode) -> Vec<Value> {
    node.expressions().map(read).collect()
}

fn read_number(text: &str) -> Value {
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::number(n),
        _ => Value::error(LispError::InvalidNumber),
    }
}
