//! The parse tree handed from the parser to the reader.
//!
//! This is deliberately untyped: every node has a tag, the raw text of the
//! source it covers (for leaves) and an ordered list of children. The reader
//! turns it into a [`Value`](crate::types::Value) tree.

use crate::source::Span;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tag {
    Number,
    Symbol,
    Sexpr,
    Qexpr,
    Root,
    /// Bracket leaves, kept so the tree mirrors the source exactly.
    Delimiter,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Number => "number",
            Tag::Symbol => "symbol",
            Tag::Sexpr => "sexpr",
            Tag::Qexpr => "qexpr",
            Tag::Root => "root",
            Tag::Delimiter => "delimiter",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub tag: Tag,
    pub text: String,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn leaf(tag: Tag, text: impl Into<String>, span: Span) -> Self {
        SyntaxNode {
            tag,
            text: text.into(),
            span,
            children: Vec::new(),
        }
    }

    pub fn branch(tag: Tag, children: Vec<SyntaxNode>, span: Span) -> Self {
        SyntaxNode {
            tag,
            text: String::new(),
            span,
            children,
        }
    }

    /// Children that carry meaning, i.e. everything except bracket leaves.
    pub fn expressions(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children
            .iter()
            .filter(|child| child.tag != Tag::Delimiter)
    }
}
