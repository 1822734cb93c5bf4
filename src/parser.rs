use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use crate::syntax::{SyntaxNode, Tag};
use std::iter::Peekable;
use std::vec::IntoIter;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse Error [at {}]: Unexpected token '{}', expected {expected}", .found.span, .found.kind)]
    UnexpectedToken { found: Token, expected: String },
    #[error("Parse Error: Unexpected end of input during parsing. Expected {0}")]
    UnexpectedEof(String),
    #[error("Lexer Error during parse: {0}")]
    LexerError(#[from] LexerError),
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map_or(0, |t| t.span.end);
        Parser {
            tokens: tokens.into_iter().peekable(),
            end,
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// Parses a single expression from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<SyntaxNode> {
        match self.next_token() {
            Some(token) => self.parse_expr_with_token(token),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    fn parse_expr_with_token(&mut self, token: Token) -> ParseResult<SyntaxNode> {
        match token.kind {
            TokenKind::LParen => self.parse_list(token, Tag::Sexpr, TokenKind::RParen),
            TokenKind::LBrace => self.parse_list(token, Tag::Qexpr, TokenKind::RBrace),
            TokenKind::Number(text) => Ok(SyntaxNode::leaf(Tag::Number, text, token.span)),
            TokenKind::Symbol(text) => Ok(SyntaxNode::leaf(Tag::Symbol, text, token.span)),
            TokenKind::RParen | TokenKind::RBrace => Err(ParseError::UnexpectedToken {
                found: token,
                expected: "an expression".to_string(),
            }),
        }
    }

    /// Parses the contents of a bracketed list up to and including `close`.
    fn parse_list(&mut self, open: Token, tag: Tag, close: TokenKind) -> ParseResult<SyntaxNode> {
        let start = open.span;
        let mut children = vec![SyntaxNode::leaf(
            Tag::Delimiter,
            open.kind.to_string(),
            open.span,
        )];
        loop {
            match self.next_token() {
                Some(token) if token.kind == close => {
                    let span = start.merge(&token.span);
                    children.push(SyntaxNode::leaf(
                        Tag::Delimiter,
                        token.kind.to_string(),
                        token.span,
                    ));
                    return Ok(SyntaxNode::branch(tag, children, span));
                }
                Some(token) if matches!(token.kind, TokenKind::RParen | TokenKind::RBrace) => {
                    return Err(ParseError::UnexpectedToken {
                        found: token,
                        expected: format!("'{}'", close),
                    });
                }
                Some(token) => children.push(self.parse_expr_with_token(token)?),
                None => return Err(ParseError::UnexpectedEof(format!("'{}'", close))),
            }
        }
    }

    /// Parses every top-level expression into a single `root` node.
    pub fn parse(mut self) -> ParseResult<SyntaxNode> {
        let mut children = Vec::new();
        while self.tokens.peek().is_some() {
            children.push(self.parse_expr()?);
        }
        Ok(SyntaxNode::branch(
            Tag::Root,
            children,
            Span::new(0, self.end),
        ))
    }
}

// Helper function to lex and parse a string directly (useful for tests and REPL)
pub fn parse_str(input: &str) -> ParseResult<SyntaxNode> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}
