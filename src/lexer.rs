use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(skip r";[^\n\r]*")] // Skip comments
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    // The literal text is kept; the reader decides whether it is a valid number.
    #[regex(r"-?[0-9]+(?:\.[0-9]*)?", |lex| lex.slice().to_string(), priority = 3)]
    Number(String),
    #[regex(r"[a-zA-Z0-9_+\-*/\\=<>!&%^]+", |lex| lex.slice().to_string())]
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Symbol(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Error, Default, Debug, Clone, PartialEq)]
pub enum LexerErrorKind {
    #[error("Invalid character encountered: '{0}'")]
    InvalidCharacter(char),
    #[default]
    #[error("Invalid Token")]
    InvalidToken,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerRangedResult<T> = Result<T, LexerError>;

/// Tokenizes a whole input string, stopping at the first invalid character.
pub fn tokenize(input: &str) -> LexerRangedResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| match result {
            Ok(kind) => Ok(Token {
                kind,
                span: Span::from(range),
            }),
            Err(error) => {
                // logos only reports the generic error; recover the offending char.
                let error = match input[range.clone()].chars().next() {
                    Some(c) => LexerErrorKind::InvalidCharacter(c),
                    None => error,
                };
                Err(LexerError {
                    error,
                    span: Span::from(range),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> TokenKind {
        TokenKind::Symbol(s.to_string())
    }

    fn num(s: &str) -> TokenKind {
        TokenKind::Number(s.to_string())
    }

    fn assert_tokens(input: &str, expected: Vec<TokenKind>) {
        match tokenize(input) {
            Ok(tokens) => {
                let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
                assert_eq!(kinds, expected, "Input: '{}'", input);
            }
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e.error),
        }
    }

    fn assert_lexer_error(input: &str, expected_error_variant: LexerErrorKind) {
        match tokenize(input) {
            Ok(tokens) => panic!(
                "Expected lexing to fail for input '{}', but got tokens: {:?}",
                input, tokens
            ),
            Err(e) => {
                assert_eq!(
                    std::mem::discriminant(&e.error),
                    std::mem::discriminant(&expected_error_variant),
                    "Input: '{}', Expected error variant like {:?}, got: {:?}",
                    input,
                    expected_error_variant,
                    e
                );
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert_tokens("", vec![]);
        assert_tokens("   \n\t ", vec![]);
    }

    #[test]
    fn test_brackets() {
        assert_tokens("()", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens("{ }", vec![TokenKind::LBrace, TokenKind::RBrace]);
        assert_tokens(
            "({})",
            vec![
                TokenKind::LParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_numbers() {
        assert_tokens("123", vec![num("123")]);
        assert_tokens("-45", vec![num("-45")]);
        assert_tokens("6.78", vec![num("6.78")]);
        assert_tokens("1.", vec![num("1.")]);
    }

    #[test]
    fn test_symbols() {
        for s in ["+", "-", "*", "/", "%", "^", "\\", "=", "&", "head", "a_b", "<=!"] {
            assert_tokens(s, vec![sym(s)]);
        }
        // Longest match: a number prefix followed by letters is one symbol.
        assert_tokens("1a", vec![sym("1a")]);
        assert_tokens("-x", vec![sym("-x")]);
    }

    #[test]
    fn test_expression() {
        assert_tokens(
            "(\\ {a & b} {+ a -1})",
            vec![
                TokenKind::LParen,
                sym("\\"),
                TokenKind::LBrace,
                sym("a"),
                sym("&"),
                sym("b"),
                TokenKind::RBrace,
                TokenKind::LBrace,
                sym("+"),
                sym("a"),
                num("-1"),
                TokenKind::RBrace,
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_comments() {
        assert_tokens("1 ; trailing comment", vec![num("1")]);
        assert_tokens("; only a comment\n2", vec![num("2")]);
        assert_tokens(";", vec![]);
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("(+ 10)").unwrap();
        let spans: Vec<Span> = tokens.iter().map(|t| t.span).collect();
        assert_eq!(
            spans,
            vec![Span::new(0, 1), Span::new(1, 2), Span::new(3, 5), Span::new(5, 6)]
        );
    }

    #[test]
    fn test_invalid_characters() {
        assert_lexer_error("\"str\"", LexerErrorKind::InvalidCharacter('"'));
        assert_lexer_error("(+ 1 #t)", LexerErrorKind::InvalidCharacter('#'));
        let err = tokenize("1 [2]").unwrap_err();
        assert_eq!(err.error, LexerErrorKind::InvalidCharacter('['));
        assert_eq!(err.span, Span::new(2, 3));
    }
}
