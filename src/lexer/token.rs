//! Token types for GraphQL lexical analysis.

use crate::ast::{Pos, Span};
use smol_str::SmolStr;
use std::fmt;

/// The kind of a lexical token.
///
/// GraphQL has no reserved words: `query`, `mutation`, `fragment`, `on`,
/// `true`, `false` and `null` are all [`TokenKind::Name`] tokens and are
/// interpreted by the parser from context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuators
    Bang,
    LParen,
    RParen,
    Spread,
    Colon,
    Equals,
    At,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// A name such as `user` or `__typename`.
    Name(SmolStr),
    /// `$name`, stored without the `$`.
    Variable(SmolStr),
    /// Integer literal source text, e.g. `-12`.
    IntLiteral(String),
    /// Float literal source text, e.g. `1.5e3`.
    FloatLiteral(String),
    /// String literal with escapes processed (block strings dedented).
    StringLiteral(String),

    Eof,
}

impl TokenKind {
    /// Returns true if this token is a name with exactly the given text.
    pub fn is_name(&self, text: &str) -> bool {
        matches!(self, TokenKind::Name(name) if name == text)
    }

    /// Returns true if this token is a closing delimiter.
    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Spread => write!(f, "'...'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::At => write!(f, "'@'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Name(name) => write!(f, "name '{name}'"),
            TokenKind::Variable(name) => write!(f, "variable '${name}'"),
            TokenKind::IntLiteral(text) => write!(f, "integer {text}"),
            TokenKind::FloatLiteral(text) => write!(f, "float {text}"),
            TokenKind::StringLiteral(_) => write!(f, "string"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its source span and starting position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in source text.
    pub span: Span,
    /// Line, column and offset of the first character.
    pub pos: Pos,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, pos: Pos) -> Self {
        Self { kind, span, pos }
    }

    /// Returns the source slice covered by this token.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}
