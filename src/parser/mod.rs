//! Parser for GraphQL executable documents.
//!
//! The parser consumes the token stream produced by the lexer and builds a
//! [`Document`]. Parsing is all-or-nothing: the first lexical or grammatical
//! problem aborts with a [`SyntaxError`] naming the offending position, and no
//! partial AST is returned.

mod base;
mod document;
mod value;

use crate::ast::{Document, Location, Pos};
use crate::diag::{Diag, SourceFile, convert_diag_to_report};
use crate::lexer::Lexer;
use crate::lexer::token::Token;
use base::TokenStream;
use miette::Report;
use std::fmt;

pub use base::MAX_NESTING_DEPTH;

/// A fatal problem in the query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// The diagnostic describing the problem.
    pub diag: Diag,
    /// Position of the offending token.
    pub pos: Pos,
}

impl SyntaxError {
    fn from_diag(diag: Diag, source: &str) -> Self {
        let offset = diag.primary_span().map_or(source.len(), |span| span.start);
        Self {
            pos: Pos::from_offset(source, offset),
            diag,
        }
    }

    /// The bare message, without the `Syntax Error:` prefix.
    pub fn message(&self) -> &str {
        &self.diag.message
    }

    /// Line/column of the offending token.
    pub fn location(&self) -> Location {
        self.pos.location()
    }

    /// Renders this error as a miette report over `source`.
    pub fn to_report(&self, source: &str) -> Report {
        convert_diag_to_report(&self.diag, &SourceFile::new(source))
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax Error: {}", self.diag.message)
    }
}

impl std::error::Error for SyntaxError {}

/// GraphQL document parser.
pub struct Parser<'source> {
    tokens: Vec<Token>,
    source: &'source str,
}

impl<'source> Parser<'source> {
    /// Lexes `source` and prepares a parser over its tokens.
    ///
    /// Lexical errors are reported by [`Parser::parse`].
    pub fn new(source: &'source str) -> Result<Self, SyntaxError> {
        let lexed = Lexer::new(source).tokenize();
        if let Some(diag) = lexed.diagnostics.into_iter().next() {
            return Err(SyntaxError::from_diag(diag, source));
        }
        Ok(Self {
            tokens: lexed.tokens,
            source,
        })
    }

    /// Parses the token stream into a document.
    pub fn parse(self) -> Result<Document, SyntaxError> {
        let mut stream = TokenStream::new(&self.tokens);
        document::parse_document(&mut stream)
            .map_err(|diag| SyntaxError::from_diag(*diag, self.source))
    }
}

/// Parses a GraphQL executable document.
///
/// # Example
///
/// ```
/// use graphql_exec::parse;
///
/// let document = parse(r#"{ user(id: "1") { name } }"#).unwrap();
/// assert_eq!(document.operations().count(), 1);
///
/// let err = parse("{ user { name }").unwrap_err();
/// assert_eq!(err.location().line, 1);
/// ```
pub fn parse(source: &str) -> Result<Document, SyntaxError> {
    Parser::new(source)?.parse()
}
