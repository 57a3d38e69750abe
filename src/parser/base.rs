//! Shared parser infrastructure for token stream navigation and error handling.

use crate::ast::{Name, Pos, Span};
use crate::diag::Diag;
use crate::lexer::token::{Token, TokenKind};

/// Common error type for parsing operations.
pub type ParseError = Box<Diag>;

/// Common result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest nesting of selection sets, values and types a document may use.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Token stream navigator used by every grammar rule.
///
/// The stream always ends with an EOF token; advancing past it is a no-op.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> TokenStream<'a> {
    /// Creates a new token stream from a token slice ending in EOF.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Runs a recursive grammar rule one nesting level deeper.
    ///
    /// Fails at the current token once [`MAX_NESTING_DEPTH`] is reached.
    pub fn nested<T>(
        &mut self,
        what: &str,
        rule: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Box::new(
                Diag::error(format!(
                    "{what} is nested deeper than {MAX_NESTING_DEPTH} levels"
                ))
                .with_primary_label(self.current().span.clone(), "too deep")
                .with_code("syntax::nesting_too_deep"),
            ));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// Returns the current token.
    ///
    /// If the position is past the end, returns the last token (which should be EOF).
    pub fn current(&self) -> &'a Token {
        let tokens = self.tokens;
        tokens
            .get(self.pos)
            .or_else(|| tokens.last())
            .unwrap_or(&EOF_TOKEN)
    }

    /// Advances to the next token.
    ///
    /// Does nothing if already at EOF (last token).
    pub fn advance(&mut self) {
        if self.pos < self.tokens.len().saturating_sub(1) {
            self.pos += 1;
        }
    }

    /// Checks if the current token matches the given kind.
    pub fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    /// Checks if the current token is the name `text`.
    pub fn check_name(&self, text: &str) -> bool {
        self.current().kind.is_name(text)
    }

    /// Consumes the current token if it matches the given kind.
    pub fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific token kind and returns its span.
    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Span> {
        if self.check(&kind) {
            let span = self.current().span.clone();
            self.advance();
            Ok(span)
        } else {
            Err(self.error_here(format!("expected {kind}, found {}", self.current().kind)))
        }
    }

    /// Expects a name token and returns it with its position.
    pub fn expect_name(&mut self, context: &str) -> ParseResult<(Name, Span, Pos)> {
        let token = self.current();
        match &token.kind {
            TokenKind::Name(name) => {
                self.advance();
                Ok((name.clone(), token.span.clone(), token.pos))
            }
            other => Err(self.error_here(format!("expected {context}, found {other}"))),
        }
    }

    /// Expects the contextual keyword `text`.
    pub fn expect_keyword(&mut self, text: &str) -> ParseResult<Span> {
        if self.check_name(text) {
            let span = self.current().span.clone();
            self.advance();
            Ok(span)
        } else {
            Err(self.error_here(format!(
                "expected '{text}', found {}",
                self.current().kind
            )))
        }
    }

    /// Creates an error at the current token position.
    pub fn error_here(&self, message: impl Into<String>) -> ParseError {
        Box::new(
            Diag::error(message.into())
                .with_primary_label(self.current().span.clone(), "here")
                .with_code("syntax::unexpected_token"),
        )
    }

    /// Creates an error for a delimiter opened at `open` that never closed.
    pub fn unclosed(&self, what: &str, closing: TokenKind, open: &Span) -> ParseError {
        Box::new(
            Diag::error(format!(
                "expected {closing} to close {what}, found {}",
                self.current().kind
            ))
            .with_primary_label(self.current().span.clone(), format!("expected {closing}"))
            .with_secondary_label(open.clone(), format!("{what} opened here"))
            .with_code("syntax::unbalanced_delimiter"),
        )
    }

    /// Returns true when the stream is at EOF.
    pub fn at_eof(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    /// Returns the span of the previous token (useful after consuming a token).
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span.clone()
        } else {
            self.current().span.clone()
        }
    }

    /// Span from `start` to the end of the previously consumed token.
    pub fn span_from(&self, start: &Span) -> Span {
        merge_spans(start, &self.previous_span())
    }
}

static EOF_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    span: 0..0,
    pos: Pos {
        line: 1,
        column: 1,
        offset: 0,
    },
};

/// Merges two spans into a single span covering both.
pub fn merge_spans(start: &Span, end: &Span) -> Span {
    start.start..end.end.max(start.start)
}
