//! AST foundation types: spans, source positions and spanned values.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// A span representing a byte range in source text.
/// This is the canonical span type used throughout the parser.
pub type Span = Range<usize>;

/// A point in source text.
///
/// Lines and columns are 1-based and count characters, matching the
/// `locations` entries of a GraphQL response. `offset` is the 0-based byte
/// offset into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Pos {
    /// Creates a new position.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Computes the position of byte `offset` within `source`.
    ///
    /// Offsets past the end are clamped to the end of the source.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut line = 1;
        let mut column = 1;
        for (index, ch) in source.char_indices() {
            if index >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self::new(line, column, offset)
    }

    /// The line/column pair reported to clients.
    pub fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line and column of a node, as serialized in error `locations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// A value with an associated source span.
///
/// `Spanned<T>` pairs a syntax node or token with its location in source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    /// The wrapped value.
    pub node: T,
    /// The span in source text where this node appears.
    pub span: Span,
    /// The position of the first character of the span.
    pub pos: Pos,
}

impl<T> Spanned<T> {
    /// Creates a new spanned value.
    pub fn new(node: T, span: Span, pos: Pos) -> Self {
        Self { node, span, pos }
    }

    /// Maps the inner value while preserving the span.
    pub fn map<U, F>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            node: f(self.node),
            span: self.span,
            pos: self.pos,
        }
    }

    /// Extracts the inner value, discarding the span.
    pub fn into_inner(self) -> T {
        self.node
    }

    /// Returns a reference to the span.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl<T> AsRef<T> for Spanned<T> {
    fn as_ref(&self) -> &T {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_from_offset_first_line() {
        let pos = Pos::from_offset("{ user }", 2);
        assert_eq!(pos, Pos::new(1, 3, 2));
    }

    #[test]
    fn pos_from_offset_after_newlines() {
        let source = "{\n  user {\n    name\n  }\n}";
        let offset = source.find("name").unwrap();
        let pos = Pos::from_offset(source, offset);
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 5);
        assert_eq!(pos.offset, offset);
    }

    #[test]
    fn pos_counts_characters_not_bytes() {
        let source = "\"é\" x";
        let offset = source.find('x').unwrap();
        assert_eq!(Pos::from_offset(source, offset).column, 5);
    }

    #[test]
    fn pos_clamps_past_end() {
        let pos = Pos::from_offset("ab", 10);
        assert_eq!(pos.offset, 2);
        assert_eq!(pos.column, 3);
    }

    #[test]
    fn spanned_map_keeps_position() {
        let spanned = Spanned::new(5, 10..15, Pos::new(1, 11, 10));
        let mapped = spanned.map(|x| x * 2);
        assert_eq!(mapped.node, 10);
        assert_eq!(mapped.span, 10..15);
        assert_eq!(mapped.pos.column, 11);
    }

    #[test]
    fn location_serializes_line_and_column() {
        let json = serde_json::to_value(Pos::new(2, 4, 9).location()).unwrap();
        assert_eq!(json, serde_json::json!({"line": 2, "column": 4}));
    }
}
