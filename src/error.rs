//! Resolver failures and located errors.
//!
//! Resolvers and coercion functions report failure by returning a
//! [`FieldError`]. The executor turns every failure into a [`LocatedError`]
//! that records the AST nodes responsible and the response path at which the
//! failure surfaced.

use crate::ast::{Location, NodeKind, NodeRef};
use crate::parser::SyntaxError;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Message used when a failure carries no usable message of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Shared, type-erased underlying cause of a failure.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Result type returned by resolvers.
pub type FieldResult<T> = Result<T, FieldError>;

/// A failure raised while computing a field's value.
///
/// Carries a message, an underlying cause, both, or neither. Any
/// `std::error::Error` converts into a `FieldError` with `?`.
#[derive(Debug, Clone, Default)]
pub struct FieldError {
    message: Option<String>,
    cause: Option<Cause>,
}

impl FieldError {
    /// A failure with a message and no cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            cause: None,
        }
    }

    /// A failure that carries no information at all.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Attaches an underlying cause.
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// The message to report: the explicit message if it is non-empty,
    /// otherwise the cause's message if that is non-empty.
    pub fn message(&self) -> Option<String> {
        match &self.message {
            Some(message) if !message.is_empty() => Some(message.clone()),
            _ => self
                .cause
                .as_ref()
                .map(ToString::to_string)
                .filter(|message| !message.is_empty()),
        }
    }

    /// The underlying cause, if any.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl<E> From<E> for FieldError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            message: None,
            cause: Some(Arc::new(error)),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "{DEFAULT_ERROR_MESSAGE}"),
        }
    }
}

/// One step of a response path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An error annotated with the AST nodes responsible for it.
#[derive(Debug, Clone)]
pub struct LocatedError {
    /// Message reported to clients.
    pub message: String,
    /// Underlying cause, if the failure carried one.
    pub cause: Option<Cause>,
    /// Implicated nodes, exactly as supplied.
    pub nodes: Vec<NodeRef>,
    /// Diagnostic trace text.
    pub trace: Option<String>,
    /// Response path of the field that failed; empty for request errors.
    pub path: Vec<PathSegment>,
}

impl LocatedError {
    /// Wraps `failure` with the nodes responsible for it.
    ///
    /// The node list is stored as given, without reordering or deduplication.
    /// The trace records the message.
    pub fn locate(failure: impl Into<FieldError>, nodes: Vec<NodeRef>) -> Self {
        let failure = failure.into();
        let message = failure
            .message()
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
        Self {
            trace: Some(message.clone()),
            message,
            cause: failure.cause,
            nodes,
            path: Vec::new(),
        }
    }

    /// A request-level error with a message and no nodes.
    pub fn request(message: impl Into<String>) -> Self {
        Self::locate(FieldError::new(message), Vec::new())
    }

    /// Replaces the implicated nodes.
    pub fn with_nodes(mut self, nodes: Vec<NodeRef>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Sets the response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Replaces the trace with a backtrace captured at this point.
    pub fn with_captured_trace(mut self) -> Self {
        self.trace = Some(Backtrace::force_capture().to_string());
        self
    }

    /// Line/column of every implicated node, in node order.
    pub fn locations(&self) -> Vec<Location> {
        self.nodes.iter().map(|node| node.pos.location()).collect()
    }
}

impl From<SyntaxError> for LocatedError {
    fn from(error: SyntaxError) -> Self {
        let span = error
            .diag
            .primary_span()
            .cloned()
            .unwrap_or(error.pos.offset..error.pos.offset);
        let node = NodeRef::new(NodeKind::Token, None, span, error.pos);
        Self::locate(FieldError::new(error.to_string()), vec![node])
    }
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(node) = self.nodes.first() {
            write!(f, " ({})", node.pos)?;
        }
        Ok(())
    }
}

impl StdError for LocatedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl Serialize for LocatedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let locations = self.locations();
        let len = 1 + usize::from(!locations.is_empty()) + usize::from(!self.path.is_empty());
        let mut state = serializer.serialize_struct("LocatedError", len)?;
        state.serialize_field("message", &self.message)?;
        if !locations.is_empty() {
            state.serialize_field("locations", &locations)?;
        }
        if !self.path.is_empty() {
            state.serialize_field("path", &self.path)?;
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Pos;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct Boom(&'static str);

    fn node(line: usize, column: usize) -> NodeRef {
        NodeRef::new(
            NodeKind::Field,
            Some("name".into()),
            0..4,
            Pos::new(line, column, 0),
        )
    }

    #[test]
    fn locate_uses_message_verbatim() {
        let err = LocatedError::locate(FieldError::new("boom"), vec![node(1, 16)]);
        assert_eq!(err.message, "boom");
        assert_eq!(err.trace.as_deref(), Some("boom"));
        assert_eq!(err.locations(), vec![Location { line: 1, column: 16 }]);
    }

    #[test]
    fn locate_uses_cause_message() {
        let err = LocatedError::locate(Boom("db down"), vec![]);
        assert_eq!(err.message, "db down");
        assert!(err.cause.is_some());
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("db down"));
    }

    #[test]
    fn locate_substitutes_default_message() {
        assert_eq!(
            LocatedError::locate(FieldError::unknown(), vec![]).message,
            DEFAULT_ERROR_MESSAGE
        );
        assert_eq!(
            LocatedError::locate(FieldError::new(""), vec![]).message,
            DEFAULT_ERROR_MESSAGE
        );
        assert_eq!(
            LocatedError::locate(Boom(""), vec![]).message,
            DEFAULT_ERROR_MESSAGE
        );
    }

    #[test]
    fn explicit_message_wins_over_cause() {
        let failure = FieldError::new("lookup failed").with_cause(Boom("timeout"));
        let err = LocatedError::locate(failure, vec![]);
        assert_eq!(err.message, "lookup failed");
        assert_eq!(err.cause.map(|c| c.to_string()).as_deref(), Some("timeout"));
    }

    #[test]
    fn nodes_are_kept_in_order_with_duplicates() {
        let nodes = vec![node(2, 1), node(1, 1), node(2, 1)];
        let err = LocatedError::locate(FieldError::new("x"), nodes.clone());
        assert_eq!(err.nodes, nodes);
    }

    #[test]
    fn serializes_conventional_shape() {
        let err = LocatedError::locate(FieldError::new("boom"), vec![node(1, 16)]).with_path(vec![
            PathSegment::Key("users".into()),
            PathSegment::Index(0),
            PathSegment::Key("name".into()),
        ]);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "message": "boom",
                "locations": [{"line": 1, "column": 16}],
                "path": ["users", 0, "name"],
            })
        );
    }

    #[test]
    fn request_error_serializes_message_only() {
        let err = LocatedError::request("Must provide operation name");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"message": "Must provide operation name"})
        );
    }

    #[test]
    fn captured_trace_replaces_message_trace() {
        let err = LocatedError::request("x").with_captured_trace();
        assert!(err.trace.is_some());
    }

    #[test]
    fn syntax_error_converts_with_location() {
        let syntax = crate::parse("{ user(id: ) }").unwrap_err();
        let err = LocatedError::from(syntax);
        assert!(err.message.starts_with("Syntax Error: "));
        assert_eq!(err.locations(), vec![Location { line: 1, column: 12 }]);
    }
}
