//! Per-execution state and executor configuration.

use crate::ast::{Document, NodeRef, OperationDefinition};
use crate::error::{FieldError, LocatedError, PathSegment};
use crate::schema::Schema;
use crate::types::Context;
use crate::value::Map;

/// Configuration for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Resolve sibling fields of queries and list elements concurrently.
    pub concurrent_fields: bool,

    /// Resolve top-level mutation fields one after another, in document order.
    pub serial_mutations: bool,

    /// Record a captured backtrace as the error trace instead of the message.
    pub capture_backtrace: bool,

    /// Deepest field nesting allowed; root fields are at depth 1.
    pub max_depth: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrent_fields: true,
            serial_mutations: true,
            capture_backtrace: false,
            max_depth: None,
        }
    }
}

impl ExecutorConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates everything sequentially in document order.
    pub fn sequential() -> Self {
        Self {
            concurrent_fields: false,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_backtraces(mut self) -> Self {
        self.capture_backtrace = true;
        self
    }
}

/// Everything a field needs while one operation executes.
pub(crate) struct ExecutionContext<'doc> {
    pub schema: &'doc Schema,
    pub document: &'doc Document,
    pub operation: &'doc OperationDefinition,
    /// Coerced variable values; absent variables have no entry.
    pub variables: Map,
    pub context: &'doc Context,
    pub config: &'doc ExecutorConfig,
}

impl ExecutionContext<'_> {
    /// Builds a located error for the field at `path`.
    pub fn error(
        &self,
        failure: impl Into<FieldError>,
        nodes: Vec<NodeRef>,
        path: Vec<PathSegment>,
    ) -> LocatedError {
        let error = LocatedError::locate(failure, nodes).with_path(path);
        if self.config.capture_backtrace {
            error.with_captured_trace()
        } else {
            error
        }
    }
}
