//! Query execution.
//!
//! [`execute`] parses and runs a request in one call; [`execute_document`]
//! runs an already parsed document. Both always return an
//! [`ExecutionResult`]: syntax errors, request errors and field errors all
//! end up in its error list.

mod coerce;
mod collect;
mod complete;
mod context;
mod handle;

pub(crate) use coerce::coerce_input_value;
pub use context::ExecutorConfig;
pub use handle::{ExecutionHandle, spawn_execution};

use crate::ast::{Document, Node, OperationDefinition, OperationKind};
use crate::error::LocatedError;
use crate::parser::parse;
use crate::schema::Schema;
use crate::types::Context;
use crate::value::{Map, Value};
use coerce::coerce_variable_values;
use collect::collect_fields;
use complete::execute_fields;
use context::ExecutionContext;
use serde::Serialize;
use std::sync::Arc;

/// The outcome of one execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    /// `None` when execution never started; `Some(Value::Null)` when a
    /// non-null root field failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Errors in response tree order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LocatedError>,
}

impl ExecutionResult {
    /// A result without data.
    pub fn from_errors(errors: Vec<LocatedError>) -> Self {
        Self { data: None, errors }
    }

    /// Returns true when no error was recorded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The conventional `{"data": ..., "errors": [...]}` envelope.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum RequestSource {
    Text(String),
    Document(Arc<Document>),
}

/// Everything one execution needs, owned so it can move to another task.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    schema: Schema,
    source: RequestSource,
    root_value: Value,
    variables: Map,
    operation_name: Option<String>,
    context: Context,
    config: ExecutorConfig,
}

impl ExecutionRequest {
    /// A request for query text, parsed when the request runs.
    pub fn new(schema: Schema, source: impl Into<String>) -> Self {
        Self::with_source(schema, RequestSource::Text(source.into()))
    }

    /// A request for an already parsed document.
    pub fn from_document(schema: Schema, document: Arc<Document>) -> Self {
        Self::with_source(schema, RequestSource::Document(document))
    }

    fn with_source(schema: Schema, source: RequestSource) -> Self {
        Self {
            schema,
            source,
            root_value: Value::Null,
            variables: Map::new(),
            operation_name: None,
            context: Context::default(),
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_root_value(mut self, root_value: impl Into<Value>) -> Self {
        self.root_value = root_value.into();
        self
    }

    pub fn with_variables(mut self, variables: Map) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the request to completion.
    pub async fn execute(&self) -> ExecutionResult {
        let parsed;
        let document = match &self.source {
            RequestSource::Document(document) => document.as_ref(),
            RequestSource::Text(text) => match parse(text) {
                Ok(document) => {
                    parsed = document;
                    &parsed
                }
                Err(error) => {
                    tracing::debug!(error = %error, "request rejected by the parser");
                    return ExecutionResult::from_errors(vec![error.into()]);
                }
            },
        };
        execute_document(
            &self.schema,
            document,
            &self.root_value,
            &self.variables,
            self.operation_name.as_deref(),
            &self.context,
            &self.config,
        )
        .await
    }
}

/// Parses `source` and executes it with the default configuration.
pub async fn execute(
    schema: &Schema,
    source: &str,
    root_value: Value,
    variables: Map,
    operation_name: Option<&str>,
    context: Context,
) -> ExecutionResult {
    let document = match parse(source) {
        Ok(document) => document,
        Err(error) => return ExecutionResult::from_errors(vec![error.into()]),
    };
    execute_document(
        schema,
        &document,
        &root_value,
        &variables,
        operation_name,
        &context,
        &ExecutorConfig::default(),
    )
    .await
}

/// Executes one operation of a parsed document.
pub async fn execute_document(
    schema: &Schema,
    document: &Document,
    root_value: &Value,
    variables: &Map,
    operation_name: Option<&str>,
    context: &Context,
    config: &ExecutorConfig,
) -> ExecutionResult {
    let operation = match select_operation(document, operation_name) {
        Ok(operation) => operation,
        Err(error) => return ExecutionResult::from_errors(vec![error]),
    };
    let Some(root_type) = schema.root_type(operation.kind) else {
        let error = LocatedError::request(format!(
            "Schema is not configured to execute {} operation.",
            operation.kind
        ))
        .with_nodes(vec![operation.node_ref()]);
        return ExecutionResult::from_errors(vec![error]);
    };
    let variables = match coerce_variable_values(schema, operation, variables) {
        Ok(variables) => variables,
        Err(errors) => return ExecutionResult::from_errors(errors),
    };

    tracing::debug!(
        kind = %operation.kind,
        operation = operation.name.as_deref().unwrap_or("<anonymous>"),
        "executing operation"
    );

    let ctx = ExecutionContext {
        schema,
        document,
        operation,
        variables,
        context,
        config,
    };
    let serial = operation.kind == OperationKind::Mutation && config.serial_mutations;
    let collected = collect_fields(&ctx, root_type, [&operation.selection_set], &[]);
    let (data, errors) = execute_fields(&ctx, root_type, root_value, &[], collected, serial).await;

    tracing::debug!(
        errors = errors.len(),
        nulled = data.is_none(),
        "operation finished"
    );
    ExecutionResult {
        data: Some(data.map_or(Value::Null, Value::Object)),
        errors,
    }
}

/// Picks the operation to run.
fn select_operation<'doc>(
    document: &'doc Document,
    operation_name: Option<&str>,
) -> Result<&'doc OperationDefinition, LocatedError> {
    let mut operations = document.operations();
    let (Some(first), None) = (operations.next(), operations.next()) else {
        return select_named(document, operation_name);
    };
    Ok(first)
}

fn select_named<'doc>(
    document: &'doc Document,
    operation_name: Option<&str>,
) -> Result<&'doc OperationDefinition, LocatedError> {
    if document.operations().next().is_none() {
        return Err(LocatedError::request("Must provide an operation."));
    }
    let Some(name) = operation_name else {
        return Err(LocatedError::request(
            "Must provide operation name if query contains multiple operations.",
        ));
    };
    let mut matching = document
        .operations()
        .filter(|operation| operation.name.as_deref() == Some(name));
    match (matching.next(), matching.next()) {
        (Some(operation), None) => Ok(operation),
        (None, _) => Err(LocatedError::request(format!(
            "Unknown operation named \"{name}\"."
        ))),
        (Some(_), Some(_)) => Err(LocatedError::request(format!(
            "Operation name \"{name}\" matches more than one operation."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_operation_is_used_regardless_of_name() {
        let document = parse("query A { a }").unwrap();
        assert!(select_operation(&document, Some("Other")).is_ok());
        assert!(select_operation(&document, None).is_ok());
    }

    #[test]
    fn several_operations_need_a_matching_name() {
        let document = parse("query A { a } query B { b }").unwrap();
        assert_eq!(
            select_operation(&document, Some("B")).unwrap().name.as_deref(),
            Some("B")
        );
        assert_eq!(
            select_operation(&document, None).unwrap_err().message,
            "Must provide operation name if query contains multiple operations."
        );
        assert_eq!(
            select_operation(&document, Some("C")).unwrap_err().message,
            "Unknown operation named \"C\"."
        );
    }

    #[test]
    fn duplicate_names_are_ambiguous() {
        let document = parse("query A { a } query A { b }").unwrap();
        assert!(select_operation(&document, Some("A")).is_err());
    }

    #[test]
    fn fragments_alone_are_not_operations() {
        let document = parse("fragment F on User { id }").unwrap();
        assert_eq!(
            select_operation(&document, None).unwrap_err().message,
            "Must provide an operation."
        );
    }

    #[test]
    fn result_envelope_omits_absent_parts() {
        let result = ExecutionResult::from_errors(vec![LocatedError::request("nope")]);
        assert_eq!(
            result.to_json(),
            serde_json::json!({"errors": [{"message": "nope"}]})
        );
        let ok = ExecutionResult {
            data: Some(Value::Null),
            errors: Vec::new(),
        };
        assert!(ok.is_ok());
        assert_eq!(ok.to_json(), serde_json::json!({"data": null}));
    }
}
