//! Common test utilities
//!
//! Shared fixtures and helpers for the integration tests.
//!
//! # Fixtures
//! - [`user_store`] - The in-memory user store handed to resolvers as context
//! - [`user_type`] / [`query_type`] - The `User` and `Query` object types
//! - [`user_schema`] - Schema built from the default fixtures
//!
//! # Execution Helpers
//! - [`run`] - Execute a query against the store, blocking until done
//! - [`run_with_variables`] - Same, with variable bindings given as JSON
//!
//! # Assertion Helpers
//! - [`assert_no_errors`] - Assert that execution recorded no errors
//! - [`messages`] - Collect error messages in order

#![allow(dead_code)]

use graphql_exec::{
    ArgumentDefinition, Context, ExecutionRequest, ExecutionResult, FieldDefinition, FieldError,
    Map, ObjectType, Schema, TypeRef, Value,
};
use serde_json::json;

// ============================================================================
// Fixtures
// ============================================================================

/// Users keyed by id.
pub fn user_store() -> Value {
    Value::from(json!({
        "1": {"id": "1", "name": "Ada", "email": "ada@example.com", "friends": ["2", "3"]},
        "2": {"id": "2", "name": "Grace", "email": null, "friends": ["1"]},
        "3": {"id": "3", "name": "Edsger", "email": "ew@example.com", "friends": ["9"]},
    }))
}

/// Looks up a user in the store passed as context.
pub fn lookup(context: &Context, id: &str) -> Result<Value, FieldError> {
    let store = context
        .data::<Value>()
        .ok_or_else(|| FieldError::new("user store missing from context"))?;
    Ok(store.get(id).cloned().unwrap_or(Value::Null))
}

/// `User { id: String, name: String }`, both served by the default resolver.
pub fn user_type() -> ObjectType {
    ObjectType::new("User")
        .field(FieldDefinition::new("id", TypeRef::named("String")))
        .field(FieldDefinition::new("name", TypeRef::named("String")))
}

/// `friends: [User]`, resolved through the store.
pub fn friends_field() -> FieldDefinition {
    FieldDefinition::new("friends", TypeRef::list(TypeRef::named("User"))).resolve_with(|params| {
        let ids = params.parent.get("friends").and_then(Value::as_list).unwrap_or_default();
        ids.iter()
            .map(|id| lookup(params.context, id.as_str().unwrap_or_default()))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    })
}

/// `user(id: String): User`, resolved through the store.
pub fn user_field() -> FieldDefinition {
    FieldDefinition::new("user", TypeRef::named("User"))
        .argument(ArgumentDefinition::new("id", TypeRef::named("String")))
        .resolve_with(|params| {
            let id = params.arg("id").and_then(Value::as_str).unwrap_or_default();
            lookup(params.context, id)
        })
}

/// `Query { user(id: String): User }`
pub fn query_type() -> ObjectType {
    ObjectType::new("Query").field(user_field())
}

pub fn schema_with(user: ObjectType, query: ObjectType) -> Schema {
    Schema::build(query, None, [user.into()]).unwrap_or_else(|err| panic!("invalid schema: {err}"))
}

pub fn user_schema() -> Schema {
    schema_with(user_type(), query_type())
}

// ============================================================================
// Execution Helpers
// ============================================================================

/// A request against `schema` with the user store as context.
pub fn request(schema: &Schema, source: &str) -> ExecutionRequest {
    ExecutionRequest::new(schema.clone(), source).with_context(Context::new(user_store()))
}

/// Executes `source` against the user store and blocks until done.
pub fn run(schema: &Schema, source: &str) -> ExecutionResult {
    futures::executor::block_on(request(schema, source).execute())
}

/// Executes `source` with variables given as a JSON object.
pub fn run_with_variables(schema: &Schema, source: &str, variables: serde_json::Value) -> ExecutionResult {
    let variables = match Value::from(variables) {
        Value::Object(map) => map,
        other => panic!("variables must be an object, got {other}"),
    };
    futures::executor::block_on(request(schema, source).with_variables(variables).execute())
}

/// The response data as JSON; `null` when absent.
pub fn data(result: &ExecutionResult) -> serde_json::Value {
    result.data.clone().map(Into::into).unwrap_or(serde_json::Value::Null)
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that a result carries no errors.
///
/// # Panics
/// Panics with the error list when any error is present.
pub fn assert_no_errors(result: &ExecutionResult) {
    assert!(
        result.errors.is_empty(),
        "unexpected errors: {:#?}",
        messages(result)
    );
}

/// Error messages in the order they were recorded.
pub fn messages(result: &ExecutionResult) -> Vec<String> {
    result.errors.iter().map(|error| error.message.clone()).collect()
}

/// Builds an object value from JSON.
pub fn object(value: serde_json::Value) -> Map {
    match Value::from(value) {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}
