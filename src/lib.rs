//! GraphQL query execution with located errors.
//!
//! The crate parses GraphQL query documents into an AST, validates schemas
//! built from scalar and object types, and executes operations against them.
//! Every failure is reported as a [`LocatedError`] that names the query
//! nodes responsible, and execution continues around failed fields.
//!
//! # Example
//!
//! ```
//! use graphql_exec::{
//!     execute, Context, FieldDefinition, ObjectType, Map, Schema, TypeRef, Value,
//! };
//!
//! let query = ObjectType::new("Query").field(
//!     FieldDefinition::new("greeting", TypeRef::named("String"))
//!         .resolve_with(|_| Ok(Value::from("hello"))),
//! );
//! let schema = Schema::build(query, None, []).unwrap();
//!
//! let result = futures::executor::block_on(execute(
//!     &schema,
//!     "{ greeting }",
//!     Value::Null,
//!     Map::new(),
//!     None,
//!     Context::default(),
//! ));
//! assert!(result.errors.is_empty());
//! assert_eq!(result.data.unwrap().get("greeting"), Some(&Value::from("hello")));
//! ```

pub mod ast;
pub mod diag;
pub mod error;
pub mod execution;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod types;
pub mod value;

pub use ast::{Document, Location, NodeKind, NodeRef, Pos, Span, Spanned};
pub use diag::{Diag, DiagLabel, LabelRole, SourceFile, convert_diag_to_report};
pub use error::{DEFAULT_ERROR_MESSAGE, FieldError, FieldResult, LocatedError, PathSegment};
pub use execution::{
    ExecutionHandle, ExecutionRequest, ExecutionResult, ExecutorConfig, execute,
    execute_document, spawn_execution,
};
pub use lexer::token::{Token, TokenKind};
pub use lexer::{Lexer, LexerResult, tokenize};
pub use parser::{MAX_NESTING_DEPTH, Parser, SyntaxError, parse};
pub use schema::{Schema, SchemaBuilder, SchemaError, SchemaResult};
pub use types::{
    ArgumentDefinition, Context, FieldDefinition, NamedType, ObjectType, OwnedResolveParams,
    ResolveInfo, ResolveParams, Resolver, ScalarType, TypeRef,
};
pub use value::{Map, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_accessible() {
        let _span: Span = 0..5;
        let spanned = Spanned::new(42, 0..5, Pos::new(1, 1, 0));
        assert_eq!(spanned.node, 42);
        assert_eq!(DEFAULT_ERROR_MESSAGE, "An unknown error occurred.");
    }
}
