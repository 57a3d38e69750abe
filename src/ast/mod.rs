//! AST foundation types and node structures.

mod document;
mod span;

// Re-export span types
pub use span::{Location, Pos, Span, Spanned};

// Re-export document structure
pub use document::{
    Argument, Definition, Document, Field, FragmentDefinition, FragmentSpread, InlineFragment,
    Name, Node, NodeKind, NodeRef, OperationDefinition, OperationKind, Selection, SelectionSet,
    Type, Value, VariableDefinition, field_nodes,
};
