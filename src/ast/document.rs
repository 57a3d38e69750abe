//! Executable document AST nodes.
//!
//! A [`Document`] is the immutable tree produced by the parser for one request.
//! Every node records its byte [`Span`] and the [`Pos`] of its first character
//! so that failures raised during execution can be reported against the exact
//! part of the query text that caused them.
//!
//! # Examples
//!
//! ```text
//! query UserName($id: ID!) {
//!   person: user(id: $id) {
//!     name
//!     ...Extra
//!   }
//! }
//!
//! fragment Extra on User { id }
//! ```

use crate::ast::{Pos, Span, Spanned};
use smol_str::SmolStr;
use std::fmt;

/// Identifier used for field, argument, type, variable and fragment names.
pub type Name = SmolStr;

/// A parsed executable document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Top-level definitions in source order.
    pub definitions: Vec<Definition>,
    /// Source span.
    pub span: Span,
}

impl Document {
    /// Iterates over the operation definitions in source order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }

    /// Iterates over the fragment definitions in source order.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Fragment(fragment) => Some(fragment),
            Definition::Operation(_) => None,
        })
    }

    /// Looks up a fragment definition by name.
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments().find(|fragment| fragment.name == name)
    }
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

/// The kind of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// A query or mutation operation.
///
/// Shorthand documents (`{ user { name } }`) produce an anonymous query.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    pub name: Option<Name>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub selection_set: SelectionSet,
    pub span: Span,
    pub pos: Pos,
}

/// A variable declared by an operation, e.g. `$id: ID! = "1"`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// Variable name without the leading `$`.
    pub name: Name,
    pub var_type: Type,
    pub default_value: Option<Spanned<Value>>,
    pub span: Span,
    pub pos: Pos,
}

/// A type reference as written in a variable definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Named(Name),
    List(Box<Type>),
    NonNull(Box<Type>),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{name}"),
            Type::List(inner) => write!(f, "[{inner}]"),
            Type::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A named fragment, e.g. `fragment Extra on User { id }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    pub name: Name,
    pub type_condition: Name,
    pub selection_set: SelectionSet,
    pub span: Span,
    pub pos: Pos,
}

/// A braced list of selections.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet {
    pub items: Vec<Selection>,
    pub span: Span,
    pub pos: Pos,
}

/// One entry of a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

/// A requested field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub selection_set: Option<SelectionSet>,
    pub span: Span,
    pub pos: Pos,
}

impl Field {
    /// The key under which this field appears in the response: the alias if
    /// present, otherwise the field name.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Looks up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    /// Returns true when both fields pass the same arguments, ignoring order
    /// and source positions.
    pub fn same_arguments(&self, other: &Field) -> bool {
        self.arguments.len() == other.arguments.len()
            && self.arguments.iter().all(|arg| {
                other
                    .argument(&arg.name)
                    .is_some_and(|theirs| arg.value.node.equivalent(&theirs.value.node))
            })
    }
}

/// `...Name`
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub name: Name,
    pub span: Span,
    pub pos: Pos,
}

/// `... on Type { ... }` or `... { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<Name>,
    pub selection_set: SelectionSet,
    pub span: Span,
    pub pos: Pos,
}

/// `name: value` inside a field's argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Name,
    pub value: Spanned<Value>,
    pub span: Span,
    pub pos: Pos,
}

/// An input value literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `$name`, stored without the leading `$`.
    Variable(Name),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(Name),
    List(Vec<Spanned<Value>>),
    Object(Vec<(Name, Spanned<Value>)>),
}

impl Value {
    /// Structural equality that ignores spans and object field order.
    pub fn equivalent(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(left), Value::List(right)) => {
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right)
                        .all(|(l, r)| l.node.equivalent(&r.node))
            }
            (Value::Object(left), Value::Object(right)) => {
                left.len() == right.len()
                    && left.iter().all(|(name, value)| {
                        right
                            .iter()
                            .find(|(other, _)| other == name)
                            .is_some_and(|(_, theirs)| value.node.equivalent(&theirs.node))
                    })
            }
            _ => self == other,
        }
    }

    /// Short human-readable kind, used in coercion messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Variable(_) => "variable",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Null => "null",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Variable(name) => write!(f, "${name}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Enum(name) => write!(f, "{name}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.node)?;
                }
                write!(f, "]")
            }
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (index, (name, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {}", value.node)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Kind of AST node referenced by an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A single token, used for syntax errors.
    Token,
    Operation,
    VariableDefinition,
    SelectionSet,
    Field,
    FragmentSpread,
    InlineFragment,
    Argument,
    Value,
}

/// A detached reference to an AST node.
///
/// Errors outlive the document they were raised against, so they keep this
/// snapshot of the node's identity and position instead of a borrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub name: Option<Name>,
    pub span: Span,
    pub pos: Pos,
}

impl NodeRef {
    pub fn new(kind: NodeKind, name: Option<Name>, span: Span, pos: Pos) -> Self {
        Self {
            kind,
            name,
            span,
            pos,
        }
    }
}

/// Implemented by every node that can be implicated in an error.
pub trait Node {
    fn node_ref(&self) -> NodeRef;
}

impl Node for OperationDefinition {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(
            NodeKind::Operation,
            self.name.clone(),
            self.span.clone(),
            self.pos,
        )
    }
}

impl Node for VariableDefinition {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(
            NodeKind::VariableDefinition,
            Some(self.name.clone()),
            self.span.clone(),
            self.pos,
        )
    }
}

impl Node for SelectionSet {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(NodeKind::SelectionSet, None, self.span.clone(), self.pos)
    }
}

impl Node for Field {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(
            NodeKind::Field,
            Some(self.name.clone()),
            self.span.clone(),
            self.pos,
        )
    }
}

impl Node for FragmentSpread {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(
            NodeKind::FragmentSpread,
            Some(self.name.clone()),
            self.span.clone(),
            self.pos,
        )
    }
}

impl Node for InlineFragment {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(
            NodeKind::InlineFragment,
            self.type_condition.clone(),
            self.span.clone(),
            self.pos,
        )
    }
}

impl Node for Argument {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(
            NodeKind::Argument,
            Some(self.name.clone()),
            self.span.clone(),
            self.pos,
        )
    }
}

impl Node for Spanned<Value> {
    fn node_ref(&self) -> NodeRef {
        NodeRef::new(NodeKind::Value, None, self.span.clone(), self.pos)
    }
}

/// Converts a list of field nodes into node references, preserving order.
pub fn field_nodes(fields: &[&Field]) -> Vec<NodeRef> {
    fields.iter().map(|field| field.node_ref()).collect()
}
