//! Schemas: a query root, an optional mutation root and a registry of named types.
//!
//! A schema is validated once, when it is built. Execution never re-checks
//! type references, so every lookup made while executing either succeeds or
//! reflects a malformed query, never a malformed schema.

use crate::ast::{Name, OperationKind};
use crate::diag::{Diag, SourceFile, convert_diag_to_report};
use crate::execution::coerce_input_value;
use crate::types::{FieldDefinition, NamedType, ObjectType, ScalarType, TypeRef};
use indexmap::IndexMap;
use miette::Report;
use std::sync::Arc;

/// Result type for schema construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A problem found while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("type '{0}' is defined more than once")]
    DuplicateType(Name),

    #[error("built-in scalar '{0}' cannot be redefined")]
    BuiltinRedefined(Name),

    #[error("object type '{0}' must define at least one field")]
    EmptyObject(Name),

    #[error("field '{type_name}.{field}' is defined more than once")]
    DuplicateField { type_name: Name, field: Name },

    #[error("argument '{argument}' of field '{type_name}.{field}' is defined more than once")]
    DuplicateArgument {
        type_name: Name,
        field: Name,
        argument: Name,
    },

    #[error("'{location}' refers to unknown type '{referenced}'")]
    UnknownType { location: String, referenced: Name },

    #[error("argument '{location}' has {kind} type '{referenced}', which is not an input type")]
    NotInputType {
        location: String,
        referenced: Name,
        kind: &'static str,
    },

    #[error("argument '{location}' has an invalid default value: {reason}")]
    InvalidDefaultValue { location: String, reason: String },

    #[error("schema has {} problems", .0.len())]
    Invalid(Vec<SchemaError>),
}

impl SchemaError {
    /// Every problem this error stands for.
    pub fn problems(&self) -> &[SchemaError] {
        match self {
            SchemaError::Invalid(problems) => problems,
            other => std::slice::from_ref(other),
        }
    }

    /// Diagnostic listing every problem as a note.
    pub fn to_diag(&self) -> Diag {
        let problems = self.problems();
        let headline = match problems {
            [single] => single.to_string(),
            _ => format!("schema has {} problems", problems.len()),
        };
        problems.iter().fold(
            Diag::error(headline).with_code("schema::invalid"),
            |diag, problem| diag.with_note(problem.to_string()),
        )
    }

    /// Renders the diagnostic. Schemas have no source text, so the report
    /// carries notes only.
    pub fn to_report(&self) -> Report {
        convert_diag_to_report(&self.to_diag(), &SourceFile::new(""))
    }

    fn from_problems(mut problems: Vec<SchemaError>) -> SchemaResult<()> {
        match problems.len() {
            0 => Ok(()),
            1 => Err(problems.remove(0)),
            _ => Err(SchemaError::Invalid(problems)),
        }
    }
}

struct SchemaInner {
    query: ObjectType,
    mutation: Option<ObjectType>,
    types: IndexMap<Name, NamedType>,
}

/// An immutable, validated schema. Cloning is cheap.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    /// Builds and validates a schema. The root types are registered
    /// automatically; `types` lists every other type the roots reach.
    pub fn build(
        query: ObjectType,
        mutation: Option<ObjectType>,
        types: impl IntoIterator<Item = NamedType>,
    ) -> SchemaResult<Schema> {
        let mut builder = SchemaBuilder::new(query);
        if let Some(mutation) = mutation {
            builder = builder.mutation(mutation);
        }
        types
            .into_iter()
            .fold(builder, SchemaBuilder::register)
            .build()
    }

    /// Starts a builder with the given query root.
    pub fn builder(query: ObjectType) -> SchemaBuilder {
        SchemaBuilder::new(query)
    }

    pub fn query_type(&self) -> &ObjectType {
        &self.inner.query
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.inner.mutation.as_ref()
    }

    /// The root type for an operation kind, if the schema has one.
    pub fn root_type(&self, kind: OperationKind) -> Option<&ObjectType> {
        match kind {
            OperationKind::Query => Some(self.query_type()),
            OperationKind::Mutation => self.mutation_type(),
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.inner.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.get_type(name).and_then(NamedType::as_object)
    }

    pub fn scalar(&self, name: &str) -> Option<&ScalarType> {
        self.get_type(name).and_then(NamedType::as_scalar)
    }

    /// All registered types, built-in scalars first.
    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.inner.types.values()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query", &self.inner.query.name)
            .field("mutation", &self.inner.mutation.as_ref().map(|m| &m.name))
            .field("types", &self.inner.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects root and auxiliary types before validation.
pub struct SchemaBuilder {
    query: ObjectType,
    mutation: Option<ObjectType>,
    types: Vec<NamedType>,
}

impl SchemaBuilder {
    pub fn new(query: ObjectType) -> Self {
        Self {
            query,
            mutation: None,
            types: Vec::new(),
        }
    }

    pub fn mutation(mut self, mutation: ObjectType) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Registers a scalar or object type.
    pub fn register(mut self, ty: impl Into<NamedType>) -> Self {
        self.types.push(ty.into());
        self
    }

    /// Validates and freezes the schema, reporting every problem found.
    pub fn build(self) -> SchemaResult<Schema> {
        let mut problems = Vec::new();
        let mut registry: IndexMap<Name, NamedType> = ScalarType::builtins()
            .into_iter()
            .map(|scalar| (scalar.name.clone(), NamedType::Scalar(scalar)))
            .collect();

        let query = self.query.clone();
        let mutation = self.mutation.clone();
        let declared = std::iter::once(NamedType::Object(self.query))
            .chain(self.mutation.map(NamedType::Object))
            .chain(self.types);

        for ty in declared {
            let name = ty.name().clone();
            match registry.get(&name) {
                Some(NamedType::Scalar(existing)) if existing.is_builtin() => {
                    problems.push(SchemaError::BuiltinRedefined(name));
                }
                Some(_) => problems.push(SchemaError::DuplicateType(name)),
                None => {
                    registry.insert(name, ty);
                }
            }
        }

        for object in registry.values().filter_map(NamedType::as_object) {
            check_object(object, &registry, &mut problems);
        }
        SchemaError::from_problems(problems)?;

        let schema = Schema {
            inner: Arc::new(SchemaInner {
                query,
                mutation,
                types: registry,
            }),
        };
        check_defaults(&schema)?;

        tracing::debug!(
            query = %schema.inner.query.name,
            mutation = ?schema.inner.mutation.as_ref().map(|m| m.name.as_str()),
            types = schema.inner.types.len(),
            "schema built"
        );
        Ok(schema)
    }
}

fn check_object(
    object: &ObjectType,
    registry: &IndexMap<Name, NamedType>,
    problems: &mut Vec<SchemaError>,
) {
    if object.fields.is_empty() {
        problems.push(SchemaError::EmptyObject(object.name.clone()));
    }
    for duplicate in &object.duplicate_fields {
        problems.push(SchemaError::DuplicateField {
            type_name: object.name.clone(),
            field: duplicate.clone(),
        });
    }
    for field in object.fields.values() {
        check_field(object, field, registry, problems);
    }
}

fn check_field(
    object: &ObjectType,
    field: &FieldDefinition,
    registry: &IndexMap<Name, NamedType>,
    problems: &mut Vec<SchemaError>,
) {
    let field_path = format!("{}.{}", object.name, field.name);
    if !registry.contains_key(field.ty.named_type()) {
        problems.push(SchemaError::UnknownType {
            location: field_path.clone(),
            referenced: field.ty.named_type().clone(),
        });
    }
    for duplicate in &field.duplicate_arguments {
        problems.push(SchemaError::DuplicateArgument {
            type_name: object.name.clone(),
            field: field.name.clone(),
            argument: duplicate.clone(),
        });
    }
    for argument in field.arguments.values() {
        let location = format!("{field_path}({}:)", argument.name);
        let referenced = argument.ty.named_type();
        match registry.get(referenced) {
            None => problems.push(SchemaError::UnknownType {
                location,
                referenced: referenced.clone(),
            }),
            Some(ty) if !ty.is_input_type() => problems.push(SchemaError::NotInputType {
                location,
                referenced: referenced.clone(),
                kind: ty.kind_name(),
            }),
            Some(_) => {}
        }
    }
}

fn check_defaults(schema: &Schema) -> SchemaResult<()> {
    let mut problems = Vec::new();
    for object in schema.types().filter_map(NamedType::as_object) {
        for field in object.fields.values() {
            for argument in field.arguments.values() {
                let Some(default) = &argument.default_value else {
                    continue;
                };
                if let Err(reason) = coerce_input_value(schema, default, &argument.ty) {
                    problems.push(SchemaError::InvalidDefaultValue {
                        location: format!("{}.{}({}:)", object.name, field.name, argument.name),
                        reason,
                    });
                }
            }
        }
    }
    SchemaError::from_problems(problems)
}

/// Checks that a type reference is usable for an argument or variable.
pub(crate) fn input_type_error(schema: &Schema, ty: &TypeRef) -> Option<String> {
    match schema.get_type(ty.named_type()) {
        None => Some(format!("Unknown type \"{}\".", ty.named_type())),
        Some(named) if !named.is_input_type() => Some(format!(
            "Type \"{ty}\" is not an input type."
        )),
        Some(_) => None,
    }
}
