//! The type system: named scalar and object types and references to them.

mod object;
mod resolver;
mod scalar;
mod type_ref;

pub use object::{ArgumentDefinition, FieldDefinition, ObjectType};
pub(crate) use resolver::default_resolve;
pub use resolver::{
    AsyncResolver, Context, OwnedResolveParams, ResolveInfo, ResolveParams, Resolver,
    SyncResolver,
};
pub use scalar::{BUILTIN_SCALARS, CoerceFn, LiteralFn, ScalarType};
pub use type_ref::TypeRef;

use crate::ast::Name;

/// A type registered in a schema under its name.
#[derive(Debug, Clone)]
pub enum NamedType {
    Scalar(ScalarType),
    Object(ObjectType),
}

impl NamedType {
    pub fn name(&self) -> &Name {
        match self {
            NamedType::Scalar(scalar) => &scalar.name,
            NamedType::Object(object) => &object.name,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarType> {
        match self {
            NamedType::Scalar(scalar) => Some(scalar),
            NamedType::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            NamedType::Object(object) => Some(object),
            NamedType::Scalar(_) => None,
        }
    }

    /// Only scalars may appear in argument and variable positions.
    pub fn is_input_type(&self) -> bool {
        matches!(self, NamedType::Scalar(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NamedType::Scalar(_) => "scalar",
            NamedType::Object(_) => "object",
        }
    }
}

impl From<ScalarType> for NamedType {
    fn from(scalar: ScalarType) -> Self {
        NamedType::Scalar(scalar)
    }
}

impl From<ObjectType> for NamedType {
    fn from(object: ObjectType) -> Self {
        NamedType::Object(object)
    }
}
