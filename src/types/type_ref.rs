//! References to named types, optionally wrapped in list and non-null modifiers.

use crate::ast::{self, Name};
use std::fmt;

/// A possibly wrapped reference to a named type.
///
/// Object types refer to each other by name so that recursive shapes
/// (`User.friends: [User]`) need no reference cycles; the schema checks at
/// construction time that every name resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(Name),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// A reference to the named type `name`.
    pub fn named(name: impl Into<Name>) -> Self {
        TypeRef::Named(name.into())
    }

    /// A list of `item`.
    pub fn list(item: TypeRef) -> Self {
        TypeRef::List(Box::new(item))
    }

    /// This type wrapped in non-null. Already non-null types are returned as is.
    pub fn non_null(self) -> Self {
        match self {
            TypeRef::NonNull(_) => self,
            other => TypeRef::NonNull(Box::new(other)),
        }
    }

    /// Returns true for a non-null wrapper.
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// The innermost named type.
    pub fn named_type(&self) -> &Name {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl From<&ast::Type> for TypeRef {
    fn from(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => TypeRef::Named(name.clone()),
            ast::Type::List(inner) => TypeRef::list(inner.as_ref().into()),
            ast::Type::NonNull(inner) => TypeRef::NonNull(Box::new(inner.as_ref().into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_and_display() {
        let ty = TypeRef::list(TypeRef::named("User").non_null()).non_null();
        assert_eq!(ty.to_string(), "[User!]!");
        assert!(ty.is_non_null());
        assert_eq!(ty.named_type(), "User");
    }

    #[test]
    fn non_null_is_idempotent() {
        let ty = TypeRef::named("ID").non_null().non_null();
        assert_eq!(ty.to_string(), "ID!");
    }

    #[test]
    fn converts_from_ast_type() {
        let ast_ty = ast::Type::List(Box::new(ast::Type::NonNull(Box::new(ast::Type::Named(
            "Int".into(),
        )))));
        assert_eq!(TypeRef::from(&ast_ty).to_string(), "[Int!]");
    }
}
