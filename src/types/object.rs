//! Object types, their fields and arguments.

use super::resolver::{
    AsyncResolver, OwnedResolveParams, ResolveParams, Resolver, SyncResolver,
};
use super::TypeRef;
use crate::ast::Name;
use crate::error::FieldResult;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An argument accepted by a field.
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: Name,
    pub ty: TypeRef,
    /// Used when the query omits the argument.
    pub default_value: Option<Value>,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<Name>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// A field of an object type.
#[derive(Clone)]
pub struct FieldDefinition {
    pub name: Name,
    pub ty: TypeRef,
    pub arguments: IndexMap<Name, ArgumentDefinition>,
    /// `None` means the default resolver: property lookup on the parent.
    pub resolver: Option<Arc<dyn Resolver>>,
    pub(crate) duplicate_arguments: Vec<Name>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<Name>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: IndexMap::new(),
            resolver: None,
            duplicate_arguments: Vec::new(),
        }
    }

    /// Adds an argument. A repeated name is kept aside and rejected when the
    /// schema is built.
    pub fn argument(mut self, argument: ArgumentDefinition) -> Self {
        if self.arguments.contains_key(&argument.name) {
            self.duplicate_arguments.push(argument.name.clone());
        } else {
            self.arguments.insert(argument.name.clone(), argument);
        }
        self
    }

    /// Installs a resolver.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Installs a synchronous resolver closure.
    pub fn resolve_with<F>(self, f: F) -> Self
    where
        F: for<'p> Fn(&ResolveParams<'p>) -> FieldResult<Value> + Send + Sync + 'static,
    {
        self.resolver(Arc::new(SyncResolver::new(f)))
    }

    /// Installs an asynchronous resolver closure.
    pub fn resolve_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(OwnedResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FieldResult<Value>> + Send + 'static,
    {
        self.resolver(Arc::new(AsyncResolver::new(f)))
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("arguments", &self.arguments)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

/// A named type with fields.
#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: Name,
    pub fields: IndexMap<Name, FieldDefinition>,
    pub(crate) duplicate_fields: Vec<Name>,
}

impl ObjectType {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            duplicate_fields: Vec::new(),
        }
    }

    /// Adds a field. A repeated name is kept aside and rejected when the
    /// schema is built.
    pub fn field(mut self, field: FieldDefinition) -> Self {
        if self.fields.contains_key(&field.name) {
            self.duplicate_fields.push(field.name.clone());
        } else {
            self.fields.insert(field.name.clone(), field);
        }
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }
}
