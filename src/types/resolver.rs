//! Resolvers and the parameters they receive.

use crate::ast::Name;
use crate::error::{FieldResult, PathSegment};
use crate::types::TypeRef;
use crate::value::{Map, Value};
use futures::future::{self, BoxFuture, FutureExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Application data shared by every resolver of one execution.
///
/// Wraps an arbitrary `Send + Sync` value; resolvers recover it with
/// [`Context::data`].
#[derive(Clone, Default)]
pub struct Context {
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Self {
            data: Some(Arc::new(data)),
        }
    }

    /// The wrapped value, if present and of type `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|data| data.downcast_ref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

/// Where in the response a field is being resolved.
#[derive(Debug, Clone)]
pub struct ResolveInfo {
    pub field_name: Name,
    pub parent_type: Name,
    pub return_type: TypeRef,
    pub path: Vec<PathSegment>,
}

/// Borrowed inputs of one resolver call.
#[derive(Debug, Clone, Copy)]
pub struct ResolveParams<'a> {
    /// Value of the parent object.
    pub parent: &'a Value,
    /// Coerced arguments, including defaults.
    pub args: &'a Map,
    pub context: &'a Context,
    pub info: &'a ResolveInfo,
}

impl ResolveParams<'_> {
    /// A coerced argument by name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Copies the parameters for a resolver future that must own them.
    pub fn to_owned(&self) -> OwnedResolveParams {
        OwnedResolveParams {
            parent: self.parent.clone(),
            args: self.args.clone(),
            context: self.context.clone(),
            info: self.info.clone(),
        }
    }
}

/// Owned copy of [`ResolveParams`], handed to asynchronous closures.
#[derive(Debug, Clone)]
pub struct OwnedResolveParams {
    pub parent: Value,
    pub args: Map,
    pub context: Context,
    pub info: ResolveInfo,
}

impl OwnedResolveParams {
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// Computes the value of a field.
pub trait Resolver: Send + Sync {
    fn resolve<'a>(&'a self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult<Value>>;
}

/// Resolver backed by a synchronous closure.
pub struct SyncResolver<F>(F);

impl<F> SyncResolver<F>
where
    F: for<'p> Fn(&ResolveParams<'p>) -> FieldResult<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Resolver for SyncResolver<F>
where
    F: for<'p> Fn(&ResolveParams<'p>) -> FieldResult<Value> + Send + Sync,
{
    fn resolve<'a>(&'a self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult<Value>> {
        future::ready((self.0)(&params)).boxed()
    }
}

/// Resolver backed by a closure returning a future.
pub struct AsyncResolver<F>(F);

impl<F, Fut> AsyncResolver<F>
where
    F: Fn(OwnedResolveParams) -> Fut + Send + Sync,
    Fut: Future<Output = FieldResult<Value>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut> Resolver for AsyncResolver<F>
where
    F: Fn(OwnedResolveParams) -> Fut + Send + Sync,
    Fut: Future<Output = FieldResult<Value>> + Send + 'static,
{
    fn resolve<'a>(&'a self, params: ResolveParams<'a>) -> BoxFuture<'a, FieldResult<Value>> {
        (self.0)(params.to_owned()).boxed()
    }
}

/// Reads the field's response name from an object parent; anything else
/// resolves to null.
pub(crate) fn default_resolve(parent: &Value, field_name: &str) -> Value {
    parent.get(field_name).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    fn info() -> ResolveInfo {
        ResolveInfo {
            field_name: "name".into(),
            parent_type: "User".into(),
            return_type: TypeRef::named("String"),
            path: vec![PathSegment::Key("name".into())],
        }
    }

    #[test]
    fn context_downcasts_to_stored_type() {
        let context = Context::new(42_u32);
        assert_eq!(context.data::<u32>(), Some(&42));
        assert_eq!(context.data::<String>(), None);
        assert_eq!(Context::default().data::<u32>(), None);
    }

    #[tokio::test]
    async fn sync_resolver_reads_args() {
        let resolver = SyncResolver::new(|params: &ResolveParams<'_>| {
            params
                .arg("id")
                .cloned()
                .ok_or_else(|| FieldError::new("missing id"))
        });
        let args: Map = [("id".to_string(), Value::from("1"))].into_iter().collect();
        let info = info();
        let context = Context::default();
        let params = ResolveParams {
            parent: &Value::Null,
            args: &args,
            context: &context,
            info: &info,
        };
        assert_eq!(resolver.resolve(params).await.unwrap(), Value::from("1"));
    }

    #[tokio::test]
    async fn async_resolver_owns_its_inputs() {
        let resolver = AsyncResolver::new(|params: OwnedResolveParams| async move {
            tokio::task::yield_now().await;
            Ok(params.parent.get("name").cloned().unwrap_or_default())
        });
        let parent: Value = [("name", "Ada")].into_iter().collect();
        let args = Map::new();
        let info = info();
        let context = Context::default();
        let params = ResolveParams {
            parent: &parent,
            args: &args,
            context: &context,
            info: &info,
        };
        assert_eq!(resolver.resolve(params).await.unwrap(), Value::from("Ada"));
    }

    #[test]
    fn default_resolver_reads_object_property() {
        let parent: Value = [("name", "Ada")].into_iter().collect();
        assert_eq!(default_resolve(&parent, "name"), Value::from("Ada"));
        assert_eq!(default_resolve(&parent, "age"), Value::Null);
        assert_eq!(default_resolve(&Value::from(3), "name"), Value::Null);
    }
}
