//! Field execution and value completion.
//!
//! Every position of the response completes to a [`Completed`] holding the
//! value and the errors raised beneath it. Parents merge their children's
//! buffers in selection order, so the final error list follows the response
//! tree no matter in which order concurrent resolvers finish.

use super::coerce::coerce_argument_values;
use super::collect::{CollectedFields, collect_fields};
use super::context::ExecutionContext;
use crate::ast::{Field, Node, field_nodes};
use crate::error::{FieldError, FieldResult, LocatedError, PathSegment};
use crate::types::{
    FieldDefinition, NamedType, ObjectType, ResolveInfo, ResolveParams, TypeRef, default_resolve,
};
use crate::value::{Map, Value};
use futures::future::{self, BoxFuture, FutureExt};
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of completing one response position.
pub(crate) struct Completed {
    /// `None` when a non-null position received null; the parent must null
    /// itself in turn.
    value: Option<Value>,
    errors: Vec<LocatedError>,
}

impl Completed {
    fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    /// Null at a nullable position with the error that caused it.
    fn null(error: LocatedError) -> Self {
        Self {
            value: Some(Value::Null),
            errors: vec![error],
        }
    }

    /// A failure at a position of type `ty`.
    fn failed(error: LocatedError, ty: &TypeRef) -> Self {
        Self {
            value: (!ty.is_non_null()).then_some(Value::Null),
            errors: vec![error],
        }
    }
}

/// Runs `items` one after another or all at once, keeping their order.
async fn run_all<F: Future>(items: impl IntoIterator<Item = F>, concurrent: bool) -> Vec<F::Output> {
    if concurrent {
        return future::join_all(items).await;
    }
    let mut outputs = Vec::new();
    for item in items {
        outputs.push(item.await);
    }
    outputs
}

/// Executes collected fields against `source`.
///
/// Collection errors are merged with the field errors at the slot they
/// were found in. Returns `None` for the object when a non-null field
/// failed.
pub(crate) fn execute_fields<'a, 'doc: 'a>(
    ctx: &'a ExecutionContext<'doc>,
    parent_type: &'doc ObjectType,
    source: &'a Value,
    path: &'a [PathSegment],
    collected: CollectedFields<'doc>,
    serial: bool,
) -> BoxFuture<'a, (Option<Map>, Vec<LocatedError>)> {
    async move {
        let concurrent = ctx.config.concurrent_fields && !serial;
        let CollectedFields { fields, errors: found } = collected;
        let pending: Vec<_> = fields
            .into_iter()
            .map(|(key, nodes)| {
                execute_field(ctx, parent_type, source, path, nodes).map(move |done| (key, done))
            })
            .collect();
        let outcomes = run_all(pending, concurrent).await;

        let mut object = Map::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        let mut found = found.into_iter().peekable();
        let mut nulled = false;
        for (slot, (key, completed)) in outcomes.into_iter().enumerate() {
            while let Some((_, error)) = found.next_if(|(before, _)| *before <= slot) {
                errors.push(error);
            }
            errors.extend(completed.errors);
            match completed.value {
                Some(value) => {
                    object.insert(key.to_string(), value);
                }
                None => nulled = true,
            }
        }
        errors.extend(found.map(|(_, error)| error));
        ((!nulled).then_some(object), errors)
    }
    .boxed()
}

fn execute_field<'a, 'doc: 'a>(
    ctx: &'a ExecutionContext<'doc>,
    parent_type: &'doc ObjectType,
    source: &'a Value,
    parent_path: &'a [PathSegment],
    fields: Vec<&'doc Field>,
) -> BoxFuture<'a, Completed> {
    async move {
        let Some(&first) = fields.first() else {
            return Completed::value(Value::Null);
        };
        let key = first.response_key();
        let mut path = parent_path.to_vec();
        path.push(PathSegment::Key(key.to_string()));

        if let Some(message) = merge_conflict(key, &fields) {
            return Completed::null(ctx.error(FieldError::new(message), field_nodes(&fields), path));
        }

        let Some(definition) = parent_type.get_field(&first.name) else {
            let message = format!(
                "Cannot query field \"{}\" on type \"{}\".",
                first.name, parent_type.name
            );
            return Completed::null(ctx.error(FieldError::new(message), field_nodes(&fields), path));
        };
        let return_type = &definition.ty;

        if let Some(limit) = ctx.config.max_depth {
            let depth = path
                .iter()
                .filter(|segment| matches!(segment, PathSegment::Key(_)))
                .count();
            if depth > limit {
                let message = format!(
                    "Field \"{key}\" exceeds the maximum selection depth of {limit}."
                );
                let error = ctx.error(FieldError::new(message), field_nodes(&fields), path);
                return Completed::failed(error, return_type);
            }
        }

        if let Err(error) = check_sub_selection(ctx, definition, &fields, &path) {
            return Completed::failed(error, return_type);
        }

        let args = match coerce_argument_values(
            ctx.schema,
            &parent_type.name,
            definition,
            first,
            ctx.operation,
            &ctx.variables,
        ) {
            Ok(args) => args,
            Err(failure) => {
                let error = ctx.error(FieldError::new(failure.message), failure.nodes, path);
                return Completed::failed(error, return_type);
            }
        };

        let info = ResolveInfo {
            field_name: first.name.clone(),
            parent_type: parent_type.name.clone(),
            return_type: return_type.clone(),
            path: path.clone(),
        };
        match resolve_field(ctx, definition, source, &args, &info).await {
            Ok(value) => {
                tracing::trace!(parent = %parent_type.name, field = %key, "resolved field");
                complete_value(ctx, parent_type, return_type, &fields, value, path).await
            }
            Err(failure) => {
                tracing::trace!(parent = %parent_type.name, field = %key, "resolver failed");
                Completed::failed(ctx.error(failure, field_nodes(&fields), path), return_type)
            }
        }
    }
    .boxed()
}

/// Same-key fields must request the same field with the same arguments.
fn merge_conflict(key: &str, fields: &[&Field]) -> Option<String> {
    let (first, rest) = fields.split_first()?;
    rest.iter().find_map(|other| {
        if other.name != first.name {
            Some(format!(
                "Fields \"{key}\" conflict because \"{}\" and \"{}\" are different fields. \
                 Use different aliases on the fields to fetch both if this was intentional.",
                first.name, other.name
            ))
        } else if !first.same_arguments(other) {
            Some(format!(
                "Fields \"{key}\" conflict because they have differing arguments. \
                 Use different aliases on the fields to fetch both if this was intentional."
            ))
        } else {
            None
        }
    })
}

/// Object fields need a sub-selection; scalar fields must not have one.
fn check_sub_selection(
    ctx: &ExecutionContext<'_>,
    definition: &FieldDefinition,
    fields: &[&Field],
    path: &[PathSegment],
) -> Result<(), LocatedError> {
    let named = definition.ty.named_type();
    match ctx.schema.get_type(named) {
        Some(NamedType::Object(_)) => {
            let bare: Vec<_> = fields
                .iter()
                .filter(|field| field.selection_set.is_none())
                .map(|field| field.node_ref())
                .collect();
            if bare.is_empty() {
                return Ok(());
            }
            let message = format!(
                "Field \"{}\" of type \"{}\" must have a selection of subfields.",
                definition.name, definition.ty
            );
            Err(ctx.error(FieldError::new(message), bare, path.to_vec()))
        }
        Some(NamedType::Scalar(_)) => {
            let selections: Vec<_> = fields
                .iter()
                .filter_map(|field| field.selection_set.as_ref())
                .map(|selection_set| selection_set.node_ref())
                .collect();
            if selections.is_empty() {
                return Ok(());
            }
            let message = format!(
                "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                definition.name, definition.ty
            );
            Err(ctx.error(FieldError::new(message), selections, path.to_vec()))
        }
        None => Ok(()),
    }
}

/// Invokes the field's resolver, converting panics into failures.
async fn resolve_field(
    ctx: &ExecutionContext<'_>,
    definition: &FieldDefinition,
    source: &Value,
    args: &Map,
    info: &ResolveInfo,
) -> FieldResult<Value> {
    let Some(resolver) = &definition.resolver else {
        return Ok(default_resolve(source, &definition.name));
    };
    let params = ResolveParams {
        parent: source,
        args,
        context: ctx.context,
        info,
    };
    let pending = match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(params))) {
        Ok(pending) => pending,
        Err(payload) => return Err(panic_failure(payload, info)),
    };
    match AssertUnwindSafe(pending).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panic_failure(payload, info)),
    }
}

fn panic_failure(payload: Box<dyn Any + Send>, info: &ResolveInfo) -> FieldError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    tracing::warn!(
        parent = %info.parent_type,
        field = %info.field_name,
        panic = message.as_deref().unwrap_or("<non-string payload>"),
        "resolver panicked"
    );
    message.map_or_else(FieldError::unknown, FieldError::new)
}

/// Shapes a resolved value according to `ty`.
fn complete_value<'a, 'doc: 'a>(
    ctx: &'a ExecutionContext<'doc>,
    parent_type: &'doc ObjectType,
    ty: &'doc TypeRef,
    fields: &'a [&'doc Field],
    value: Value,
    path: Vec<PathSegment>,
) -> BoxFuture<'a, Completed> {
    async move {
        match ty {
            TypeRef::NonNull(inner) => {
                let mut completed =
                    complete_value(ctx, parent_type, inner, fields, value, path.clone()).await;
                if completed.value.as_ref().is_some_and(Value::is_null) {
                    if completed.errors.is_empty() {
                        let field_name = fields.first().map(|f| f.name.as_str()).unwrap_or_default();
                        let message = format!(
                            "Cannot return null for non-nullable field {}.{field_name}.",
                            parent_type.name
                        );
                        completed
                            .errors
                            .push(ctx.error(FieldError::new(message), field_nodes(fields), path));
                    }
                    completed.value = None;
                }
                completed
            }
            _ if value.is_null() => Completed::value(Value::Null),
            TypeRef::List(inner) => {
                let items = match value {
                    Value::List(items) => items,
                    other => {
                        let message = format!(
                            "Expected a list for field \"{}.{}\", found {}.",
                            parent_type.name,
                            fields.first().map(|f| f.name.as_str()).unwrap_or_default(),
                            other.kind_name()
                        );
                        let error = ctx.error(FieldError::new(message), field_nodes(fields), path);
                        return Completed::null(error);
                    }
                };
                let pending: Vec<_> = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let mut item_path = path.clone();
                        item_path.push(PathSegment::Index(index));
                        complete_value(ctx, parent_type, inner, fields, item, item_path)
                    })
                    .collect();
                let outcomes = run_all(pending, ctx.config.concurrent_fields).await;

                let mut list = Vec::with_capacity(outcomes.len());
                let mut errors = Vec::new();
                let mut nulled = false;
                for completed in outcomes {
                    errors.extend(completed.errors);
                    match completed.value {
                        Some(value) => list.push(value),
                        None => nulled = true,
                    }
                }
                Completed {
                    value: Some(if nulled { Value::Null } else { Value::List(list) }),
                    errors,
                }
            }
            TypeRef::Named(name) => match ctx.schema.get_type(name) {
                Some(NamedType::Scalar(scalar)) => match scalar.serialize(&value) {
                    Ok(serialized) => Completed::value(serialized),
                    Err(reason) => {
                        Completed::null(ctx.error(FieldError::new(reason), field_nodes(fields), path))
                    }
                },
                Some(NamedType::Object(object)) => {
                    let selection_sets = fields
                        .iter()
                        .copied()
                        .filter_map(|field| field.selection_set.as_ref());
                    let collected = collect_fields(ctx, object, selection_sets, &path);
                    let (map, errors) =
                        execute_fields(ctx, object, &value, &path, collected, false).await;
                    Completed {
                        value: Some(map.map_or(Value::Null, Value::Object)),
                        errors,
                    }
                }
                None => {
                    let message = format!("Unknown type \"{name}\".");
                    Completed::null(ctx.error(FieldError::new(message), field_nodes(fields), path))
                }
            },
        }
    }
    .boxed()
}
