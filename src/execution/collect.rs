//! Field collection: groups the selections that apply to an object type by
//! response key, expanding fragments along the way.

use super::context::ExecutionContext;
use crate::ast::{Field, Node, NodeRef, Selection, SelectionSet};
use crate::error::{FieldError, LocatedError, PathSegment};
use crate::types::ObjectType;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Fields grouped by response key, in first-occurrence order.
pub(crate) type GroupedFields<'doc> = IndexMap<&'doc str, Vec<&'doc Field>>;

/// The outcome of collecting one object's selections.
pub(crate) struct CollectedFields<'doc> {
    pub fields: GroupedFields<'doc>,
    /// Problems met while collecting, each paired with the number of groups
    /// that preceded it in the document. Ascending by that slot.
    pub errors: Vec<(usize, LocatedError)>,
}

/// Collects the fields of `selection_sets` that apply to `object_type`.
///
/// Fragment spreads are expanded at most once per call. Unknown fragments
/// and type conditions naming unknown types are reported and skipped.
pub(crate) fn collect_fields<'doc>(
    ctx: &ExecutionContext<'doc>,
    object_type: &ObjectType,
    selection_sets: impl IntoIterator<Item = &'doc SelectionSet>,
    path: &[PathSegment],
) -> CollectedFields<'doc> {
    let mut collector = Collector {
        ctx,
        object_type,
        path,
        fields: GroupedFields::new(),
        visited: HashSet::new(),
        errors: Vec::new(),
    };
    for selection_set in selection_sets {
        collector.collect(selection_set);
    }
    CollectedFields {
        fields: collector.fields,
        errors: collector.errors,
    }
}

struct Collector<'c, 'doc> {
    ctx: &'c ExecutionContext<'doc>,
    object_type: &'c ObjectType,
    path: &'c [PathSegment],
    fields: GroupedFields<'doc>,
    visited: HashSet<&'doc str>,
    errors: Vec<(usize, LocatedError)>,
}

impl<'doc> Collector<'_, 'doc> {
    fn collect(&mut self, selection_set: &'doc SelectionSet) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    self.fields
                        .entry(field.response_key())
                        .or_default()
                        .push(field);
                }
                Selection::InlineFragment(fragment) => {
                    let applies = match &fragment.type_condition {
                        None => true,
                        Some(condition) => self.applies(condition, fragment.node_ref()),
                    };
                    if applies {
                        self.collect(&fragment.selection_set);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !self.visited.insert(spread.name.as_str()) {
                        continue;
                    }
                    let Some(fragment) = self.ctx.document.fragment(&spread.name) else {
                        self.report(
                            format!("Unknown fragment \"{}\".", spread.name),
                            spread.node_ref(),
                        );
                        continue;
                    };
                    if self.applies(&fragment.type_condition, spread.node_ref()) {
                        self.collect(&fragment.selection_set);
                    }
                }
            }
        }
    }

    /// Only the object type itself satisfies a type condition.
    fn applies(&mut self, condition: &str, node: NodeRef) -> bool {
        if self.ctx.schema.get_type(condition).is_none() {
            self.report(format!("Unknown type \"{condition}\"."), node);
            return false;
        }
        condition == self.object_type.name
    }

    fn report(&mut self, message: String, node: NodeRef) {
        let error = self
            .ctx
            .error(FieldError::new(message), vec![node], self.path.to_vec());
        self.errors.push((self.fields.len(), error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Document, OperationDefinition};
    use crate::execution::ExecutorConfig;
    use crate::schema::Schema;
    use crate::types::{Context, FieldDefinition, TypeRef};
    use crate::value::Map;

    fn schema() -> Schema {
        let user = ObjectType::new("User")
            .field(FieldDefinition::new("id", TypeRef::named("ID")))
            .field(FieldDefinition::new("name", TypeRef::named("String")));
        let query =
            ObjectType::new("Query").field(FieldDefinition::new("user", TypeRef::named("User")));
        Schema::build(query, None, [user.into()]).unwrap()
    }

    fn collect_root(source: &str) -> (Vec<(String, usize)>, Vec<(usize, String)>) {
        let schema = schema();
        let document: Document = crate::parse(source).unwrap();
        let operation: &OperationDefinition = document.operations().next().unwrap();
        let context = Context::default();
        let config = ExecutorConfig::default();
        let ctx = ExecutionContext {
            schema: &schema,
            document: &document,
            operation,
            variables: Map::new(),
            context: &context,
            config: &config,
        };
        let user = schema.object("User").unwrap();
        let selection = match &operation.selection_set.items[0] {
            Selection::Field(field) => field.selection_set.as_ref().unwrap(),
            _ => unreachable!(),
        };
        let collected = collect_fields(&ctx, user, [selection], &[]);
        (
            collected
                .fields
                .iter()
                .map(|(key, nodes)| (key.to_string(), nodes.len()))
                .collect(),
            collected
                .errors
                .into_iter()
                .map(|(slot, error)| (slot, error.message))
                .collect(),
        )
    }

    #[test]
    fn groups_by_response_key_in_order() {
        let (fields, errors) = collect_root("{ user { name id name handle: name } }");
        assert!(errors.is_empty());
        assert_eq!(
            fields,
            vec![("name".into(), 2), ("id".into(), 1), ("handle".into(), 1)]
        );
    }

    #[test]
    fn expands_matching_fragments_once() {
        let (fields, _) = collect_root(
            "{ user { ...A ...A ... on User { id } ... { name } } } fragment A on User { name }",
        );
        assert_eq!(fields, vec![("name".into(), 2), ("id".into(), 1)]);
    }

    #[test]
    fn skips_fragments_for_other_types() {
        let (fields, errors) = collect_root("{ user { id ... on Query { user { id } } } }");
        assert!(errors.is_empty());
        assert_eq!(fields, vec![("id".into(), 1)]);
    }

    #[test]
    fn reports_unknown_fragment_and_type() {
        let (fields, errors) = collect_root("{ user { id ...Missing ... on Ghost { name } } }");
        assert_eq!(fields, vec![("id".into(), 1)]);
        assert_eq!(
            errors,
            vec![
                (1, "Unknown fragment \"Missing\".".to_string()),
                (1, "Unknown type \"Ghost\".".to_string())
            ]
        );
    }

    #[test]
    fn errors_remember_their_slot_among_groups() {
        let (fields, errors) = collect_root("{ user { ...Missing id ...Gone name id } }");
        assert_eq!(fields, vec![("id".into(), 2), ("name".into(), 1)]);
        assert_eq!(
            errors,
            vec![
                (0, "Unknown fragment \"Missing\".".to_string()),
                (1, "Unknown fragment \"Gone\".".to_string())
            ]
        );
    }

    #[test]
    fn recursive_fragments_terminate() {
        let (fields, _) = collect_root("{ user { ...A } } fragment A on User { id ...A }");
        assert_eq!(fields, vec![("id".into(), 1)]);
    }
}
