//! Input coercion: variable values, argument literals and defaults.

use crate::ast::{self, Field, Node, NodeRef, OperationDefinition};
use crate::error::LocatedError;
use crate::schema::{Schema, input_type_error};
use crate::types::{FieldDefinition, NamedType, TypeRef};
use crate::value::{Map, Value};

/// Why a field's arguments could not be coerced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArgumentError {
    pub message: String,
    pub nodes: Vec<NodeRef>,
}

impl ArgumentError {
    fn new(message: String, node: NodeRef) -> Self {
        Self {
            message,
            nodes: vec![node],
        }
    }
}

/// Coerces a runtime value, e.g. a variable binding, against `ty`.
pub(crate) fn coerce_input_value(schema: &Schema, value: &Value, ty: &TypeRef) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{ty}\" not to be null."));
            }
            coerce_input_value(schema, value, inner)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(inner) => match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    coerce_input_value(schema, item, inner)
                        .map_err(|reason| format!("{reason} (at index {index})"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            single => Ok(Value::List(vec![coerce_input_value(schema, single, inner)?])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(NamedType::Scalar(scalar)) => scalar.parse_value(value),
            _ => Err(format!("Type \"{name}\" is not an input type.")),
        },
    }
}

/// Coerces a query literal against `ty`, substituting variables.
pub(crate) fn value_from_ast(
    schema: &Schema,
    literal: &ast::Value,
    ty: &TypeRef,
    variables: &Map,
) -> Result<Value, String> {
    match (ty, literal) {
        (TypeRef::NonNull(inner), _) => {
            let value = value_from_ast(schema, literal, inner, variables)?;
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{ty}\" not to be null."));
            }
            Ok(value)
        }
        (_, ast::Value::Variable(name)) => match variables.get(name.as_str()) {
            Some(value) => fit_variable_value(value, ty),
            None => Ok(Value::Null),
        },
        (_, ast::Value::Null) => Ok(Value::Null),
        (TypeRef::List(inner), ast::Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                value_from_ast(schema, &item.node, inner, variables)
                    .map_err(|reason| format!("{reason} (at index {index})"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (TypeRef::List(inner), single) => Ok(Value::List(vec![value_from_ast(
            schema, single, inner, variables,
        )?])),
        (TypeRef::Named(name), _) => {
            let Some(scalar) = schema.scalar(name) else {
                return Err(format!("Type \"{name}\" is not an input type."));
            };
            match (scalar.literal_parser(), literal) {
                (Some(parse), _) => parse(literal),
                (None, ast::Value::Enum(value)) => {
                    Err(format!("{name} cannot represent enum value: {value}"))
                }
                (None, _) => scalar.parse_value(&untyped(literal, variables)),
            }
        }
    }
}

/// Fits an already coerced variable value to the type of the position it
/// is used in. Scalars are not parsed again; only nullability and list
/// wrapping are checked.
fn fit_variable_value(value: &Value, ty: &TypeRef) -> Result<Value, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(format!("Expected non-nullable type \"{ty}\" not to be null."));
            }
            fit_variable_value(value, inner)
        }
        _ if value.is_null() => Ok(Value::Null),
        TypeRef::List(inner) => match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    fit_variable_value(item, inner)
                        .map_err(|reason| format!("{reason} (at index {index})"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            single => Ok(Value::List(vec![fit_variable_value(single, inner)?])),
        },
        TypeRef::Named(_) => Ok(value.clone()),
    }
}

/// First variable used in `literal` that `operation` does not declare.
fn undeclared_variable<'v>(literal: &'v ast::Value, operation: &OperationDefinition) -> Option<&'v str> {
    match literal {
        ast::Value::Variable(name) => {
            let declared = operation
                .variable_definitions
                .iter()
                .any(|definition| definition.name == *name);
            (!declared).then_some(name.as_str())
        }
        ast::Value::List(items) => items
            .iter()
            .find_map(|item| undeclared_variable(&item.node, operation)),
        ast::Value::Object(entries) => entries
            .iter()
            .find_map(|(_, value)| undeclared_variable(&value.node, operation)),
        _ => None,
    }
}

/// Converts a literal to a runtime value without a type, substituting
/// variables; absent variables become null.
fn untyped(literal: &ast::Value, variables: &Map) -> Value {
    match literal {
        ast::Value::Variable(name) => variables.get(name.as_str()).cloned().unwrap_or_default(),
        ast::Value::Int(i) => Value::Int(*i),
        ast::Value::Float(f) => Value::Float(*f),
        ast::Value::String(s) => Value::String(s.clone()),
        ast::Value::Boolean(b) => Value::Boolean(*b),
        ast::Value::Null => Value::Null,
        ast::Value::Enum(name) => Value::String(name.to_string()),
        ast::Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| untyped(&item.node, variables))
                .collect(),
        ),
        ast::Value::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.to_string(), untyped(&value.node, variables)))
                .collect(),
        ),
    }
}

/// Coerces the operation's declared variables from the supplied bindings.
///
/// Every invalid variable is reported; the error list is in declaration
/// order.
pub(crate) fn coerce_variable_values(
    schema: &Schema,
    operation: &OperationDefinition,
    inputs: &Map,
) -> Result<Map, Vec<LocatedError>> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();

    for definition in &operation.variable_definitions {
        let name = definition.name.as_str();
        let ty = TypeRef::from(&definition.var_type);
        let fail = |message: String| LocatedError::request(message).with_nodes(vec![definition.node_ref()]);

        if input_type_error(schema, &ty).is_some() {
            errors.push(fail(format!(
                "Variable \"${name}\" expected value of type \"{ty}\" which cannot be used as an input type."
            )));
            continue;
        }

        match inputs.get(name) {
            Some(value) => match coerce_input_value(schema, value, &ty) {
                Ok(value) => {
                    coerced.insert(name.to_string(), value);
                }
                Err(reason) => errors.push(fail(format!(
                    "Variable \"${name}\" got invalid value {value}; {reason}"
                ))),
            },
            None => match &definition.default_value {
                Some(default) => match value_from_ast(schema, &default.node, &ty, &Map::new()) {
                    Ok(value) => {
                        coerced.insert(name.to_string(), value);
                    }
                    Err(reason) => errors.push(
                        LocatedError::request(format!(
                            "Variable \"${name}\" has invalid default value {}; {reason}",
                            default.node
                        ))
                        .with_nodes(vec![default.node_ref()]),
                    ),
                },
                None if ty.is_non_null() => errors.push(fail(format!(
                    "Variable \"${name}\" of required type \"{ty}\" was not provided."
                ))),
                None => {}
            },
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Coerces the arguments `field` passes against `definition`, applying
/// declared defaults. Absent nullable arguments without a default are
/// left out of the map.
///
/// Variables must be declared by `operation`; their values come from
/// `variables`, which holds the coerced bindings.
pub(crate) fn coerce_argument_values(
    schema: &Schema,
    parent_type: &str,
    definition: &FieldDefinition,
    field: &Field,
    operation: &OperationDefinition,
    variables: &Map,
) -> Result<Map, ArgumentError> {
    if let Some((argument, variable)) = field.arguments.iter().find_map(|argument| {
        undeclared_variable(&argument.value.node, operation).map(|variable| (argument, variable))
    }) {
        return Err(ArgumentError::new(
            format!("Variable \"${variable}\" is not defined."),
            argument.node_ref(),
        ));
    }

    if let Some(unknown) = field
        .arguments
        .iter()
        .find(|argument| !definition.arguments.contains_key(&argument.name))
    {
        return Err(ArgumentError::new(
            format!(
                "Unknown argument \"{}\" on field \"{parent_type}.{}\".",
                unknown.name, definition.name
            ),
            unknown.node_ref(),
        ));
    }

    let mut coerced = Map::new();
    for (name, argument_def) in &definition.arguments {
        let ty = &argument_def.ty;
        let Some(argument) = field.argument(name) else {
            if let Some(default) = &argument_def.default_value {
                coerced.insert(name.to_string(), default.clone());
            } else if ty.is_non_null() {
                return Err(ArgumentError::new(
                    format!("Argument \"{name}\" of required type \"{ty}\" was not provided."),
                    field.node_ref(),
                ));
            }
            continue;
        };

        if let ast::Value::Variable(variable) = &argument.value.node {
            if !variables.contains_key(variable.as_str()) {
                if let Some(default) = &argument_def.default_value {
                    coerced.insert(name.to_string(), default.clone());
                } else if ty.is_non_null() {
                    return Err(ArgumentError::new(
                        format!(
                            "Argument \"{name}\" of required type \"{ty}\" was provided the variable \"${variable}\" which was not provided a runtime value."
                        ),
                        argument.node_ref(),
                    ));
                }
                continue;
            }
        }

        if matches!(argument.value.node, ast::Value::Null) && ty.is_non_null() {
            return Err(ArgumentError::new(
                format!("Argument \"{name}\" of non-null type \"{ty}\" must not be null."),
                argument.node_ref(),
            ));
        }

        match value_from_ast(schema, &argument.value.node, ty, variables) {
            Ok(value) => {
                coerced.insert(name.to_string(), value);
            }
            Err(reason) => {
                return Err(ArgumentError::new(
                    format!(
                        "Argument \"{name}\" has invalid value {}. {reason}",
                        argument.value.node
                    ),
                    argument.node_ref(),
                ));
            }
        }
    }
    Ok(coerced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Definition, Selection};
    use crate::types::{ArgumentDefinition, ObjectType, ScalarType};

    fn schema() -> Schema {
        let query = ObjectType::new("Query").field(FieldDefinition::new("n", TypeRef::named("Int")));
        Schema::build(query, None, []).unwrap()
    }

    fn ids() -> TypeRef {
        TypeRef::list(TypeRef::named("ID").non_null())
    }

    fn first_field(document: &ast::Document) -> &Field {
        match &document.definitions[0] {
            Definition::Operation(op) => match &op.selection_set.items[0] {
                Selection::Field(field) => field,
                _ => unreachable!(),
            },
            Definition::Fragment(_) => unreachable!(),
        }
    }

    fn operation(document: &ast::Document) -> &OperationDefinition {
        document.operations().next().unwrap()
    }

    fn vars(pairs: &[(&str, Value)]) -> Map {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn input_value_wraps_single_item_in_list() {
        let schema = schema();
        assert_eq!(
            coerce_input_value(&schema, &Value::Int(1), &ids()),
            Ok(Value::List(vec![Value::String("1".into())]))
        );
    }

    #[test]
    fn input_value_rejects_null_item_of_non_null_list() {
        let schema = schema();
        let err = coerce_input_value(&schema, &Value::List(vec![Value::Null]), &ids()).unwrap_err();
        assert_eq!(err, "Expected non-nullable type \"ID!\" not to be null. (at index 0)");
    }

    #[test]
    fn literal_substitutes_variables() {
        let schema = schema();
        let literal = ast::Value::List(vec![
            ast::Spanned::new(ast::Value::Variable("a".into()), 0..2, ast::Pos::new(1, 1, 0)),
            ast::Spanned::new(ast::Value::Int(2), 4..5, ast::Pos::new(1, 5, 4)),
        ]);
        let value = value_from_ast(
            &schema,
            &literal,
            &TypeRef::list(TypeRef::named("Int")),
            &vars(&[("a", Value::Int(1))]),
        );
        assert_eq!(value, Ok(Value::from(vec![1, 2])));
    }

    #[test]
    fn literal_rejects_enum_for_builtin_scalar() {
        let schema = schema();
        let err = value_from_ast(
            &schema,
            &ast::Value::Enum("RED".into()),
            &TypeRef::named("String"),
            &Map::new(),
        )
        .unwrap_err();
        assert_eq!(err, "String cannot represent enum value: RED");
    }

    #[test]
    fn custom_literal_parser_sees_raw_literal() {
        let color = ScalarType::new("Color", |v| Ok(v.clone()), |v| Ok(v.clone()))
            .with_parse_literal(|literal| match literal {
                ast::Value::Enum(name) => Ok(Value::String(name.to_lowercase())),
                _ => Err("expected a color".into()),
            });
        let query = ObjectType::new("Query").field(FieldDefinition::new("n", TypeRef::named("Int")));
        let schema = Schema::build(query, None, [color.into()]).unwrap();
        let value = value_from_ast(
            &schema,
            &ast::Value::Enum("RED".into()),
            &TypeRef::named("Color"),
            &Map::new(),
        );
        assert_eq!(value, Ok(Value::from("red")));
    }

    #[test]
    fn variables_use_defaults_and_require_non_null() {
        let schema = schema();
        let document = crate::parse("query Q($a: Int = 3, $b: ID!, $c: String) { n }").unwrap();
        let errors = coerce_variable_values(&schema, operation(&document), &Map::new()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Variable \"$b\" of required type \"ID!\" was not provided."
        );
        assert_eq!(errors[0].locations()[0].column, 22);

        let coerced =
            coerce_variable_values(&schema, operation(&document), &vars(&[("b", Value::Int(7))]))
                .unwrap();
        assert_eq!(coerced, vars(&[("a", Value::Int(3)), ("b", Value::from("7"))]));
    }

    #[test]
    fn variables_report_invalid_values_and_types() {
        let schema = schema();
        let document = crate::parse("query Q($a: Int, $q: Query) { n }").unwrap();
        let errors = coerce_variable_values(
            &schema,
            operation(&document),
            &vars(&[("a", Value::from("x"))]),
        )
        .unwrap_err();
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Variable \"$a\" got invalid value \"x\"; Int cannot represent non-integer value: \"x\"",
                "Variable \"$q\" expected value of type \"Query\" which cannot be used as an input type.",
            ]
        );
    }

    fn user_field() -> FieldDefinition {
        FieldDefinition::new("user", TypeRef::named("String"))
            .argument(ArgumentDefinition::new("id", TypeRef::named("ID").non_null()))
            .argument(ArgumentDefinition::new("limit", TypeRef::named("Int")).with_default(10))
            .argument(ArgumentDefinition::new("tag", TypeRef::named("String")))
    }

    fn coerce(source: &str, variables: &Map) -> Result<Map, ArgumentError> {
        let schema = schema();
        let document = crate::parse(source).unwrap();
        coerce_argument_values(
            &schema,
            "Query",
            &user_field(),
            first_field(&document),
            operation(&document),
            variables,
        )
    }

    #[test]
    fn arguments_apply_defaults_and_omit_absent() {
        let args = coerce("{ user(id: 4) }", &Map::new()).unwrap();
        assert_eq!(args, vars(&[("id", Value::from("4")), ("limit", Value::Int(10))]));
    }

    #[test]
    fn arguments_read_variables() {
        let args = coerce(
            "query($id: ID!, $limit: Int) { user(id: $id, limit: $limit) }",
            &vars(&[("id", Value::from("u1"))]),
        )
        .unwrap();
        assert_eq!(args, vars(&[("id", Value::from("u1")), ("limit", Value::Int(10))]));
    }

    #[test]
    fn missing_required_argument_points_at_field() {
        let err = coerce("{ user(limit: 1) }", &Map::new()).unwrap_err();
        assert_eq!(err.message, "Argument \"id\" of required type \"ID!\" was not provided.");
        assert_eq!(err.nodes[0].kind, ast::NodeKind::Field);
    }

    #[test]
    fn unknown_argument_points_at_argument() {
        let err = coerce("{ user(id: 1, age: 3) }", &Map::new()).unwrap_err();
        assert_eq!(err.message, "Unknown argument \"age\" on field \"Query.user\".");
        assert_eq!(err.nodes[0].kind, ast::NodeKind::Argument);
        assert_eq!(err.nodes[0].pos.column, 15);
    }

    #[test]
    fn invalid_literal_reports_reason() {
        let err = coerce("{ user(id: 1, limit: \"ten\") }", &Map::new()).unwrap_err();
        assert_eq!(
            err.message,
            "Argument \"limit\" has invalid value \"ten\". Int cannot represent non-integer value: \"ten\""
        );
    }

    #[test]
    fn explicit_null_for_non_null_argument() {
        let err = coerce("{ user(id: null) }", &Map::new()).unwrap_err();
        assert_eq!(err.message, "Argument \"id\" of non-null type \"ID!\" must not be null.");
    }

    #[test]
    fn missing_variable_for_required_argument() {
        let err = coerce("query($v: ID) { user(id: $v) }", &Map::new()).unwrap_err();
        assert!(err.message.contains("was provided the variable \"$v\""), "{}", err.message);
    }

    #[test]
    fn undeclared_variable_points_at_argument() {
        let err = coerce("{ user(id: 1, tag: $missing) }", &Map::new()).unwrap_err();
        assert_eq!(err.message, "Variable \"$missing\" is not defined.");
        assert_eq!(err.nodes[0].kind, ast::NodeKind::Argument);
        assert_eq!(err.nodes[0].pos.column, 15);
    }

    #[test]
    fn undeclared_variable_inside_list_literal() {
        let err = coerce("query($a: ID) { user(id: [$a, $b]) }", &Map::new()).unwrap_err();
        assert_eq!(err.message, "Variable \"$b\" is not defined.");
    }

    #[test]
    fn variable_values_are_not_parsed_twice() {
        let year = ScalarType::new(
            "Year",
            |v| Ok(v.clone()),
            |v| match v {
                Value::String(s) => s
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| format!("Year cannot represent {v}")),
                other => Err(format!("Year cannot represent {other}")),
            },
        );
        let query = ObjectType::new("Query").field(
            FieldDefinition::new("echo", TypeRef::named("Year"))
                .argument(ArgumentDefinition::new("y", TypeRef::named("Year"))),
        );
        let schema = Schema::build(query, None, [year.into()]).unwrap();
        let echo = schema.object("Query").unwrap().get_field("echo").unwrap();

        let literal = crate::parse(r#"{ echo(y: "2020") }"#).unwrap();
        let from_literal = coerce_argument_values(
            &schema,
            "Query",
            echo,
            first_field(&literal),
            operation(&literal),
            &Map::new(),
        )
        .unwrap();

        let document = crate::parse("query($y: Year) { echo(y: $y) }").unwrap();
        let variables =
            coerce_variable_values(&schema, operation(&document), &vars(&[("y", Value::from("2020"))]))
                .unwrap();
        let from_variable = coerce_argument_values(
            &schema,
            "Query",
            echo,
            first_field(&document),
            operation(&document),
            &variables,
        )
        .unwrap();

        assert_eq!(from_literal, vars(&[("y", Value::Int(2020))]));
        assert_eq!(from_variable, from_literal);
    }

    #[test]
    fn variable_value_is_wrapped_for_list_position() {
        let value = fit_variable_value(&Value::Int(3), &TypeRef::list(TypeRef::named("Int").non_null()));
        assert_eq!(value, Ok(Value::from(vec![3])));
        let err = fit_variable_value(&Value::Null, &TypeRef::named("Int").non_null()).unwrap_err();
        assert_eq!(err, "Expected non-nullable type \"Int!\" not to be null.");
    }
}
