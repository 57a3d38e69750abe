//! Scalar types and the built-in `String`, `Int`, `Float`, `Boolean` and `ID`.
//!
//! A scalar owns three coercions:
//!
//! - `serialize`: resolver output to response value;
//! - `parse_value`: variable value to argument value;
//! - `parse_literal`: query literal to argument value. Scalars without a
//!   literal parser accept any non-enum literal by converting it to a
//!   runtime value and running `parse_value`.

use crate::ast::{self, Name};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Coerces a runtime value; the error string explains the rejection.
pub type CoerceFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Coerces a query literal; the error string explains the rejection.
pub type LiteralFn = Arc<dyn Fn(&ast::Value) -> Result<Value, String> + Send + Sync>;

/// Names of the built-in scalars, always present in every schema.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// A leaf type.
#[derive(Clone)]
pub struct ScalarType {
    pub name: Name,
    serialize: CoerceFn,
    parse_value: CoerceFn,
    parse_literal: Option<LiteralFn>,
}

impl ScalarType {
    /// Defines a scalar from its output and input coercions.
    pub fn new<S, P>(name: impl Into<Name>, serialize: S, parse_value: P) -> Self
    where
        S: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
        P: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            serialize: Arc::new(serialize),
            parse_value: Arc::new(parse_value),
            parse_literal: None,
        }
    }

    /// Sets a dedicated literal parser.
    pub fn with_parse_literal<L>(mut self, parse_literal: L) -> Self
    where
        L: Fn(&ast::Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parse_literal = Some(Arc::new(parse_literal));
        self
    }

    /// Coerces a resolved value for the response.
    pub fn serialize(&self, value: &Value) -> Result<Value, String> {
        (self.serialize)(value)
    }

    /// Coerces a variable or untyped literal value.
    pub fn parse_value(&self, value: &Value) -> Result<Value, String> {
        (self.parse_value)(value)
    }

    /// The dedicated literal parser, if this scalar has one.
    pub fn literal_parser(&self) -> Option<&LiteralFn> {
        self.parse_literal.as_ref()
    }

    /// Returns true if this is one of the built-in scalars.
    pub fn is_builtin(&self) -> bool {
        BUILTIN_SCALARS.contains(&self.name.as_str())
    }

    /// The built-in `String` scalar.
    pub fn string() -> Self {
        Self::new("String", serialize_string, |value| match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            other => Err(format!(
                "String cannot represent a non string value: {other}"
            )),
        })
    }

    /// The built-in `Int` scalar: a signed 32-bit integer.
    pub fn int() -> Self {
        Self::new("Int", serialize_int, |value| match value {
            Value::Int(i) if i32::try_from(*i).is_ok() => Ok(Value::Int(*i)),
            Value::Int(i) => Err(format!(
                "Int cannot represent non 32-bit signed integer value: {i}"
            )),
            other => Err(format!("Int cannot represent non-integer value: {other}")),
        })
    }

    /// The built-in `Float` scalar.
    pub fn float() -> Self {
        Self::new("Float", serialize_float, |value| match value {
            Value::Float(f) if f.is_finite() => Ok(Value::Float(*f)),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            other => Err(format!("Float cannot represent non numeric value: {other}")),
        })
    }

    /// The built-in `Boolean` scalar.
    pub fn boolean() -> Self {
        Self::new("Boolean", serialize_boolean, |value| match value {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            other => Err(format!(
                "Boolean cannot represent a non boolean value: {other}"
            )),
        })
    }

    /// The built-in `ID` scalar, serialized as a string.
    pub fn id() -> Self {
        Self::new("ID", serialize_id, |value| match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Int(i) => Ok(Value::String(i.to_string())),
            other => Err(format!("ID cannot represent value: {other}")),
        })
    }

    /// All built-in scalars.
    pub fn builtins() -> Vec<ScalarType> {
        vec![
            Self::string(),
            Self::int(),
            Self::float(),
            Self::boolean(),
            Self::id(),
        ]
    }
}

impl fmt::Debug for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarType")
            .field("name", &self.name)
            .field("parse_literal", &self.parse_literal.is_some())
            .finish()
    }
}

fn serialize_string(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Boolean(b) => Ok(Value::String(b.to_string())),
        Value::Int(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) if f.is_finite() => Ok(Value::String(f.to_string())),
        other => Err(format!("String cannot represent value: {other}")),
    }
}

fn serialize_int(value: &Value) -> Result<Value, String> {
    let number = match value {
        Value::Int(i) => *i,
        Value::Boolean(b) => i64::from(*b),
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("Int cannot represent non-integer value: {value}"))?,
        other => return Err(format!("Int cannot represent non-integer value: {other}")),
    };
    if i32::try_from(number).is_err() {
        return Err(format!(
            "Int cannot represent non 32-bit signed integer value: {value}"
        ));
    }
    Ok(Value::Int(number))
}

fn serialize_float(value: &Value) -> Result<Value, String> {
    let number = match value {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Float cannot represent non numeric value: {value}"))?,
        other => return Err(format!("Float cannot represent non numeric value: {other}")),
    };
    if !number.is_finite() {
        return Err(format!("Float cannot represent non numeric value: {value}"));
    }
    Ok(Value::Float(number))
}

fn serialize_boolean(value: &Value) -> Result<Value, String> {
    match value {
        Value::Boolean(b) => Ok(Value::Boolean(*b)),
        Value::Int(i) => Ok(Value::Boolean(*i != 0)),
        Value::Float(f) if f.is_finite() => Ok(Value::Boolean(*f != 0.0)),
        other => Err(format!(
            "Boolean cannot represent a non boolean value: {other}"
        )),
    }
}

fn serialize_id(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Int(i) => Ok(Value::String(i.to_string())),
        other => Err(format!("ID cannot represent value: {other}")),
    }
}
