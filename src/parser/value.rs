//! Grammar rules for input values and type references.

use super::base::{ParseResult, TokenStream};
use crate::ast::{Spanned, Type, Value};
use crate::diag::Diag;
use crate::lexer::token::TokenKind;

/// Value[Const] := Variable | Int | Float | String | Boolean | Null | Enum
///               | [ Value* ] | { (Name : Value)* }
///
/// With `constant` set, variables are rejected (default values).
pub(super) fn parse_value(
    stream: &mut TokenStream<'_>,
    constant: bool,
) -> ParseResult<Spanned<Value>> {
    let token = stream.current();
    let start = token.span.clone();
    let pos = token.pos;

    let value = match &token.kind {
        TokenKind::Variable(name) => {
            if constant {
                return Err(Box::new(
                    Diag::error(format!(
                        "unexpected variable '${name}' in constant value"
                    ))
                    .with_primary_label(start, "here")
                    .with_code("syntax::variable_in_constant"),
                ));
            }
            stream.advance();
            Value::Variable(name.clone())
        }
        TokenKind::IntLiteral(text) => {
            let parsed = text.parse::<i64>().map_err(|_| {
                Box::new(
                    Diag::error(format!("integer literal {text} is out of range"))
                        .with_primary_label(start.clone(), "here")
                        .with_code("syntax::invalid_number"),
                )
            })?;
            stream.advance();
            Value::Int(parsed)
        }
        TokenKind::FloatLiteral(text) => {
            let parsed = text.parse::<f64>().map_err(|_| {
                Box::new(
                    Diag::error(format!("invalid float literal {text}"))
                        .with_primary_label(start.clone(), "here")
                        .with_code("syntax::invalid_number"),
                )
            })?;
            stream.advance();
            Value::Float(parsed)
        }
        TokenKind::StringLiteral(text) => {
            stream.advance();
            Value::String(text.clone())
        }
        TokenKind::Name(name) => {
            stream.advance();
            match name.as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                "null" => Value::Null,
                _ => Value::Enum(name.clone()),
            }
        }
        TokenKind::LBracket => {
            stream.advance();
            let items = stream.nested("list value", |stream| {
                let mut items = Vec::new();
                loop {
                    match &stream.current().kind {
                        TokenKind::RBracket => {
                            stream.advance();
                            return Ok(items);
                        }
                        TokenKind::Eof => {
                            return Err(stream.unclosed("list value", TokenKind::RBracket, &start));
                        }
                        _ => items.push(parse_value(stream, constant)?),
                    }
                }
            })?;
            Value::List(items)
        }
        TokenKind::LBrace => {
            stream.advance();
            let fields = stream.nested("object value", |stream| {
                let mut fields = Vec::new();
                loop {
                    match &stream.current().kind {
                        TokenKind::RBrace => {
                            stream.advance();
                            return Ok(fields);
                        }
                        TokenKind::Eof => {
                            return Err(stream.unclosed("object value", TokenKind::RBrace, &start));
                        }
                        _ => {
                            let (name, _, _) = stream.expect_name("object field name")?;
                            stream.expect(TokenKind::Colon)?;
                            fields.push((name, parse_value(stream, constant)?));
                        }
                    }
                }
            })?;
            Value::Object(fields)
        }
        other => {
            return Err(stream.error_here(format!("expected value, found {other}")));
        }
    };

    Ok(Spanned::new(value, stream.span_from(&start), pos))
}

/// Type := Name | [ Type ] followed by an optional `!`.
pub(super) fn parse_type(stream: &mut TokenStream<'_>) -> ParseResult<Type> {
    let base = if stream.check(&TokenKind::LBracket) {
        let open = stream.expect(TokenKind::LBracket)?;
        let inner = stream.nested("list type", parse_type)?;
        if !stream.consume(&TokenKind::RBracket) {
            return Err(stream.unclosed("list type", TokenKind::RBracket, &open));
        }
        Type::List(Box::new(inner))
    } else {
        let (name, _, _) = stream.expect_name("type name")?;
        Type::Named(name)
    };

    if stream.consume(&TokenKind::Bang) {
        Ok(Type::NonNull(Box::new(base)))
    } else {
        Ok(base)
    }
}
