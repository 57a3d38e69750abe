//! Grammar rules for definitions, operations and selections.

use super::base::{ParseResult, TokenStream};
use super::value::{parse_type, parse_value};
use crate::ast::{
    Argument, Definition, Document, Field, FragmentDefinition, FragmentSpread, InlineFragment,
    OperationDefinition, OperationKind, Selection, SelectionSet, VariableDefinition,
};
use crate::diag::Diag;
use crate::lexer::token::TokenKind;

/// Document := Definition+ EOF
pub(super) fn parse_document(stream: &mut TokenStream<'_>) -> ParseResult<Document> {
    let start = stream.current().span.clone();
    let mut definitions = Vec::new();

    if stream.at_eof() {
        return Err(stream.error_here(
            "expected a query, mutation or fragment definition, found end of input",
        ));
    }

    while !stream.at_eof() {
        definitions.push(parse_definition(stream)?);
    }

    Ok(Document {
        definitions,
        span: stream.span_from(&start),
    })
}

fn parse_definition(stream: &mut TokenStream<'_>) -> ParseResult<Definition> {
    let token = stream.current();
    match &token.kind {
        TokenKind::LBrace => {
            let selection_set = parse_selection_set(stream)?;
            Ok(Definition::Operation(OperationDefinition {
                kind: OperationKind::Query,
                name: None,
                variable_definitions: Vec::new(),
                span: selection_set.span.clone(),
                pos: selection_set.pos,
                selection_set,
            }))
        }
        TokenKind::Name(name) if name == "query" => {
            parse_operation(stream, OperationKind::Query).map(Definition::Operation)
        }
        TokenKind::Name(name) if name == "mutation" => {
            parse_operation(stream, OperationKind::Mutation).map(Definition::Operation)
        }
        TokenKind::Name(name) if name == "fragment" => {
            parse_fragment_definition(stream).map(Definition::Fragment)
        }
        TokenKind::Name(name) if name == "subscription" => Err(Box::new(
            Diag::error("subscription operations are not supported")
                .with_primary_label(token.span.clone(), "here")
                .with_code("syntax::unsupported_operation"),
        )),
        other => {
            let message = if other.is_closing() {
                format!("unexpected {other} with no matching opening delimiter")
            } else {
                format!("expected a query, mutation or fragment definition, found {other}")
            };
            Err(stream.error_here(message))
        }
    }
}

/// OperationDefinition := OperationType Name? VariableDefinitions? SelectionSet
fn parse_operation(
    stream: &mut TokenStream<'_>,
    kind: OperationKind,
) -> ParseResult<OperationDefinition> {
    let start = stream.current().span.clone();
    let pos = stream.current().pos;
    stream.advance();

    let name = match &stream.current().kind {
        TokenKind::Name(_) => Some(stream.expect_name("operation name")?.0),
        _ => None,
    };

    let variable_definitions = if stream.check(&TokenKind::LParen) {
        parse_variable_definitions(stream)?
    } else {
        Vec::new()
    };

    reject_directives(stream)?;
    let selection_set = parse_selection_set(stream)?;

    Ok(OperationDefinition {
        kind,
        name,
        variable_definitions,
        selection_set,
        span: stream.span_from(&start),
        pos,
    })
}

/// VariableDefinitions := ( VariableDefinition+ )
fn parse_variable_definitions(
    stream: &mut TokenStream<'_>,
) -> ParseResult<Vec<VariableDefinition>> {
    let open = stream.expect(TokenKind::LParen)?;
    let mut definitions = Vec::new();

    loop {
        let token = stream.current();
        match &token.kind {
            TokenKind::RParen if !definitions.is_empty() => {
                stream.advance();
                return Ok(definitions);
            }
            TokenKind::Variable(name) => {
                stream.advance();
                stream.expect(TokenKind::Colon)?;
                let var_type = parse_type(stream)?;
                let default_value = if stream.consume(&TokenKind::Equals) {
                    Some(parse_value(stream, true)?)
                } else {
                    None
                };
                reject_directives(stream)?;
                definitions.push(VariableDefinition {
                    name: name.clone(),
                    var_type,
                    default_value,
                    span: stream.span_from(&token.span),
                    pos: token.pos,
                });
            }
            TokenKind::Eof => {
                return Err(stream.unclosed("variable definitions", TokenKind::RParen, &open));
            }
            other => {
                return Err(stream.error_here(format!("expected variable definition, found {other}")));
            }
        }
    }
}

/// FragmentDefinition := fragment Name on Name SelectionSet
fn parse_fragment_definition(stream: &mut TokenStream<'_>) -> ParseResult<FragmentDefinition> {
    let start = stream.current().span.clone();
    let pos = stream.current().pos;
    stream.expect_keyword("fragment")?;

    if stream.check_name("on") {
        return Err(stream.error_here("expected fragment name, found 'on'"));
    }
    let (name, _, _) = stream.expect_name("fragment name")?;
    stream.expect_keyword("on")?;
    let (type_condition, _, _) = stream.expect_name("type condition")?;
    reject_directives(stream)?;
    let selection_set = parse_selection_set(stream)?;

    Ok(FragmentDefinition {
        name,
        type_condition,
        selection_set,
        span: stream.span_from(&start),
        pos,
    })
}

/// SelectionSet := { Selection+ }
pub(super) fn parse_selection_set(stream: &mut TokenStream<'_>) -> ParseResult<SelectionSet> {
    let open_token = stream.current();
    let open = stream.expect(TokenKind::LBrace)?;
    let items = stream.nested("selection set", |stream| {
        let mut items = Vec::new();
        loop {
            match &stream.current().kind {
                TokenKind::RBrace => {
                    if items.is_empty() {
                        return Err(stream.error_here("selection set must contain at least one field"));
                    }
                    stream.advance();
                    return Ok(items);
                }
                TokenKind::Eof => {
                    return Err(stream.unclosed("selection set", TokenKind::RBrace, &open));
                }
                _ => items.push(parse_selection(stream)?),
            }
        }
    })?;

    Ok(SelectionSet {
        items,
        span: stream.span_from(&open),
        pos: open_token.pos,
    })
}

fn parse_selection(stream: &mut TokenStream<'_>) -> ParseResult<Selection> {
    if stream.check(&TokenKind::Spread) {
        return parse_fragment(stream);
    }
    parse_field(stream).map(Selection::Field)
}

/// Field := Alias? Name Arguments? SelectionSet?
fn parse_field(stream: &mut TokenStream<'_>) -> ParseResult<Field> {
    let (first, start, pos) = stream.expect_name("field name")?;

    let (alias, name) = if stream.consume(&TokenKind::Colon) {
        let (name, _, _) = stream.expect_name("field name after alias")?;
        (Some(first), name)
    } else {
        (None, first)
    };

    let arguments = if stream.check(&TokenKind::LParen) {
        parse_arguments(stream)?
    } else {
        Vec::new()
    };

    reject_directives(stream)?;

    let selection_set = if stream.check(&TokenKind::LBrace) {
        Some(parse_selection_set(stream)?)
    } else {
        None
    };

    Ok(Field {
        alias,
        name,
        arguments,
        selection_set,
        span: stream.span_from(&start),
        pos,
    })
}

/// Arguments := ( Argument+ )
fn parse_arguments(stream: &mut TokenStream<'_>) -> ParseResult<Vec<Argument>> {
    let open = stream.expect(TokenKind::LParen)?;
    let mut arguments = Vec::new();

    loop {
        match &stream.current().kind {
            TokenKind::RParen if !arguments.is_empty() => {
                stream.advance();
                return Ok(arguments);
            }
            TokenKind::Name(_) => {
                let (name, start, pos) = stream.expect_name("argument name")?;
                stream.expect(TokenKind::Colon)?;
                let value = parse_value(stream, false)?;
                arguments.push(Argument {
                    name,
                    value,
                    span: stream.span_from(&start),
                    pos,
                });
            }
            TokenKind::Eof => {
                return Err(stream.unclosed("argument list", TokenKind::RParen, &open));
            }
            other => {
                return Err(stream.error_here(format!("expected argument name, found {other}")));
            }
        }
    }
}

/// FragmentSpread := ... Name
/// InlineFragment := ... (on Name)? SelectionSet
fn parse_fragment(stream: &mut TokenStream<'_>) -> ParseResult<Selection> {
    let start = stream.current().span.clone();
    let pos = stream.current().pos;
    stream.expect(TokenKind::Spread)?;

    if stream.check_name("on") {
        stream.advance();
        let (type_condition, _, _) = stream.expect_name("type condition")?;
        reject_directives(stream)?;
        let selection_set = parse_selection_set(stream)?;
        return Ok(Selection::InlineFragment(InlineFragment {
            type_condition: Some(type_condition),
            selection_set,
            span: stream.span_from(&start),
            pos,
        }));
    }

    if matches!(stream.current().kind, TokenKind::Name(_)) {
        let (name, _, _) = stream.expect_name("fragment name")?;
        reject_directives(stream)?;
        return Ok(Selection::FragmentSpread(FragmentSpread {
            name,
            span: stream.span_from(&start),
            pos,
        }));
    }

    reject_directives(stream)?;
    let selection_set = parse_selection_set(stream)?;
    Ok(Selection::InlineFragment(InlineFragment {
        type_condition: None,
        selection_set,
        span: stream.span_from(&start),
        pos,
    }))
}

/// Directives are not executed; `@` wherever a directive may appear is an error.
fn reject_directives(stream: &TokenStream<'_>) -> ParseResult<()> {
    if stream.check(&TokenKind::At) {
        return Err(Box::new(
            Diag::error("directives are not supported")
                .with_primary_label(stream.current().span.clone(), "here")
                .with_code("syntax::unsupported_directive"),
        ));
    }
    Ok(())
}
