//! The Selection Parser (spec §4.6): `select` and `include`, with arbitrarily
//! nested subqueries.

use crate::ast::{Inclusion, InclusionRelation, NestedSelection, Selection, SelectionField};
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use crate::resolver::{resolve_field_or_relation, ResolvedRef};
use sqlcraft_schema::{ModelRef, Registry};

pub fn parse_select<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Selection<'a>, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidObject { reason: "select must be an object".into() }))?;

    let mut fields = Vec::new();
    let mut relations = Vec::new();
    for (key, val) in obj {
        match resolve_field_or_relation(registry, model, key)? {
            ResolvedRef::Field(field_ref) => {
                if val.is_truthy() {
                    fields.push(SelectionField { field_ref, include: true });
                }
            }
            ResolvedRef::Relation(relation_ref) => {
                if !val.is_truthy() {
                    continue;
                }
                let target = relation_ref.target(registry)?;
                let args = match val {
                    InputValue::Object(nested_obj) => Some(Box::new(super::parse_clauses(nested_obj, registry, target)?)),
                    _ => None,
                };
                relations.push(NestedSelection { relation_ref, args });
            }
        }
    }
    Ok(Selection { model_ref: model, fields, relations })
}

pub fn parse_include<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Inclusion<'a>, ParseError> {
    let obj = value.as_object().ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidObject { reason: "include must be an object".into() })
    })?;

    let mut relations = Vec::new();
    for (key, val) in obj {
        let relation_ref = crate::resolver::resolve_relation(registry, model, key)?;
        if !val.is_truthy() {
            continue;
        }
        let target = relation_ref.target(registry)?;
        let args = match val {
            InputValue::Object(nested_obj) => Some(Box::new(super::parse_clauses(nested_obj, registry, target)?)),
            _ => None,
        };
        relations.push(InclusionRelation { relation_ref, nested: NestedSelection { relation_ref, args } });
    }
    Ok(Inclusion { model_ref: model, relations })
}
