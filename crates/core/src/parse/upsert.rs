//! The Upsert Parser (spec §4.11): `conflictTarget` resolution and the
//! `create`/`update` payload pair.

use crate::ast::{ConflictTarget, DataField, Upsert};
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use sqlcraft_schema::{ModelRef, Registry};

pub fn parse_upsert<'a>(
    args: &indexmap::IndexMap<String, InputValue>,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Upsert<'a>, ParseError> {
    let create_value = args
        .get("create")
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingRequired { argument: "create".into() }))?;
    let update_value = args
        .get("update")
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingRequired { argument: "update".into() }))?;

    let create_data = super::data::parse_data(create_value, registry, model)?;
    let update_data = super::data::parse_data(update_value, registry, model)?;

    let conflict_target = match args.get("conflictTarget") {
        Some(value) => parse_conflict_target(value, registry, model)?,
        None => infer_conflict_target(&create_data)?,
    };

    let where_ = crate::parse::filter::parse_filter(args.get("where"), registry, model)?;

    Ok(Upsert { model_ref: model, conflict_target, create_data, update_data, where_ })
}

fn parse_conflict_target<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<ConflictTarget<'a>, ParseError> {
    if let Some(name) = value.as_str() {
        return Ok(ConflictTarget::Fields(vec![crate::resolver::resolve_field(registry, model, name)?]));
    }

    if let Some(items) = value.as_array() {
        return Ok(ConflictTarget::Fields(resolve_field_names(items, registry, model)?));
    }

    if let Some(obj) = value.as_object() {
        if let Some(items) = obj.get("fields").and_then(InputValue::as_array) {
            return Ok(ConflictTarget::Fields(resolve_field_names(items, registry, model)?));
        }
        if let Some(index) = obj.get("index").and_then(InputValue::as_str) {
            return Ok(ConflictTarget::Index(index.to_string()));
        }
        if let Some(constraint) = obj.get("constraint").and_then(InputValue::as_str) {
            return Ok(ConflictTarget::Constraint(constraint.to_string()));
        }
    }

    Err(ParseError::new(ParseErrorKind::BadConflictTarget {
        reason: "expected a field name, an array of field names, {fields}, {index}, or {constraint}".to_string(),
    }))
}

fn resolve_field_names<'a>(
    items: &[InputValue],
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Vec<sqlcraft_schema::FieldRef<'a>>, ParseError> {
    let mut fields = Vec::with_capacity(items.len());
    for item in items {
        let name = item.as_str().ok_or_else(|| {
            ParseError::new(ParseErrorKind::BadConflictTarget {
                reason: "conflictTarget array entries must be field names".to_string(),
            })
        })?;
        fields.push(crate::resolver::resolve_field(registry, model, name)?);
    }
    Ok(fields)
}

/// When `conflictTarget` is omitted, infer it from `create`'s fields: prefer
/// the model's id field if `create` assigns it, otherwise the first unique
/// field `create` assigns. Neither present is a `no-conflict-target` error.
fn infer_conflict_target<'a>(create_data: &crate::ast::Data<'a>) -> Result<ConflictTarget<'a>, ParseError> {
    let assigned_fields: Vec<_> = create_data
        .fields
        .iter()
        .filter_map(|f| match f {
            DataField::Field { field_ref, .. } => Some(*field_ref),
            DataField::Relation { .. } => None,
        })
        .collect();

    if let Some(id_field) = assigned_fields.iter().find(|f| f.field.is_id) {
        return Ok(ConflictTarget::Fields(vec![*id_field]));
    }
    if let Some(unique_field) = assigned_fields.iter().find(|f| f.field.is_unique) {
        return Ok(ConflictTarget::Fields(vec![*unique_field]));
    }

    Err(ParseError::new(ParseErrorKind::NoConflictTarget))
}
