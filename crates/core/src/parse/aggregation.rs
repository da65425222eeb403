//! The Aggregation Parser (spec §4.8): `_count`/`_avg`/`_sum`/`_min`/`_max`
//! and `groupBy`.

use crate::ast::{AggField, AggregateOp, Aggregation, GroupBy};
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use sqlcraft_schema::{ModelRef, Registry};

const AGG_KEYS: &[(&str, AggregateOp)] = &[
    ("_count", AggregateOp::Count),
    ("_avg", AggregateOp::Avg),
    ("_sum", AggregateOp::Sum),
    ("_min", AggregateOp::Min),
    ("_max", AggregateOp::Max),
];

/// Parse the `_count`/`_avg`/`_sum`/`_min`/`_max` keys out of a clause
/// object (the top-level `args` for `aggregate`, or `select`/`groupBy`
/// siblings). Returns `None` if none of those keys are present.
pub fn parse_aggregate<'a>(
    obj: &indexmap::IndexMap<String, InputValue>,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Option<Aggregation<'a>>, ParseError> {
    let mut aggregations = Vec::new();
    for (key, op) in AGG_KEYS {
        let Some(value) = obj.get(*key) else { continue };
        match op {
            AggregateOp::Count => aggregations.extend(parse_count_value(value, registry, model)?),
            _ => aggregations.extend(parse_avg_sum_min_max_value(*op, value, registry, model)?),
        }
    }
    if aggregations.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Aggregation { model_ref: model, aggregations }))
    }
}

fn parse_count_value<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Vec<AggField<'a>>, ParseError> {
    if value.as_bool() == Some(true) {
        return Ok(vec![AggField { op: AggregateOp::Count, field_ref: None, alias: Some("_count".to_string()) }]);
    }
    let obj = value.as_object().ok_or_else(|| {
        ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: "_count".to_string(),
            reason: "expected `true` or an object of field names".to_string(),
        })
    })?;
    let mut fields = Vec::with_capacity(obj.len());
    for (key, truthy) in obj {
        if !truthy.is_truthy() {
            continue;
        }
        if key == "_all" {
            fields.push(AggField { op: AggregateOp::Count, field_ref: None, alias: Some("_count".to_string()) });
            continue;
        }
        let field_ref = crate::resolver::resolve_field(registry, model, key)?;
        fields.push(AggField {
            op: AggregateOp::Count,
            field_ref: Some(field_ref),
            alias: Some(format!("_count_{key}")),
        });
    }
    Ok(fields)
}

fn parse_avg_sum_min_max_value<'a>(
    op: AggregateOp,
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Vec<AggField<'a>>, ParseError> {
    let obj = value.as_object().ok_or_else(|| {
        ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: op.alias_prefix().to_string(),
            reason: "expected an object of {field: true}".to_string(),
        })
    })?;
    let mut fields = Vec::with_capacity(obj.len());
    for (key, truthy) in obj {
        if !truthy.is_truthy() {
            continue;
        }
        let field_ref = crate::resolver::resolve_field(registry, model, key)?;
        if matches!(op, AggregateOp::Avg | AggregateOp::Sum) && !field_ref.field.type_tag.is_numeric() {
            return Err(ParseError::new(ParseErrorKind::TypeMismatch {
                expected: "numeric".to_string(),
                got: format!("{:?}", field_ref.field.type_tag),
            })
            .with_field(key));
        }
        fields.push(AggField {
            op,
            field_ref: Some(field_ref),
            alias: Some(format!("{}_{key}", op.alias_prefix())),
        });
    }
    Ok(fields)
}

/// `groupBy`'s `by` argument: an array of field names.
pub fn parse_group_by<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Vec<GroupBy<'a>>, ParseError> {
    let items = value
        .as_array()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidArray { reason: "groupBy `by` must be an array".into() }))?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let name = item.as_str().ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidArray { reason: "groupBy `by` entries must be strings".into() })
        })?;
        out.push(GroupBy { field_ref: crate::resolver::resolve_field(registry, model, name)? });
    }
    Ok(out)
}
