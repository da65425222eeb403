//! The Ordering Parser (spec §4.7): `orderBy`, including aggregate and
//! relation ordering.

use crate::ast::{AggregateOp, Direction, NullsPlacement, Ordering, OrderingTarget};
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use crate::resolver::{resolve_field_or_relation, ResolvedRef};
use sqlcraft_schema::{ModelRef, Registry};

fn aggregate_op_from_name(name: &str) -> Option<AggregateOp> {
    Some(match name {
        "count" => AggregateOp::Count,
        "avg" => AggregateOp::Avg,
        "sum" => AggregateOp::Sum,
        "min" => AggregateOp::Min,
        "max" => AggregateOp::Max,
        _ => return None,
    })
}

pub fn parse_order_by<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Vec<Ordering<'a>>, ParseError> {
    match value {
        InputValue::Array(items) => {
            let mut orderings = Vec::with_capacity(items.len());
            for item in items {
                let obj = item.as_object().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidObject {
                        reason: "orderBy array entries must be objects".into(),
                    })
                })?;
                for (key, val) in obj {
                    orderings.push(parse_order_entry(key, val, registry, model)?);
                }
            }
            Ok(orderings)
        }
        InputValue::Object(obj) => {
            let mut orderings = Vec::with_capacity(obj.len());
            for (key, val) in obj {
                orderings.push(parse_order_entry(key, val, registry, model)?);
            }
            Ok(orderings)
        }
        _ => Err(ParseError::new(ParseErrorKind::InvalidObject {
            reason: "orderBy must be an object or array of objects".into(),
        })),
    }
}

fn parse_order_entry<'a>(
    key: &str,
    val: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Ordering<'a>, ParseError> {
    if let Some(rest) = key.strip_prefix('_') {
        let (agg_name, field_name) = rest.split_once('.').map_or((rest, None), |(a, f)| (a, Some(f)));
        if let Some(op) = aggregate_op_from_name(agg_name) {
            let field_ref = field_name.map(|f| crate::resolver::resolve_field(registry, model, f)).transpose()?;
            let (direction, nulls) = parse_direction_value(val)?;
            return Ok(Ordering { target: OrderingTarget::AggregateAlias(op, field_ref), direction, nulls });
        }
    }

    if let Some((agg_name, field_name)) = key.split_once('.') {
        let op = aggregate_op_from_name(agg_name).ok_or_else(|| {
            ParseError::new(ParseErrorKind::WrongOperatorShape {
                operator: agg_name.to_string(),
                reason: "unknown aggregate function in orderBy path".to_string(),
            })
        })?;
        let field_ref = crate::resolver::resolve_field(registry, model, field_name)?;
        let (direction, nulls) = parse_direction_value(val)?;
        return Ok(Ordering { target: OrderingTarget::Aggregate(op, Some(field_ref)), direction, nulls });
    }

    if let Some(op) = aggregate_op_from_name(key) {
        let (direction, nulls) = parse_direction_value(val)?;
        return Ok(Ordering { target: OrderingTarget::Aggregate(op, None), direction, nulls });
    }

    match resolve_field_or_relation(registry, model, key)? {
        ResolvedRef::Field(field_ref) => {
            let (direction, nulls) = parse_direction_value(val)?;
            Ok(Ordering { target: OrderingTarget::Field(field_ref), direction, nulls })
        }
        ResolvedRef::Relation(relation_ref) => {
            let nested_obj = val.as_object().ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidObject {
                    reason: "relation orderBy must be an object".into(),
                })
                .with_field(key)
            })?;
            if let Some(count_val) = nested_obj.get("_count") {
                let (direction, nulls) = parse_direction_value(count_val)?;
                return Ok(Ordering { target: OrderingTarget::RelationCount(relation_ref), direction, nulls });
            }
            let (nested_key, nested_val) = nested_obj.iter().next().ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidObject {
                    reason: "relation orderBy object must not be empty".into(),
                })
                .with_field(key)
            })?;
            let target_model = relation_ref.target(registry)?;
            let nested = parse_order_entry(nested_key, nested_val, registry, target_model)?;
            Ok(Ordering {
                target: OrderingTarget::RelationNested(relation_ref, Box::new(nested)),
                direction: Direction::Asc,
                nulls: None,
            })
        }
    }
}

fn parse_direction_value(val: &InputValue) -> Result<(Direction, Option<NullsPlacement>), ParseError> {
    match val {
        InputValue::String(s) => Ok((parse_direction_str(s)?, None)),
        InputValue::Object(obj) => {
            let sort = obj
                .get("sort")
                .and_then(InputValue::as_str)
                .ok_or_else(|| ParseError::new(ParseErrorKind::MissingRequired { argument: "sort".into() }))?;
            let nulls = obj.get("nulls").and_then(InputValue::as_str).map(parse_nulls_str).transpose()?;
            Ok((parse_direction_str(sort)?, nulls))
        }
        _ => Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: "orderBy".to_string(),
            reason: "expected \"asc\"/\"desc\" or {sort, nulls}".to_string(),
        })),
    }
}

fn parse_direction_str(s: &str) -> Result<Direction, ParseError> {
    match s {
        "asc" => Ok(Direction::Asc),
        "desc" => Ok(Direction::Desc),
        other => Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: other.to_string(),
            reason: "expected \"asc\" or \"desc\"".to_string(),
        })),
    }
}

fn parse_nulls_str(s: &str) -> Result<NullsPlacement, ParseError> {
    match s {
        "first" => Ok(NullsPlacement::First),
        "last" => Ok(NullsPlacement::Last),
        other => Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: other.to_string(),
            reason: "expected \"first\" or \"last\"".to_string(),
        })),
    }
}
