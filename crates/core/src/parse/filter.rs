//! The Filter Parser (spec §4.4): `where`/`having` trees.

use crate::ast::{Condition, LogicalOp, RelationOp};
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use crate::operators::{known_operator_keys, Operator};
use crate::resolver::{resolve_field_or_relation, ResolvedRef};
use crate::value::{encode_scalar_value, encode_value, encode_value_array_of, ValueOptions};
use sqlcraft_schema::{ModelRef, Registry, TypeTag};

const JSON_BUNDLE_KEYS: &[&str] = &[
    "path",
    "string_contains",
    "string_starts_with",
    "string_ends_with",
    "array_contains",
    "array_starts_with",
    "array_ends_with",
];

/// Parse a top-level `where`/`having` value. `None` input or an empty object
/// both yield `Ok(None)` — zero conditions, no clause emitted.
pub fn parse_filter<'a>(
    value: Option<&InputValue>,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Option<Condition<'a>>, ParseError> {
    let Some(value) = value else { return Ok(None) };
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidObject { reason: "where/having must be an object".into() }))?;
    let conditions = parse_conditions_from_object(obj, registry, model)?;
    Ok(fold_and(conditions))
}

/// Parse a nested filter object (inside `NOT`, `AND`/`OR` array entries,
/// relation predicates) into a single condition, never `None`: an empty
/// object becomes a truthy empty `AND`.
fn parse_object_condition<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Condition<'a>, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidObject { reason: "expected a filter object".into() }))?;
    let conditions = parse_conditions_from_object(obj, registry, model)?;
    Ok(fold_and(conditions).unwrap_or_else(|| Condition::logical(LogicalOp::And, Vec::new())))
}

fn fold_and(mut conditions: Vec<Condition<'_>>) -> Option<Condition<'_>> {
    match conditions.len() {
        0 => None,
        1 => Some(conditions.pop().unwrap()),
        _ => Some(Condition::logical(LogicalOp::And, conditions)),
    }
}

fn parse_conditions_from_object<'a>(
    obj: &indexmap::IndexMap<String, InputValue>,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Vec<Condition<'a>>, ParseError> {
    let mut conditions = Vec::with_capacity(obj.len());
    for (key, value) in obj {
        match key.as_str() {
            "AND" => {
                let items = value.as_array().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidArray { reason: "AND requires an array".into() })
                })?;
                let nested = items
                    .iter()
                    .map(|item| parse_object_condition(item, registry, model))
                    .collect::<Result<Vec<_>, _>>()?;
                conditions.push(Condition::logical(LogicalOp::And, nested));
            }
            "OR" => {
                let items = value.as_array().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidArray { reason: "OR requires an array".into() })
                })?;
                let nested = items
                    .iter()
                    .map(|item| parse_object_condition(item, registry, model))
                    .collect::<Result<Vec<_>, _>>()?;
                conditions.push(Condition::logical(LogicalOp::Or, nested));
            }
            "NOT" => {
                let nested = parse_object_condition(value, registry, model)?;
                conditions.push(Condition::logical(LogicalOp::Not, vec![nested]));
            }
            key => {
                let resolved = resolve_field_or_relation(registry, model, key)?;
                match resolved {
                    ResolvedRef::Field(field_ref) => {
                        conditions.push(parse_field_condition(field_ref, value)?);
                    }
                    ResolvedRef::Relation(relation_ref) => {
                        let obj = value.as_object().ok_or_else(|| {
                            ParseError::new(ParseErrorKind::InvalidObject {
                                reason: "relation filter must be an object".into(),
                            })
                            .with_field(key)
                        })?;
                        if obj.len() != 1 {
                            return Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
                                operator: "relation".to_string(),
                                reason: "expected exactly one of some/every/none/is/isNot".to_string(),
                            })
                            .with_field(key));
                        }
                        let (rel_key, inner) = obj.iter().next().unwrap();
                        let op = match rel_key.as_str() {
                            "some" => RelationOp::Some,
                            "every" => RelationOp::Every,
                            "none" => RelationOp::None,
                            "is" => RelationOp::Is,
                            "isNot" => RelationOp::IsNot,
                            other => {
                                return Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
                                    operator: other.to_string(),
                                    reason: "expected one of some/every/none/is/isNot".to_string(),
                                })
                                .with_field(key));
                            }
                        };
                        let target_model = relation_ref.target(registry)?;
                        let nested = parse_object_condition(inner, registry, target_model)?;
                        conditions.push(Condition::relation(relation_ref, op, nested));
                    }
                }
            }
        }
    }
    Ok(conditions)
}

fn parse_field_condition<'a>(
    field_ref: sqlcraft_schema::FieldRef<'a>,
    value: &InputValue,
) -> Result<Condition<'a>, ParseError> {
    let field = field_ref.field;
    let obj = match value {
        InputValue::Object(obj) => obj,
        _ => {
            let encoded = encode_value(value, Some(field))?;
            return Ok(Condition::field(field_ref, Operator::Equals, encoded));
        }
    };

    if obj.keys().any(|k| JSON_BUNDLE_KEYS.contains(&k.as_str())) {
        return parse_json_bundle_condition(field_ref, obj);
    }

    let mode_insensitive = obj.get("mode").and_then(InputValue::as_str).map(|m| m == "insensitive").unwrap_or(false);
    let entries: Vec<(&String, &InputValue)> = obj.iter().filter(|(k, _)| k.as_str() != "mode").collect();

    if entries.is_empty() {
        return Err(ParseError::new(ParseErrorKind::InvalidObject {
            reason: "operator object must have at least one operator key".to_string(),
        })
        .with_field(&field.name));
    }

    if entries.len() == 1 {
        let (key, v) = entries[0];
        return build_operator_condition(field_ref, key, v, mode_insensitive);
    }

    let conditions = entries
        .into_iter()
        .map(|(key, v)| build_operator_condition(field_ref, key, v, mode_insensitive))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Condition::logical(LogicalOp::And, conditions))
}

fn build_operator_condition<'a>(
    field_ref: sqlcraft_schema::FieldRef<'a>,
    key: &str,
    value: &InputValue,
    mode_insensitive: bool,
) -> Result<Condition<'a>, ParseError> {
    let field = field_ref.field;
    let operator = Operator::from_key(key).ok_or_else(|| {
        ParseError::new(ParseErrorKind::UnknownOperator {
            operator: key.to_string(),
            known: known_operator_keys().join(", "),
        })
        .with_field(&field.name)
    })?;

    if operator.is_array_field_operator() && !field.is_array {
        return Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: key.to_string(),
            reason: format!("field `{}` is not an array field", field.name),
        })
        .with_field(&field.name));
    }
    if operator.is_json_operator() && field.type_tag != TypeTag::Json {
        return Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: key.to_string(),
            reason: format!("field `{}` is not a json field", field.name),
        })
        .with_field(&field.name));
    }
    if !operator.is_array_field_operator()
        && !operator.is_json_operator()
        && !crate::operators::is_allowed(field.type_tag, operator)
    {
        return Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: key.to_string(),
            reason: format!("operator `{key}` is not valid for field `{}`", field.name),
        })
        .with_field(&field.name));
    }

    let condition = match operator {
        Operator::IsNull | Operator::IsNotNull => {
            Condition::field(field_ref, operator, encode_scalar_value(&InputValue::Null, field.type_tag)?)
        }
        Operator::In | Operator::NotIn => {
            let items = value
                .as_array()
                .ok_or_else(|| ParseError::new(ParseErrorKind::InNotInRequiresArray).with_field(&field.name))?;
            Condition::field(field_ref, operator, encode_value_array_of(items, field.type_tag)?)
        }
        Operator::Has => {
            Condition::field(field_ref, operator, encode_scalar_value(value, field.type_tag)?)
        }
        Operator::HasEvery | Operator::HasSome => {
            let items = value.as_array().ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidArray { reason: format!("`{key}` requires an array") })
                    .with_field(&field.name)
            })?;
            Condition::field(field_ref, operator, encode_value_array_of(items, field.type_tag)?)
        }
        Operator::IsEmpty => {
            Condition::field(field_ref, operator, encode_scalar_value(value, TypeTag::Boolean)?)
        }
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let mut encoded = encode_scalar_value(value, TypeTag::String)?;
            encoded.options.insensitive = mode_insensitive;
            Condition::field(field_ref, operator, encoded)
        }
        Operator::JsonPath
        | Operator::JsonContains
        | Operator::JsonStartsWith
        | Operator::JsonEndsWith
        | Operator::ArrayContains
        | Operator::ArrayStartsWith
        | Operator::ArrayEndsWith => {
            let is_array = matches!(value, InputValue::Array(_));
            Condition::field(
                field_ref,
                operator,
                crate::value::Value::new(value.clone(), TypeTag::Json, is_array),
            )
        }
        Operator::Equals | Operator::Not | Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
            Condition::field(field_ref, operator, encode_value(value, Some(field))?)
        }
    };
    Ok(condition)
}

fn parse_json_bundle_condition<'a>(
    field_ref: sqlcraft_schema::FieldRef<'a>,
    obj: &indexmap::IndexMap<String, InputValue>,
) -> Result<Condition<'a>, ParseError> {
    let field = field_ref.field;
    if field.type_tag != TypeTag::Json {
        return Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
            operator: "path".to_string(),
            reason: format!("field `{}` is not a json field", field.name),
        })
        .with_field(&field.name));
    }

    let json_path = obj.get("path").and_then(InputValue::as_array).map(|segs| {
        segs.iter().filter_map(InputValue::as_str).map(str::to_string).collect::<Vec<_>>()
    });
    let options = ValueOptions {
        insensitive: false,
        json_path,
        string_contains: obj.get("string_contains").and_then(InputValue::as_str).map(str::to_string),
        string_starts_with: obj.get("string_starts_with").and_then(InputValue::as_str).map(str::to_string),
        string_ends_with: obj.get("string_ends_with").and_then(InputValue::as_str).map(str::to_string),
        array_contains: obj.get("array_contains").cloned(),
        array_starts_with: obj.get("array_starts_with").cloned(),
        array_ends_with: obj.get("array_ends_with").cloned(),
    };

    let value = crate::value::Value::new(InputValue::Null, TypeTag::Json, false).with_options(options);
    Ok(Condition::field(field_ref, Operator::Equals, value))
}
