//! The Value Encoder (spec §4.2): maps host values to tagged semantic values.

use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use sqlcraft_schema::{Field, TypeTag};

/// Per-operator options carried alongside a [`Value`], covering the
/// case-insensitive `mode`, JSON path/payload bundles, and array-operator
/// discriminators §4 calls out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueOptions {
    pub insensitive: bool,
    pub json_path: Option<Vec<String>>,
    pub string_contains: Option<String>,
    pub string_starts_with: Option<String>,
    pub string_ends_with: Option<String>,
    pub array_contains: Option<InputValue>,
    pub array_starts_with: Option<InputValue>,
    pub array_ends_with: Option<InputValue>,
}

impl ValueOptions {
    pub fn is_default(&self) -> bool {
        *self == ValueOptions::default()
    }
}

/// A single scalar or array value, tagged with the type it was encoded
/// under.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub raw: InputValue,
    pub type_tag: TypeTag,
    pub is_array: bool,
    pub options: ValueOptions,
}

impl Value {
    pub fn new(raw: InputValue, type_tag: TypeTag, is_array: bool) -> Self {
        Self { raw, type_tag, is_array, options: ValueOptions::default() }
    }

    pub fn with_options(mut self, options: ValueOptions) -> Self {
        self.options = options;
        self
    }
}

/// Encode `raw` into a [`Value`], optionally under the context of `field`.
///
/// Inference rule (spec §4.2): a declared field wins; otherwise the host
/// value's own shape decides the tag. Plain arrays recurse into their first
/// element for the inner tag (defaulting to `string` when empty) and require
/// every element share a compatible tag.
pub fn encode_value(raw: &InputValue, field: Option<&Field>) -> Result<Value, ParseError> {
    if let Some(field) = field {
        return encode_in_field_context(raw, field);
    }
    encode_inferred(raw)
}

fn encode_in_field_context(raw: &InputValue, field: &Field) -> Result<Value, ParseError> {
    if field.is_array {
        let InputValue::Array(items) = raw else {
            if raw.is_null() {
                return Ok(Value::new(raw.clone(), field.type_tag, true));
            }
            return Err(ParseError::new(ParseErrorKind::InvalidArray {
                reason: format!("field `{}` expects an array", field.name),
            }));
        };
        for item in items {
            check_scalar_compatible(item, field.type_tag)?;
        }
        return Ok(Value::new(raw.clone(), field.type_tag, true));
    }

    if raw.is_null() {
        return Ok(Value::new(raw.clone(), field.type_tag, false));
    }
    check_scalar_compatible(raw, field.type_tag)?;
    Ok(Value::new(raw.clone(), field.type_tag, false))
}

/// Encode `raw` as a single scalar under `tag`, ignoring any field's
/// `is_array` flag. Used for operators whose value shape is independent of
/// the target field's array-ness (`has`, `isEmpty`, …).
pub fn encode_scalar_value(raw: &InputValue, tag: TypeTag) -> Result<Value, ParseError> {
    if !raw.is_null() {
        check_scalar_compatible(raw, tag)?;
    }
    Ok(Value::new(raw.clone(), tag, false))
}

/// Encode a list of elements as an array `Value` under `tag`, checking each
/// element is compatible and that they all share a compatible tag with one
/// another (spec §4.2 array coherence). Used for `in`/`notIn`/`hasEvery`/
/// `hasSome`, where the value is an array regardless of whether the target
/// field itself is declared `is_array`.
pub fn encode_value_array_of(items: &[InputValue], tag: TypeTag) -> Result<Value, ParseError> {
    for item in items {
        if !item.is_null() {
            check_scalar_compatible(item, tag)?;
        }
    }
    Ok(Value::new(InputValue::Array(items.to_vec()), tag, true))
}

fn check_scalar_compatible(raw: &InputValue, tag: TypeTag) -> Result<(), ParseError> {
    let compatible = match (tag, raw) {
        (TypeTag::String | TypeTag::Enum, InputValue::String(_)) => true,
        (TypeTag::Int | TypeTag::BigInt, InputValue::Int(_)) => true,
        (TypeTag::Float, InputValue::Int(_) | InputValue::Float(_)) => true,
        (TypeTag::Decimal, InputValue::Int(_) | InputValue::Float(_)) => true,
        (TypeTag::Decimal, InputValue::String(s)) => return check_decimal_literal(s),
        (TypeTag::Boolean, InputValue::Bool(_)) => true,
        (TypeTag::DateTime, InputValue::String(s)) => return check_datetime_literal(s),
        (TypeTag::Json, _) => true,
        (TypeTag::Blob, InputValue::String(_) | InputValue::Array(_)) => true,
        (TypeTag::Vector, InputValue::Array(_)) => true,
        (TypeTag::Null, InputValue::Null) => true,
        _ => raw.is_null(),
    };
    if compatible {
        Ok(())
    } else {
        Err(ParseError::new(ParseErrorKind::TypeMismatch {
            expected: format!("{tag:?}"),
            got: format!("{raw:?}"),
        }))
    }
}

/// A `Decimal` literal may arrive as a JSON number (for whole or simple
/// values) or, to survive round trips without losing precision, as a
/// string — which must parse as an actual decimal.
fn check_decimal_literal(s: &str) -> Result<(), ParseError> {
    s.parse::<rust_decimal::Decimal>().map(|_| ()).map_err(|_| {
        ParseError::new(ParseErrorKind::TypeMismatch { expected: "Decimal".into(), got: format!("{s:?}") })
    })
}

/// A `DateTime` literal is a string, but it must actually be one: reject
/// anything that doesn't parse as RFC 3339 before it reaches the emitter.
fn check_datetime_literal(s: &str) -> Result<(), ParseError> {
    chrono::DateTime::parse_from_rfc3339(s).map(|_| ()).map_err(|_| {
        ParseError::new(ParseErrorKind::TypeMismatch { expected: "DateTime (RFC 3339)".into(), got: format!("{s:?}") })
    })
}

fn encode_inferred(raw: &InputValue) -> Result<Value, ParseError> {
    match raw {
        InputValue::Null => Ok(Value::new(raw.clone(), TypeTag::Null, false)),
        InputValue::Bool(_) => Ok(Value::new(raw.clone(), TypeTag::Boolean, false)),
        InputValue::Int(_) => Ok(Value::new(raw.clone(), TypeTag::Int, false)),
        InputValue::Float(_) => Ok(Value::new(raw.clone(), TypeTag::Float, false)),
        InputValue::String(_) => Ok(Value::new(raw.clone(), TypeTag::String, false)),
        InputValue::Object(_) => Ok(Value::new(raw.clone(), TypeTag::Json, false)),
        InputValue::Array(items) => {
            let inner_tag = match items.first() {
                Some(first) => encode_inferred(first)?.type_tag,
                None => TypeTag::String,
            };
            for item in items {
                let item_tag = encode_inferred(item)?.type_tag;
                if item_tag != inner_tag && item_tag != TypeTag::Null {
                    return Err(ParseError::new(ParseErrorKind::MixedArrayTypes));
                }
            }
            Ok(Value::new(raw.clone(), inner_tag, true))
        }
    }
}
