//! The Cursor Parser (spec §4.10): keyset pagination anchors.

use crate::ast::Cursor;
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use crate::value::encode_value;
use sqlcraft_schema::{ModelRef, Registry};

/// `cursor` is a single-key object naming an orderable field and its anchor
/// value. More or fewer than one key is a `wrong-cardinality` error; a
/// non-orderable field type is rejected outright.
pub fn parse_cursor<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Cursor<'a>, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidObject { reason: "cursor must be an object".into() }))?;

    if obj.len() != 1 {
        return Err(ParseError::new(ParseErrorKind::WrongCardinality {
            reason: "cursor must name exactly one field".to_string(),
        }));
    }

    let (key, val) = obj.iter().next().unwrap();
    let field_ref = crate::resolver::resolve_field(registry, model, key)?;
    if !field_ref.field.type_tag.is_orderable() {
        return Err(ParseError::new(ParseErrorKind::NotOrderableCursorField { field: key.clone() }));
    }

    let encoded = encode_value(val, Some(field_ref.field))?;
    Ok(Cursor { field_ref, value: encoded, direction: None })
}
