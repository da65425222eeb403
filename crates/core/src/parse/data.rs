//! The Data Parser (spec §4.5): `data` objects for create/update payloads.

use crate::ast::{Data, DataField, FieldDataOp, RelationDataOp};
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use crate::resolver::{resolve_field_or_relation, ResolvedRef};
use crate::value::encode_value;
use sqlcraft_schema::{ModelRef, Registry};

const FIELD_OPS: &[(&str, FieldDataOp)] = &[
    ("increment", FieldDataOp::Increment),
    ("decrement", FieldDataOp::Decrement),
    ("multiply", FieldDataOp::Multiply),
    ("divide", FieldDataOp::Divide),
    ("push", FieldDataOp::Push),
];

const RELATION_OPS: &[(&str, RelationDataOp)] = &[
    ("connect", RelationDataOp::Connect),
    ("create", RelationDataOp::Create),
    ("connectOrCreate", RelationDataOp::ConnectOrCreate),
    ("disconnect", RelationDataOp::Disconnect),
    ("delete", RelationDataOp::Delete),
    ("update", RelationDataOp::Update),
    ("upsert", RelationDataOp::Upsert),
];

pub fn parse_data<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Data<'a>, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidObject { reason: "data must be an object".into() }))?;

    let mut fields = Vec::with_capacity(obj.len());
    for (key, val) in obj {
        match resolve_field_or_relation(registry, model, key)? {
            ResolvedRef::Field(field_ref) => {
                let field = field_ref.field;
                if let Some(op_obj) = val.as_object() {
                    if let Some((_, op)) = FIELD_OPS.iter().find(|(name, _)| op_obj.contains_key(*name)) {
                        if *op == FieldDataOp::Push && !field.is_array {
                            return Err(ParseError::new(ParseErrorKind::WrongOperatorShape {
                                operator: "push".to_string(),
                                reason: format!("field `{}` is not an array field", field.name),
                            })
                            .with_field(&field.name));
                        }
                        let name = FIELD_OPS.iter().find(|(_, o)| o == op).unwrap().0;
                        let inner = op_obj.get(name).unwrap();
                        let encoded = encode_value(inner, Some(field))?;
                        fields.push(DataField::Field { field_ref, op: *op, value: encoded });
                        continue;
                    }
                }
                let encoded = encode_value(val, Some(field))?;
                fields.push(DataField::Field { field_ref, op: FieldDataOp::Set, value: encoded });
            }
            ResolvedRef::Relation(relation_ref) => {
                let op = val
                    .as_object()
                    .and_then(|obj| RELATION_OPS.iter().find(|(name, _)| obj.contains_key(*name)))
                    .map(|(_, op)| *op)
                    .unwrap_or(RelationDataOp::Connect);
                // Nested create/update payloads are re-parsed by the owning
                // operation at emission time; carried through opaquely here.
                fields.push(DataField::Relation { relation_ref, op, payload: val.clone() });
            }
        }
    }

    Ok(Data { model_ref: model, fields })
}
