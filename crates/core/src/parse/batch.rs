//! The Batch Parser (spec §4.9): `createMany`/`updateMany`/`deleteMany`
//! payloads, with per-item error index prefixing.

use crate::ast::{BatchData, BatchOp};
use crate::error::ParseError;
use crate::input::InputValue;
use sqlcraft_schema::{ModelRef, Registry};

/// Parse the `data` array for `createMany`/`updateMany`. Each item is parsed
/// as an independent [`Data`]; a failure anywhere is wrapped with that item's
/// index via [`ParseError::with_item_index`].
pub fn parse_batch_data<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
    op: BatchOp,
    skip_duplicates: bool,
) -> Result<BatchData<'a>, ParseError> {
    let items = value.as_array().ok_or_else(|| {
        ParseError::new(crate::error::ParseErrorKind::InvalidArray {
            reason: "batch data must be an array".to_string(),
        })
    })?;

    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let data = super::data::parse_data(item, registry, model).map_err(|e| e.with_item_index(index))?;
        parsed.push(data);
    }

    Ok(BatchData { model_ref: model, op, items: parsed, skip_duplicates })
}

/// `deleteMany` has no `data` payload — just a shared `where`, handled by the
/// filter parser. This helper exists for symmetry with `createMany`/
/// `updateMany` so the orchestrator can treat all three batch ops uniformly
/// when building [`BatchData`] placeholders.
pub fn empty_batch<'a>(model: ModelRef<'a>, op: BatchOp) -> BatchData<'a> {
    BatchData { model_ref: model, op, items: Vec::new(), skip_duplicates: false }
}

/// Parse `updateMany`'s `data`: a single object applied to every row matched
/// by `where` (spec §4.9), not an array like `createMany`. Carried as a
/// one-element `items` so the emitter can treat all three batch ops
/// uniformly.
pub fn parse_update_many_data<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<BatchData<'a>, ParseError> {
    let data = super::data::parse_data(value, registry, model)?;
    Ok(BatchData { model_ref: model, op: BatchOp::UpdateMany, items: vec![data], skip_duplicates: false })
}
