//! The Query Parser orchestrator (spec §4.12): dispatches each [`Operation`]
//! to its required/optional clause parsers and assembles the final [`Query`].

pub mod aggregation;
pub mod batch;
pub mod cursor;
pub mod data;
pub mod filter;
pub mod ordering;
pub mod selection;
pub mod upsert;

use crate::ast::{BatchOp, DataArg, Operation, Query, QueryArgs};
use crate::error::{ParseError, ParseErrorKind};
use crate::input::InputValue;
use sqlcraft_schema::{ModelRef, Registry};

/// Parse the clauses common to most operations (`where`, `select`, `include`,
/// `orderBy`, `groupBy`, `having`, `take`, `skip`, `cursor`, `distinct`,
/// aggregate keys) out of a single args object, independent of `operation`.
/// Used both for the top-level args and recursively for nested relation
/// selections (spec §4.6), which share this same clause vocabulary.
pub fn parse_clauses<'a>(
    obj: &indexmap::IndexMap<String, InputValue>,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<QueryArgs<'a>, ParseError> {
    let mut args = QueryArgs::new();

    args.where_ = filter::parse_filter(obj.get("where"), registry, model)?;

    if let Some(value) = obj.get("select") {
        args.select = Some(selection::parse_select(value, registry, model)?);
    }
    if let Some(value) = obj.get("include") {
        args.include = Some(selection::parse_include(value, registry, model)?);
    }
    if let Some(value) = obj.get("orderBy") {
        args.order_by = ordering::parse_order_by(value, registry, model)?;
    }
    if let Some(value) = obj.get("groupBy").or_else(|| obj.get("by")) {
        args.group_by = aggregation::parse_group_by(value, registry, model)?;
    }
    args.having = filter::parse_filter(obj.get("having"), registry, model)?;
    args.aggregate = aggregation::parse_aggregate(obj, registry, model)?;

    if let Some(value) = obj.get("take") {
        args.take = Some(parse_i64(value, "take")?);
    }
    if let Some(value) = obj.get("skip") {
        args.skip = Some(parse_i64(value, "skip")?);
    }
    if let Some(value) = obj.get("cursor") {
        args.cursor = Some(cursor::parse_cursor(value, registry, model)?);
    }
    if let Some(value) = obj.get("distinct") {
        args.distinct = parse_distinct(value, registry, model)?;
    }

    Ok(args)
}

fn parse_i64(value: &InputValue, name: &str) -> Result<i64, ParseError> {
    match value {
        InputValue::Int(i) => Ok(*i),
        _ => Err(ParseError::new(ParseErrorKind::TypeMismatch {
            expected: "integer".to_string(),
            got: format!("{value:?}"),
        })
        .with_field(name)),
    }
}

fn parse_distinct<'a>(
    value: &InputValue,
    registry: &'a Registry,
    model: ModelRef<'a>,
) -> Result<Vec<sqlcraft_schema::FieldRef<'a>>, ParseError> {
    let items = value
        .as_array()
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidArray { reason: "distinct must be an array".into() }))?;
    items
        .iter()
        .map(|item| {
            let name = item.as_str().ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidArray { reason: "distinct entries must be field names".into() })
            })?;
            crate::resolver::resolve_field(registry, model, name)
        })
        .collect()
}

/// Dispatch `args` for `operation` against `model`, enforcing the
/// required/optional argument table (spec §4.12) and assembling the final
/// [`Query`].
pub fn parse<'a>(
    registry: &'a Registry,
    model: ModelRef<'a>,
    operation: Operation,
    args_value: &InputValue,
) -> Result<Query<'a>, ParseError> {
    let empty = indexmap::IndexMap::new();
    let obj = match args_value {
        InputValue::Object(obj) => obj,
        InputValue::Null => &empty,
        _ => {
            return Err(ParseError::new(ParseErrorKind::InvalidObject { reason: "query args must be an object".into() })
                .with_operation(operation_name(operation))
                .with_model(model.name.to_string()))
        }
    };

    dispatch(registry, model, operation, obj)
        .map_err(|e| e.with_operation(operation_name(operation)).with_model(model.name.to_string()))
}

fn dispatch<'a>(
    registry: &'a Registry,
    model: ModelRef<'a>,
    operation: Operation,
    obj: &indexmap::IndexMap<String, InputValue>,
) -> Result<Query<'a>, ParseError> {
    let mut args = parse_clauses(obj, registry, model)?;

    if operation.requires_where() && args.where_.is_none() {
        return Err(ParseError::new(ParseErrorKind::MissingRequired { argument: "where".to_string() }));
    }

    match operation {
        Operation::FindUnique
        | Operation::FindUniqueOrThrow
        | Operation::FindFirst
        | Operation::FindFirstOrThrow
        | Operation::FindMany
        | Operation::Count => {}

        Operation::Create => {
            let data_value = require(obj, "data")?;
            args.data = Some(DataArg::Single(data::parse_data(data_value, registry, model)?));
        }
        Operation::Update => {
            let data_value = require(obj, "data")?;
            args.data = Some(DataArg::Single(data::parse_data(data_value, registry, model)?));
        }
        Operation::CreateMany => {
            let data_value = require(obj, "data")?;
            let skip_duplicates = obj.get("skipDuplicates").and_then(InputValue::as_bool).unwrap_or(false);
            args.data = Some(DataArg::Batch(batch::parse_batch_data(
                data_value,
                registry,
                model,
                BatchOp::CreateMany,
                skip_duplicates,
            )?));
        }
        Operation::UpdateMany => {
            let data_value = require(obj, "data")?;
            args.data = Some(DataArg::Batch(batch::parse_update_many_data(data_value, registry, model)?));
        }
        Operation::DeleteMany => {
            args.data = Some(DataArg::Batch(batch::empty_batch(model, BatchOp::DeleteMany)));
        }
        Operation::Delete => {}
        Operation::Upsert => {
            let upsert = upsert::parse_upsert(obj, registry, model)?;
            args.data = Some(DataArg::Upsert(Box::new(upsert)));
        }
        Operation::Aggregate => {
            if args.aggregate.is_none() {
                return Err(ParseError::new(ParseErrorKind::MissingRequired {
                    argument: "_count/_avg/_sum/_min/_max".to_string(),
                }));
            }
        }
        Operation::GroupBy => {
            if args.group_by.is_empty() {
                return Err(ParseError::new(ParseErrorKind::MissingRequired { argument: "by".to_string() }));
            }
        }
    }

    Ok(Query { operation, model_ref: model, args })
}

fn require<'a>(
    obj: &'a indexmap::IndexMap<String, InputValue>,
    key: &str,
) -> Result<&'a InputValue, ParseError> {
    obj.get(key).ok_or_else(|| ParseError::new(ParseErrorKind::MissingRequired { argument: key.to_string() }))
}

fn operation_name(operation: Operation) -> &'static str {
    match operation {
        Operation::FindUnique => "findUnique",
        Operation::FindUniqueOrThrow => "findUniqueOrThrow",
        Operation::FindFirst => "findFirst",
        Operation::FindFirstOrThrow => "findFirstOrThrow",
        Operation::FindMany => "findMany",
        Operation::Create => "create",
        Operation::CreateMany => "createMany",
        Operation::Update => "update",
        Operation::UpdateMany => "updateMany",
        Operation::Upsert => "upsert",
        Operation::Delete => "delete",
        Operation::DeleteMany => "deleteMany",
        Operation::Count => "count",
        Operation::Aggregate => "aggregate",
        Operation::GroupBy => "groupBy",
    }
}
