//! Compiles database-agnostic query arguments into a typed query AST,
//! validated against a schema registry (spec §1–§4).
//!
//! The registry (see [`sqlcraft_schema`]) owns model/field/relation data;
//! this crate owns the parsers that narrow a loosely-typed argument tree
//! (`InputValue`) into [`ast::Query`] and the operator/value semantics those
//! parsers share.

mod ast;
mod error;
mod input;
mod operators;
mod parse;
mod resolver;
mod value;

pub use ast::{
    AggField, AggregateOp, Aggregation, BatchData, BatchOp, Condition, ConditionTarget, ConflictTarget, Cursor, Data,
    DataArg, DataField, Direction, FieldDataOp, GroupBy, Inclusion, InclusionRelation, LogicalOp, NestedSelection,
    NullsPlacement, Operation, Ordering, OrderingTarget, Query, QueryArgs, RelationDataOp, RelationOp, Selection,
    SelectionField, Upsert,
};
pub use error::{ParseError, ParseErrorKind};
pub use input::InputValue;
pub use operators::Operator;
pub use value::{Value, ValueOptions};

use sqlcraft_schema::{ModelRef, Registry};

/// Parse `args` into a [`Query`] for `operation` against `model_name`,
/// enforcing the per-operation required/optional argument table (spec
/// §4.12).
pub fn parse_query<'a>(
    registry: &'a Registry,
    model_name: &str,
    operation: Operation,
    args: &InputValue,
) -> Result<Query<'a>, ParseError> {
    let model: ModelRef<'a> = registry.get_model(model_name)?;
    parse::parse(registry, model, operation, args)
}
