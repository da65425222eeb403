//! A database-agnostic, type-safe query compiler (spec §6): build a
//! [`sqlcraft_schema::Registry`] once, then repeatedly [`parse`] a
//! Prisma-like argument tree into a [`Query`] and [`emit`] it against a
//! [`Dialect`] to get parameterized SQL plus its bound values.
//!
//! This crate is a thin facade — [`sqlcraft_schema`], [`sqlcraft_core`], and
//! [`sqlcraft_sql`] do the actual work. It exists so a consumer depends on
//! one crate and one pair of entry points rather than wiring the pipeline's
//! stages together by hand.
//!
//! ```no_run
//! use sqlcraft::{Field, Model, Operation, PostgresDialect, Registry, SchemaBuilder, TypeTag};
//!
//! # fn build_registry() -> Registry {
//! let mut builder = SchemaBuilder::new();
//! let user = Model::new("User")
//!     .field(Field::new("id", TypeTag::Int).id().auto())
//!     .field(Field::new("email", TypeTag::String).unique());
//! builder.register_model("User", user).unwrap();
//! builder.finalize().unwrap()
//! # }
//! let registry = build_registry();
//! let args = sqlcraft::InputValue::from(serde_json::json!({"where": {"email": "a@b.com"}}));
//! let query = sqlcraft::parse(&registry, "User", Operation::FindMany, &args).unwrap();
//! let compiled = sqlcraft::emit(&query, &registry, &PostgresDialect).unwrap();
//! assert!(compiled.sql.contains("WHERE"));
//! ```

pub use sqlcraft_core::{
    AggField, AggregateOp, Aggregation, BatchData, BatchOp, Condition, ConditionTarget, ConflictTarget, Cursor, Data,
    DataArg, DataField, Direction, FieldDataOp, GroupBy, Inclusion, InclusionRelation, InputValue, LogicalOp,
    NestedSelection, NullsPlacement, Operation, Operator, Ordering, OrderingTarget, ParseError, ParseErrorKind,
    Query, QueryArgs, RelationDataOp, RelationOp, Selection, SelectionField, Upsert, Value, ValueOptions,
};
pub use sqlcraft_postgres::{EmitError, Emitted, PostgresDialect};
pub use sqlcraft_schema::{
    Field, Model, ModelId, ModelRef, Registry, Relation, RelationKind, RelationRef, SchemaBuilder, SchemaError,
    TypeTag,
};
pub use sqlcraft_sql::{Dialect, ParamStyle, PgType, RenderedSql};

/// Parse `args` into a [`Query`] for `operation` against `model_name` (spec
/// §6.2), validating it against `registry` as it goes.
pub fn parse<'a>(
    registry: &'a Registry,
    model_name: &str,
    operation: Operation,
    args: &InputValue,
) -> Result<Query<'a>, ParseError> {
    sqlcraft_core::parse_query(registry, model_name, operation, args)
}

/// Emit a parsed [`Query`] as one parameterized SQL statement plus its bound
/// values, in allocation order (spec §6.3).
///
/// `registry` must be the same one `query`'s `ModelRef`/`FieldRef`/
/// `RelationRef` handles were resolved from; `dialect` is PostgreSQL-shaped
/// today ([`PostgresDialect`]) but the signature takes `&dyn Dialect` so a
/// second backend slots in without changing callers.
pub fn emit(query: &Query<'_>, registry: &Registry, dialect: &dyn Dialect) -> Result<Emitted, EmitError> {
    sqlcraft_postgres::emit(query, registry, dialect)
}
