//! Emitter state and the top-level `Query` -> `Stmt` dispatch.

use std::cell::{Cell, RefCell};

use sqlcraft_core::{DataArg, Operation, Query};
use sqlcraft_schema::{Registry, TypeTag};
use sqlcraft_sql::{render, Dialect, Expr, ParamName, PgType, Stmt, TableName};

use crate::{EmitError, EmitResult, Emitted};

mod aggregate;
mod condition;
mod mutate;
mod relation;
mod select;
#[cfg(test)]
mod testutil;

/// Per-emission mutable state: a monotonic table-alias counter (`t0`, `t1`,
/// ...), a monotonic synthetic parameter-name counter (`p0`, `p1`, ...)
/// distinct from the renderer's own param-name dedup (which operates on
/// whatever [`ParamName`] the emitter hands it), and a side table mapping
/// each synthetic name's numeric suffix back to the runtime value it binds.
///
/// One `Emitter` is used for exactly one `emit` call: the whole query tree —
/// including every nested relation subquery — is assembled into a single
/// `Stmt` and rendered once, so parameter numbers stay in left-to-right
/// document order (spec §5) instead of restarting per subquery.
pub(crate) struct Emitter<'d> {
    pub(crate) dialect: &'d dyn Dialect,
    alias_seq: Cell<u32>,
    param_seq: Cell<usize>,
    bindings: RefCell<Vec<serde_json::Value>>,
}

impl<'d> Emitter<'d> {
    fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect, alias_seq: Cell::new(0), param_seq: Cell::new(0), bindings: RefCell::new(Vec::new()) }
    }

    /// Allocate the next table alias in this emission's scope-opening order.
    pub(crate) fn next_alias(&self) -> TableName {
        let n = self.alias_seq.get();
        self.alias_seq.set(n + 1);
        format!("t{n}").into()
    }

    /// Bind a runtime value, returning the `Expr::Param` placeholder for it.
    pub(crate) fn bind(&self, value: serde_json::Value) -> Expr {
        Expr::param(ParamName::from(self.bind_name(value)))
    }

    /// Bind a runtime value, returning its synthetic parameter name rather
    /// than wrapping it in an `Expr::Param`. Used for `UNNEST` columns, where
    /// [`sqlcraft_sql::UnnestParam::name`] must be the bare name (it is
    /// reused both as the bind placeholder and the virtual row-type column).
    pub(crate) fn bind_name(&self, value: serde_json::Value) -> String {
        let idx = self.param_seq.get();
        self.param_seq.set(idx + 1);
        self.bindings.borrow_mut().push(value);
        format!("p{idx}")
    }
}

/// Map a schema [`TypeTag`] to the PostgreSQL type a bound parameter of that
/// type should be cast to, so `= ANY($1::text[])`/`$1::jsonb` style casts
/// disambiguate an otherwise untyped JSON-encoded parameter.
///
/// Returns `None` for tags with no single corresponding `PgType` (`Vector`,
/// `Null`, and — for `is_array` — `Blob`, since PostgreSQL has no portable
/// `bytea[]` literal shape the JSON-encoded parameter path here produces);
/// callers fall back to leaving the parameter uncast.
pub(crate) fn pg_type_for(tag: TypeTag, is_array: bool) -> Option<PgType> {
    let scalar = match tag {
        TypeTag::String | TypeTag::Enum => PgType::Text,
        TypeTag::Int => PgType::Integer,
        TypeTag::BigInt => PgType::BigInt,
        TypeTag::Float => PgType::DoublePrecision,
        TypeTag::Decimal => PgType::Numeric,
        TypeTag::Boolean => PgType::Boolean,
        TypeTag::DateTime => PgType::Timestamptz,
        TypeTag::Json => PgType::Jsonb,
        TypeTag::Blob => PgType::Bytea,
        TypeTag::Vector | TypeTag::Null => return None,
    };
    if !is_array {
        return Some(scalar);
    }
    match scalar {
        PgType::Text => Some(PgType::TextArray),
        PgType::BigInt => Some(PgType::BigIntArray),
        PgType::Integer => Some(PgType::IntegerArray),
        PgType::Boolean => Some(PgType::BooleanArray),
        PgType::DoublePrecision => Some(PgType::DoublePrecisionArray),
        PgType::Numeric => Some(PgType::NumericArray),
        PgType::Timestamptz => Some(PgType::TimestamptzArray),
        _ => None,
    }
}

/// Emit `query` against `dialect`: assemble one [`Stmt`], render it once,
/// and resolve the renderer's param names back to bound runtime values.
///
/// `registry` must be the same [`Registry`] `query`'s `FieldRef`/`RelationRef`
/// handles were resolved from.
pub fn emit(query: &Query<'_>, registry: &Registry, dialect: &dyn Dialect) -> EmitResult<Emitted> {
    let emitter = Emitter::new(dialect);
    let stmt = dispatch(&emitter, registry, query)?;
    let rendered = render(&stmt);

    let bindings = emitter.bindings.into_inner();
    let mut params = Vec::with_capacity(rendered.params.len());
    for name in &rendered.params {
        let idx: usize = name
            .strip_prefix('p')
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| EmitError::Invariant(format!("unexpected parameter name `{name}` in rendered SQL")))?;
        let value = bindings
            .get(idx)
            .cloned()
            .ok_or_else(|| EmitError::Invariant(format!("parameter index {idx} has no bound value")))?;
        params.push(value);
    }

    Ok(Emitted { sql: rendered.sql, params })
}

fn dispatch(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>) -> EmitResult<Stmt> {
    match query.operation {
        Operation::FindUnique
        | Operation::FindUniqueOrThrow
        | Operation::FindFirst
        | Operation::FindFirstOrThrow
        | Operation::FindMany => Ok(Stmt::Select(select::emit_find(emitter, registry, query)?)),

        Operation::Count => Ok(Stmt::Select(aggregate::emit_count(emitter, registry, query)?)),
        Operation::Aggregate => Ok(Stmt::Select(aggregate::emit_aggregate(emitter, registry, query)?)),
        Operation::GroupBy => Ok(Stmt::Select(aggregate::emit_group_by(emitter, registry, query)?)),

        Operation::Create => match &query.args.data {
            Some(DataArg::Single(data)) => Ok(Stmt::Insert(mutate::emit_create(emitter, query, data)?)),
            _ => Err(EmitError::Invariant("create requires DataArg::Single".into())),
        },
        Operation::Update => match &query.args.data {
            Some(DataArg::Single(data)) => Ok(Stmt::Update(mutate::emit_update(emitter, registry, query, data)?)),
            _ => Err(EmitError::Invariant("update requires DataArg::Single".into())),
        },
        Operation::Delete => Ok(Stmt::Delete(mutate::emit_delete(emitter, registry, query)?)),
        Operation::Upsert => match &query.args.data {
            Some(DataArg::Upsert(upsert)) => Ok(Stmt::Insert(mutate::emit_upsert(emitter, registry, upsert)?)),
            _ => Err(EmitError::Invariant("upsert requires DataArg::Upsert".into())),
        },

        Operation::CreateMany => match &query.args.data {
            Some(DataArg::Batch(batch)) => Ok(mutate::emit_create_many(emitter, batch)?),
            _ => Err(EmitError::Invariant("createMany requires DataArg::Batch".into())),
        },
        Operation::UpdateMany => match &query.args.data {
            Some(DataArg::Batch(batch)) => Ok(Stmt::Update(mutate::emit_update_many(emitter, registry, query, batch)?)),
            _ => Err(EmitError::Invariant("updateMany requires DataArg::Batch".into())),
        },
        Operation::DeleteMany => Ok(Stmt::Delete(mutate::emit_delete_many(emitter, registry, query)?)),
    }
}
