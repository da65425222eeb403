//! The PostgreSQL AST Emitter (spec §4.13/§6): turns a parsed [`Query`] into
//! one parameterized statement plus its bound runtime values.
//!
//! Mirrors the split between a pure, dialect-agnostic AST (`sqlcraft-sql`)
//! and a backend-specific emitter that walks the query AST, assembling a
//! single `Stmt` and calling [`sqlcraft_sql::render`] exactly once so every
//! parameter — including ones nested inside correlated relation subqueries —
//! shares one left-to-right numbering.

use thiserror::Error;

mod dialect;
pub use dialect::PostgresDialect;

mod emit;
pub use emit::emit;

/// The result of emitting a [`Query`]: one SQL statement plus its bound
/// parameter values, in the order the statement's placeholders reference
/// them.
#[derive(Debug, Clone)]
pub struct Emitted {
    pub sql: String,
    pub params: Vec<serde_json::Value>,
}

/// Errors surfaced by the emitter.
///
/// The emitter treats its input AST as trusted — a shape the query parser
/// could never produce (a dangling schema reference, an out-of-range
/// synthetic parameter name) is an internal invariant violation, not a
/// user-facing parse error, so this is deliberately its own type rather
/// than reusing [`sqlcraft_core::error::ParseError`].
#[derive(Debug, Clone, Error)]
pub enum EmitError {
    #[error("emitter invariant violated: {0}")]
    Invariant(String),
    #[error("relation target could not be resolved: {0}")]
    Schema(#[from] sqlcraft_schema::SchemaError),
}

pub(crate) type EmitResult<T> = Result<T, EmitError>;
