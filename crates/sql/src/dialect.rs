//! The narrow interface an emitter calls to go from AST to dialect-specific
//! SQL text (spec §4.14).
//!
//! [`Expr`]/[`Stmt`] already bake in PostgreSQL-flavored constructs
//! (`ILIKE`, JSONB operators, `= ANY`), so a [`Dialect`] implementation is
//! not responsible for generating alternate ASTs — it answers the handful
//! of formatting questions ([`Render`] can't answer on its own because
//! they depend on *how* a value arrived, not just its shape) that the
//! emitter needs while assembling one: placeholder syntax, array literal
//! syntax, and the JSON/array operators a relation subquery wraps its
//! aggregate in.

/// Parameter placeholder style a dialect renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `$1`, `$2`, ... (PostgreSQL, positional, 1-based)
    Dollar,
    /// `?1`, `?2`, ... (spec's dialect-neutral reference numbering)
    QuestionNumbered,
    /// `?` repeated positionally, no numbering
    QuestionBare,
}

/// A pure, stateless value-producer translating AST fragments into the
/// strings a specific backend expects. Adapters perform no I/O and hold no
/// state across calls (spec §4.14); they are typically zero-sized types.
pub trait Dialect {
    /// How this dialect numbers/spells its parameter placeholders.
    fn param_style(&self) -> ParamStyle;

    /// Render a single placeholder for the 1-based parameter index `idx`.
    fn render_param(&self, idx: usize) -> String {
        match self.param_style() {
            ParamStyle::Dollar => format!("${idx}"),
            ParamStyle::QuestionNumbered => format!("?{idx}"),
            ParamStyle::QuestionBare => "?".to_string(),
        }
    }

    /// Quote an identifier (table/column/alias name).
    fn quote_ident(&self, name: &str) -> String {
        crate::quote_ident(name)
    }

    /// Wrap a to-many relation subquery's row source into its aggregate
    /// form: `COALESCE(json_agg(row_to_json(t)), '[]'::json)` for Postgres.
    fn json_array_agg(&self, row_source_alias: &str) -> String;

    /// Wrap a to-one relation subquery's row source: `row_to_json(t)` for
    /// Postgres, followed by the emitter's own `LIMIT 1`.
    fn json_object(&self, row_source_alias: &str) -> String;

    /// Render an array literal of already-rendered element strings, e.g.
    /// `ARRAY[$1, $2]` for Postgres.
    fn array_literal(&self, elements: &[String]) -> String;

    /// The SQL type name a JSON payload is cast to (`jsonb` for Postgres).
    fn json_type_name(&self) -> &'static str;
}
