//! The reference PostgreSQL [`Dialect`] (spec §6.4).

use sqlcraft_sql::{Dialect, ParamStyle};

/// Stateless, zero-sized PostgreSQL [`Dialect`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn param_style(&self) -> ParamStyle {
        ParamStyle::Dollar
    }

    fn json_array_agg(&self, row_source_alias: &str) -> String {
        format!("coalesce(json_agg(row_to_json({row_source_alias})), '[]'::json)")
    }

    fn json_object(&self, row_source_alias: &str) -> String {
        format!("row_to_json({row_source_alias})")
    }

    fn array_literal(&self, elements: &[String]) -> String {
        format!("ARRAY[{}]", elements.join(", "))
    }

    fn json_type_name(&self) -> &'static str {
        "jsonb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_params() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.render_param(1), "$1");
        assert_eq!(dialect.render_param(2), "$2");
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(PostgresDialect.quote_ident("users"), "\"users\"");
    }

    #[test]
    fn wraps_to_many_aggregation() {
        assert_eq!(PostgresDialect.json_array_agg("t1"), "coalesce(json_agg(row_to_json(t1)), '[]'::json)");
    }
}
