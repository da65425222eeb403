//! `count`/`aggregate`/`groupBy` -> a single [`SelectStmt`] (spec §4.12/§4.13).
//!
//! All three share one column shape: a comma-joined list of `OP(col) AS
//! "_op_field"` aggregates (plus, for `groupBy`, the grouping columns
//! themselves), built on the same `where`/`orderBy`/`having`/`take`/`skip`
//! composition [`select::apply_clauses`] gives `find*`.

use sqlcraft_core::{AggField, Query};
use sqlcraft_schema::Registry;
use sqlcraft_sql::{Expr, FromClause, SelectColumn, SelectStmt, TableName};

use super::select::{self, aggregate_expr};
use super::Emitter;
use crate::EmitResult;

fn agg_column(alias: &TableName, field: &AggField<'_>) -> SelectColumn {
    let expr = aggregate_expr(field.op, field.field_ref, alias);
    let column_alias = field.alias.clone().unwrap_or_else(|| field.op.alias_prefix().to_string());
    SelectColumn::aliased(expr, column_alias.into())
}

pub(crate) fn emit_count(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>) -> EmitResult<SelectStmt> {
    let alias = emitter.next_alias();
    let stmt = SelectStmt::new().from(FromClause::aliased(query.model_ref.model.table().into(), alias.clone()));

    let columns = match &query.args.aggregate {
        Some(agg) => agg.aggregations.iter().map(|f| agg_column(&alias, f)).collect(),
        None => vec![SelectColumn::aliased(Expr::Count { table: alias.clone() }, "_count".into())],
    };

    select::apply_clauses(stmt.columns(columns), emitter, registry, &alias, &query.args)
}

pub(crate) fn emit_aggregate(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>) -> EmitResult<SelectStmt> {
    let alias = emitter.next_alias();
    let stmt = SelectStmt::new().from(FromClause::aliased(query.model_ref.model.table().into(), alias.clone()));

    let columns = query
        .args
        .aggregate
        .as_ref()
        .map(|agg| agg.aggregations.iter().map(|f| agg_column(&alias, f)).collect())
        .unwrap_or_default();

    select::apply_clauses(stmt.columns(columns), emitter, registry, &alias, &query.args)
}

pub(crate) fn emit_group_by(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>) -> EmitResult<SelectStmt> {
    let alias = emitter.next_alias();
    let stmt = SelectStmt::new().from(FromClause::aliased(query.model_ref.model.table().into(), alias.clone()));

    let mut columns: Vec<SelectColumn> = query
        .args
        .group_by
        .iter()
        .map(|g| {
            SelectColumn::aliased(
                Expr::qualified_column(alias.clone(), g.field_ref.field.column().into()),
                g.field_ref.name.into(),
            )
        })
        .collect();
    if let Some(agg) = &query.args.aggregate {
        columns.extend(agg.aggregations.iter().map(|f| agg_column(&alias, f)));
    }

    select::apply_clauses(stmt.columns(columns), emitter, registry, &alias, &query.args)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sqlcraft_core::Operation;

    use super::super::testutil::{emit, registry};

    #[test]
    fn plain_count_has_no_aggregate_keys() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::Count, json!({}));
        assert_eq!(out.sql, "SELECT COUNT(\"t0\".*) AS \"_count\"\nFROM \"Post\" \"t0\"");
    }

    #[test]
    fn count_with_per_field_selections() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::Count, json!({"_count": {"content": true}}));
        assert_eq!(out.sql, "SELECT count(\"t0\".\"content\") AS \"_count_content\"\nFROM \"Post\" \"t0\"");
    }

    #[test]
    fn aggregate_emits_avg_and_sum_columns() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::Aggregate,
            json!({"_avg": {"views": true}, "_sum": {"views": true}}),
        );
        assert_eq!(
            out.sql,
            "SELECT avg(\"t0\".\"views\") AS \"_avg_views\", sum(\"t0\".\"views\") AS \"_sum_views\"\nFROM \"Post\" \"t0\""
        );
    }

    #[test]
    fn group_by_groups_and_aggregates_together() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::GroupBy, json!({"by": ["authorId"], "_count": {"_all": true}}));
        assert_eq!(
            out.sql,
            "SELECT \"t0\".\"authorId\" AS \"authorId\", COUNT(\"t0\".*) AS \"_count\"\nFROM \"Post\" \"t0\"\nGROUP BY \"t0\".\"authorId\""
        );
    }

    #[test]
    fn group_by_supports_having_on_an_aggregate() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::GroupBy,
            json!({"by": ["authorId"], "_count": {"_all": true}, "having": {"authorId": {"gt": 1}}}),
        );
        assert!(out.sql.contains("\nHAVING \"t0\".\"authorId\" > $1"), "{}", out.sql);
    }

    #[test]
    fn group_by_order_by_underscore_count_references_the_select_list_alias() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::GroupBy,
            json!({"by": ["authorId"], "_count": {"_all": true}, "orderBy": {"_count": "desc"}}),
        );
        assert!(out.sql.contains("ORDER BY \"_count\" DESC"), "{}", out.sql);
    }

    #[test]
    fn group_by_order_by_underscore_avg_path_references_its_own_alias() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::GroupBy,
            json!({"by": ["authorId"], "_avg": {"views": true}, "orderBy": {"_avg.views": "asc"}}),
        );
        assert!(out.sql.contains("ORDER BY \"_avg_views\" ASC"), "{}", out.sql);
    }
}
