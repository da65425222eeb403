//! `find*`/`select`/`include` -> a single [`SelectStmt`] (spec §4.13).
//!
//! Relation columns are correlated subqueries in the outer SELECT list, not
//! joins: each nested model gets its own table alias and its own `WHERE`,
//! independent of how many sibling relations are selected alongside it.

use sqlcraft_core::{
    AggregateOp, Cursor, Direction, NestedSelection, NullsPlacement, Ordering, OrderingTarget, Query, QueryArgs,
};
use sqlcraft_schema::{FieldRef, ModelRef, Registry};
use sqlcraft_sql::{BinOp, Expr, FromClause, NullsOrder, OrderBy, SelectColumn, SelectStmt, TableName};

use super::condition::{bind_scalar, emit_condition};
use super::relation::{is_to_many, relation_predicate};
use super::Emitter;
use crate::EmitResult;

pub(crate) fn emit_find(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>) -> EmitResult<SelectStmt> {
    let alias = emitter.next_alias();
    build_select(emitter, registry, query.model_ref, &alias, &query.args)
}

/// Compose the SELECT for one model scope: a top-level `find*` or a nested
/// relation subquery. `alias` is this scope's already-allocated table alias.
pub(crate) fn build_select<'a>(
    emitter: &Emitter<'_>,
    registry: &Registry,
    model: ModelRef<'a>,
    alias: &TableName,
    args: &QueryArgs<'a>,
) -> EmitResult<SelectStmt> {
    let mut stmt =
        SelectStmt::new().from(FromClause::aliased(model.model.table().into(), alias.clone()));

    stmt = stmt.columns(build_columns(emitter, registry, alias, args)?);
    apply_clauses(stmt, emitter, registry, alias, args)
}

/// The `where`/cursor/`orderBy`/`groupBy`/`having`/`take`/`skip` clauses
/// shared by `find*`, `count`, `aggregate`, and `groupBy` (spec §4.12):
/// every operation composes these the same way, differing only in `columns`.
pub(crate) fn apply_clauses<'a>(
    mut stmt: SelectStmt,
    emitter: &Emitter<'_>,
    registry: &Registry,
    alias: &TableName,
    args: &QueryArgs<'a>,
) -> EmitResult<SelectStmt> {
    if !args.distinct.is_empty() {
        stmt = stmt.distinct_on(
            args.distinct.iter().map(|f| Expr::qualified_column(alias.clone(), f.field.column().into())),
        );
    }

    let mut where_expr = match &args.where_ {
        Some(cond) => Some(emit_condition(emitter, registry, alias, cond)?),
        None => None,
    };
    if let Some(cursor) = &args.cursor {
        let cursor_expr = emit_cursor(emitter, alias, cursor, &args.order_by);
        where_expr = Some(match where_expr {
            Some(w) => w.and(cursor_expr),
            None => cursor_expr,
        });
    }
    if let Some(w) = where_expr {
        stmt = stmt.where_(w);
    }

    for ordering in &args.order_by {
        stmt = stmt.order_by(emit_ordering(emitter, registry, alias, ordering)?);
    }

    if !args.group_by.is_empty() {
        stmt = stmt.group_by(
            args.group_by.iter().map(|g| Expr::qualified_column(alias.clone(), g.field_ref.field.column().into())),
        );
    }
    if let Some(having) = &args.having {
        stmt = stmt.having(emit_condition(emitter, registry, alias, having)?);
    }

    if let Some(take) = args.take {
        stmt = stmt.limit(Expr::Int(take));
    }
    if let Some(skip) = args.skip {
        stmt = stmt.offset(Expr::Int(skip));
    }

    Ok(stmt)
}

fn build_columns<'a>(
    emitter: &Emitter<'_>,
    registry: &Registry,
    alias: &TableName,
    args: &QueryArgs<'a>,
) -> EmitResult<Vec<SelectColumn>> {
    let mut columns = Vec::new();

    match &args.select {
        Some(selection) => {
            for field in &selection.fields {
                columns.push(SelectColumn::aliased(
                    Expr::qualified_column(alias.clone(), field.field_ref.field.column().into()),
                    field.field_ref.name.into(),
                ));
            }
            for nested in &selection.relations {
                columns.push(emit_relation_column(emitter, registry, alias, nested)?);
            }
        }
        None => {
            columns.push(SelectColumn::all_from(alias.clone()));
            if let Some(inclusion) = &args.include {
                for relation in &inclusion.relations {
                    columns.push(emit_relation_column(emitter, registry, alias, &relation.nested)?);
                }
            }
        }
    }

    Ok(columns)
}

fn emit_relation_column<'a>(
    emitter: &Emitter<'_>,
    registry: &Registry,
    outer_alias: &TableName,
    nested: &NestedSelection<'a>,
) -> EmitResult<SelectColumn> {
    let relation_ref = nested.relation_ref;
    let target = relation_ref.target(registry)?;
    let inner_alias = emitter.next_alias();
    let join_pred = relation_predicate(emitter, registry, outer_alias, &inner_alias, relation_ref, target)?;

    let empty_args = QueryArgs::default();
    let nested_args = nested.args.as_deref().unwrap_or(&empty_args);

    let mut inner_select = build_select(emitter, registry, target, &inner_alias, nested_args)?;
    inner_select = inner_select.and_where(join_pred);

    let alias_str = inner_alias.as_str();
    let outer_select = if is_to_many(relation_ref.relation.kind) {
        SelectStmt::new()
            .columns([SelectColumn::expr(Expr::Raw(emitter.dialect.json_array_agg(alias_str)))])
            .from(FromClause::subquery(inner_select, inner_alias))
    } else {
        inner_select = inner_select.limit(Expr::Int(1));
        SelectStmt::new()
            .columns([SelectColumn::expr(Expr::Raw(emitter.dialect.json_object(alias_str)))])
            .from(FromClause::subquery(inner_select, inner_alias))
    };

    Ok(SelectColumn::aliased(Expr::subquery(outer_select), relation_ref.name.into()))
}

fn map_nulls(nulls: Option<NullsPlacement>) -> Option<NullsOrder> {
    nulls.map(|n| match n {
        NullsPlacement::First => NullsOrder::First,
        NullsPlacement::Last => NullsOrder::Last,
    })
}

pub(crate) fn aggregate_expr(op: AggregateOp, field_ref: Option<FieldRef<'_>>, alias: &TableName) -> Expr {
    match op {
        AggregateOp::Count => match field_ref {
            Some(f) => Expr::FnCall {
                name: "count".into(),
                args: vec![Expr::qualified_column(alias.clone(), f.field.column().into())],
            },
            None => Expr::Count { table: alias.clone() },
        },
        AggregateOp::Avg | AggregateOp::Sum | AggregateOp::Min | AggregateOp::Max => {
            let f = field_ref.expect("non-count aggregate always carries a field_ref");
            let name = match op {
                AggregateOp::Avg => "avg",
                AggregateOp::Sum => "sum",
                AggregateOp::Min => "min",
                AggregateOp::Max => "max",
                AggregateOp::Count => unreachable!(),
            };
            Expr::FnCall { name: name.into(), args: vec![Expr::qualified_column(alias.clone(), f.field.column().into())] }
        }
    }
}

fn resolve_ordering_expr<'a>(
    emitter: &Emitter<'_>,
    registry: &Registry,
    alias: &TableName,
    ordering: &Ordering<'a>,
) -> EmitResult<(Expr, Direction, Option<NullsOrder>)> {
    match &ordering.target {
        OrderingTarget::Field(field_ref) => Ok((
            Expr::qualified_column(alias.clone(), field_ref.field.column().into()),
            ordering.direction,
            map_nulls(ordering.nulls),
        )),
        OrderingTarget::RelationCount(relation_ref) => {
            let target = relation_ref.target(registry)?;
            let inner_alias = emitter.next_alias();
            let join_pred = relation_predicate(emitter, registry, alias, &inner_alias, *relation_ref, target)?;
            let count_select = SelectStmt::new()
                .columns([SelectColumn::expr(Expr::Count { table: inner_alias.clone() })])
                .from(FromClause::aliased(target.model.table().into(), inner_alias))
                .where_(join_pred);
            Ok((Expr::subquery(count_select), ordering.direction, map_nulls(ordering.nulls)))
        }
        OrderingTarget::RelationNested(relation_ref, inner) => {
            let target = relation_ref.target(registry)?;
            let inner_alias = emitter.next_alias();
            let join_pred = relation_predicate(emitter, registry, alias, &inner_alias, *relation_ref, target)?;
            let (inner_expr, direction, nulls) = resolve_ordering_expr(emitter, registry, &inner_alias, inner)?;
            let scalar_select = SelectStmt::new()
                .columns([SelectColumn::expr(inner_expr)])
                .from(FromClause::aliased(target.model.table().into(), inner_alias))
                .where_(join_pred)
                .limit(Expr::Int(1));
            Ok((Expr::subquery(scalar_select), direction, nulls))
        }
        OrderingTarget::Aggregate(op, field_ref) => {
            Ok((aggregate_expr(*op, *field_ref, alias), ordering.direction, map_nulls(ordering.nulls)))
        }
        OrderingTarget::AggregateAlias(op, field_ref) => {
            let alias_name = match field_ref {
                Some(f) => format!("{}_{}", op.alias_prefix(), f.name),
                None => op.alias_prefix().to_string(),
            };
            Ok((Expr::column(alias_name.into()), ordering.direction, map_nulls(ordering.nulls)))
        }
    }
}

fn emit_ordering<'a>(
    emitter: &Emitter<'_>,
    registry: &Registry,
    alias: &TableName,
    ordering: &Ordering<'a>,
) -> EmitResult<OrderBy> {
    let (expr, direction, nulls) = resolve_ordering_expr(emitter, registry, alias, ordering)?;
    Ok(OrderBy { expr, desc: direction == Direction::Desc, nulls })
}

/// `col <op> value` where `<op>` depends on the direction the cursor field is
/// itself ordered by (spec §4.13): ascending orders use `>=`, descending use
/// `<=`, defaulting to ascending when the cursor field isn't in `orderBy`.
fn emit_cursor(emitter: &Emitter<'_>, alias: &TableName, cursor: &Cursor<'_>, order_by: &[Ordering<'_>]) -> Expr {
    let direction = cursor.direction.unwrap_or_else(|| {
        order_by
            .iter()
            .find_map(|o| match o.target {
                OrderingTarget::Field(fr) if std::ptr::eq(fr.field, cursor.field_ref.field) => Some(o.direction),
                _ => None,
            })
            .unwrap_or(Direction::Asc)
    });

    let col = Expr::qualified_column(alias.clone(), cursor.field_ref.field.column().into());
    let op = match direction {
        Direction::Asc => BinOp::Ge,
        Direction::Desc => BinOp::Le,
    };
    Expr::BinOp { left: Box::new(col), op, right: Box::new(bind_scalar(emitter, &cursor.value)) }
}
