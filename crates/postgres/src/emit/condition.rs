//! `where`/`having` [`Condition`] trees -> [`Expr`] (spec §4.14).

use sqlcraft_core::{Condition, ConditionTarget, InputValue, LogicalOp, Operator, RelationOp, Value};
use sqlcraft_schema::{Registry, TypeTag};
use sqlcraft_sql::{BinOp, Expr, FromClause, PgType, SelectColumn, SelectStmt, TableName};

use super::relation::relation_predicate;
use super::{pg_type_for, Emitter};
use crate::{EmitError, EmitResult};

/// Walk a `where`/`having` condition tree, binding scalar values as it goes.
/// `alias` is the table alias of the model the condition's fields are
/// relative to in the current scope.
pub(crate) fn emit_condition(
    emitter: &Emitter<'_>,
    registry: &Registry,
    alias: &TableName,
    cond: &Condition<'_>,
) -> EmitResult<Expr> {
    match cond.target {
        ConditionTarget::Logical(op) => emit_logical(emitter, registry, alias, op, &cond.nested),
        ConditionTarget::Field(field_ref) => {
            let operator =
                cond.operator.ok_or_else(|| EmitError::Invariant("field condition missing operator".into()))?;
            let value = cond.value.as_ref().ok_or_else(|| EmitError::Invariant("field condition missing value".into()))?;
            emit_field_condition(emitter, alias, field_ref, operator, value)
        }
        ConditionTarget::Relation(relation_ref, op) => {
            let nested = cond
                .nested
                .first()
                .ok_or_else(|| EmitError::Invariant("relation condition missing nested condition".into()))?;
            let target = relation_ref.target(registry)?;
            let inner_alias = emitter.next_alias();
            let join_pred = relation_predicate(emitter, registry, alias, &inner_alias, relation_ref, target)?;
            let nested_expr = emit_condition(emitter, registry, &inner_alias, nested)?;

            let select = |where_: Expr| {
                SelectStmt::new()
                    .columns([SelectColumn::expr(Expr::Int(1))])
                    .from(FromClause::aliased(target.model.table().into(), inner_alias.clone()))
                    .where_(where_)
            };

            match op {
                RelationOp::Some | RelationOp::Is => Ok(Expr::exists(select(join_pred.and(nested_expr)))),
                RelationOp::None | RelationOp::IsNot => Ok(Expr::not_exists(select(join_pred.and(nested_expr)))),
                RelationOp::Every => {
                    // "every related row matches" == "no related row fails to match"
                    Ok(Expr::not_exists(select(join_pred.and(nested_expr.not()))))
                }
            }
        }
    }
}

fn emit_logical(
    emitter: &Emitter<'_>,
    registry: &Registry,
    alias: &TableName,
    op: LogicalOp,
    nested: &[Condition<'_>],
) -> EmitResult<Expr> {
    if op == LogicalOp::Not {
        let inner = nested.first().ok_or_else(|| EmitError::Invariant("NOT missing nested condition".into()))?;
        return Ok(emit_condition(emitter, registry, alias, inner)?.not());
    }

    let exprs = nested.iter().map(|c| emit_condition(emitter, registry, alias, c)).collect::<EmitResult<Vec<_>>>()?;
    match op {
        LogicalOp::And => Ok(exprs.into_iter().reduce(Expr::and).unwrap_or(Expr::Bool(true))),
        LogicalOp::Or => Ok(exprs.into_iter().reduce(Expr::or).unwrap_or(Expr::Bool(false))),
        LogicalOp::Not => unreachable!("handled above"),
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub(crate) fn bind_scalar(emitter: &Emitter<'_>, value: &Value) -> Expr {
    let json: serde_json::Value = value.raw.clone().into();
    let param = emitter.bind(json);
    match (value.type_tag, pg_type_for(value.type_tag, false)) {
        (TypeTag::Json, Some(ty)) => param.cast(ty),
        _ => param,
    }
}

fn bind_array(emitter: &Emitter<'_>, value: &Value) -> Expr {
    let json: serde_json::Value = value.raw.clone().into();
    let param = emitter.bind(json);
    match pg_type_for(value.type_tag, true) {
        Some(ty) => param.cast(ty),
        None => param,
    }
}

fn bind_single_elem_array(emitter: &Emitter<'_>, value: &Value, tag: TypeTag) -> Expr {
    let elem: serde_json::Value = value.raw.clone().into();
    let param = emitter.bind(serde_json::Value::Array(vec![elem]));
    match pg_type_for(tag, true) {
        Some(ty) => param.cast(ty),
        None => param,
    }
}

fn bind_json_value(emitter: &Emitter<'_>, value: &InputValue) -> Expr {
    let json: serde_json::Value = value.clone().into();
    emitter.bind(json).cast(PgType::Jsonb)
}

fn bind_text_array(emitter: &Emitter<'_>, items: &[String]) -> Expr {
    let json = serde_json::Value::Array(items.iter().cloned().map(serde_json::Value::String).collect());
    emitter.bind(json).cast(PgType::TextArray)
}

fn bind_pattern(emitter: &Emitter<'_>, pattern: String) -> Expr {
    emitter.bind(serde_json::Value::String(pattern))
}

fn emit_field_condition(
    emitter: &Emitter<'_>,
    alias: &TableName,
    field_ref: sqlcraft_schema::FieldRef<'_>,
    operator: Operator,
    value: &Value,
) -> EmitResult<Expr> {
    let field = field_ref.field;
    let col = Expr::qualified_column(alias.clone(), field.column().into());

    if !value.options.is_default() {
        return Ok(emit_json_bundle(emitter, col, value));
    }

    let expr = match operator {
        Operator::Equals => {
            if value.raw.is_null() {
                col.is_null()
            } else {
                col.eq(bind_scalar(emitter, value))
            }
        }
        Operator::Not => {
            if value.raw.is_null() {
                col.is_not_null()
            } else {
                col.eq(bind_scalar(emitter, value)).not()
            }
        }
        Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
            let op = match operator {
                Operator::Lt => BinOp::Lt,
                Operator::Lte => BinOp::Le,
                Operator::Gt => BinOp::Gt,
                Operator::Gte => BinOp::Ge,
                _ => unreachable!(),
            };
            Expr::BinOp { left: Box::new(col), op, right: Box::new(bind_scalar(emitter, value)) }
        }
        Operator::In => col.any(bind_array(emitter, value)),
        Operator::NotIn => col.any(bind_array(emitter, value)).not(),
        Operator::IsNull => col.is_null(),
        Operator::IsNotNull => col.is_not_null(),
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let raw = value.raw.as_str().unwrap_or_default();
            let escaped = escape_like(raw);
            let pattern = match operator {
                Operator::Contains => format!("%{escaped}%"),
                Operator::StartsWith => format!("{escaped}%"),
                Operator::EndsWith => format!("%{escaped}"),
                _ => unreachable!(),
            };
            let pattern_expr = bind_pattern(emitter, pattern);
            if value.options.insensitive {
                col.ilike(pattern_expr)
            } else {
                col.like(pattern_expr)
            }
        }
        Operator::Has => col.contains(bind_single_elem_array(emitter, value, field.type_tag)),
        Operator::HasEvery => col.contains(bind_array(emitter, value)),
        Operator::HasSome => col.overlaps(bind_array(emitter, value)),
        Operator::IsEmpty => {
            let want_empty = value.raw.as_bool().unwrap_or(false);
            let len = Expr::FnCall { name: "array_length".into(), args: vec![col.clone(), Expr::Int(1)] };
            if want_empty {
                len.is_null()
            } else {
                len.is_not_null()
            }
        }
        // Flat single-key JSON operators (no `path`/`string_*`/`array_*` bundle
        // alongside them): `value.raw` is the operator's sole argument.
        Operator::JsonPath => {
            let segments = value.raw.as_array().map(|items| {
                items.iter().filter_map(InputValue::as_str).map(str::to_string).collect::<Vec<_>>()
            });
            match segments {
                Some(segments) => col.json_path_get(bind_text_array(emitter, &segments)).is_not_null(),
                None => col.is_not_null(),
            }
        }
        Operator::JsonContains | Operator::ArrayContains => col.contains(bind_json_value(emitter, &value.raw)),
        // No native "array starts/ends with" jsonb operator; approximated as
        // containment of the given element, same as `arrayContains` (§ Open
        // Question, resolved in DESIGN.md).
        Operator::ArrayStartsWith | Operator::ArrayEndsWith => col.contains(bind_json_value(emitter, &value.raw)),
        Operator::JsonStartsWith | Operator::JsonEndsWith => {
            let raw = value.raw.as_str().unwrap_or_default();
            let escaped = escape_like(raw);
            let pattern = if operator == Operator::JsonStartsWith {
                format!("{escaped}%")
            } else {
                format!("%{escaped}")
            };
            col.json_path_get_text(bind_text_array(emitter, &[])).like(bind_pattern(emitter, pattern))
        }
    };

    Ok(expr)
}

/// The `path`/`string_*`/`array_*` JSON bundle form (spec §4.4): `operator`
/// is always [`Operator::Equals`] here, the real shape lives in
/// `value.options`.
fn emit_json_bundle(emitter: &Emitter<'_>, col: Expr, value: &Value) -> Expr {
    let opts = &value.options;

    let wants_text = opts.string_contains.is_some() || opts.string_starts_with.is_some() || opts.string_ends_with.is_some();
    let target = match &opts.json_path {
        Some(path) if wants_text => col.json_path_get_text(bind_text_array(emitter, path)),
        Some(path) => col.json_path_get(bind_text_array(emitter, path)),
        None => col,
    };

    if let Some(s) = &opts.string_contains {
        let pattern = format!("%{}%", escape_like(s));
        return target.ilike(bind_pattern(emitter, pattern));
    }
    if let Some(s) = &opts.string_starts_with {
        let pattern = format!("{}%", escape_like(s));
        return target.ilike(bind_pattern(emitter, pattern));
    }
    if let Some(s) = &opts.string_ends_with {
        let pattern = format!("%{}", escape_like(s));
        return target.ilike(bind_pattern(emitter, pattern));
    }
    if let Some(v) = &opts.array_contains {
        return target.contains(bind_json_value(emitter, v));
    }
    if let Some(v) = &opts.array_starts_with {
        return target.contains(bind_json_value(emitter, v));
    }
    if let Some(v) = &opts.array_ends_with {
        return target.contains(bind_json_value(emitter, v));
    }

    target.is_not_null()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sqlcraft_core::Operation;

    use super::super::testutil::{emit, registry};

    #[test]
    fn equals_and_contains_combine_with_and() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::FindMany,
            json!({"where": {"published": true, "title": {"contains": "Rust"}}}),
        );
        assert_eq!(
            out.sql,
            "SELECT \"t0\".*\nFROM \"Post\" \"t0\"\nWHERE \"t0\".\"published\" = $1 AND \"t0\".\"title\" LIKE $2"
        );
        assert_eq!(out.params, vec![json!(true), json!("%Rust%")]);
    }

    #[test]
    fn in_operator_binds_a_single_array_param() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::FindMany, json!({"where": {"id": {"in": [1, 2, 3]}}}));
        assert_eq!(
            out.sql,
            "SELECT \"t0\".*\nFROM \"Post\" \"t0\"\nWHERE \"t0\".\"id\" = ANY($1::INTEGER[])"
        );
        assert_eq!(out.params, vec![json!([1, 2, 3])]);
    }

    #[test]
    fn not_negates_the_nested_condition() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::FindMany, json!({"where": {"NOT": {"published": true}}}));
        assert_eq!(
            out.sql,
            "SELECT \"t0\".*\nFROM \"Post\" \"t0\"\nWHERE NOT (\"t0\".\"published\" = $1)"
        );
    }

    #[test]
    fn relation_some_becomes_a_correlated_exists() {
        let registry = registry();
        let out =
            emit(&registry, "User", Operation::FindMany, json!({"where": {"posts": {"some": {"published": true}}}}));
        assert!(out.sql.contains("EXISTS (SELECT 1\nFROM \"Post\" \"t1\""), "{}", out.sql);
        assert!(out.sql.contains("\"t0\".\"id\" = \"t1\".\"authorId\""), "{}", out.sql);
        assert!(out.sql.contains("\"t1\".\"published\" = $1"), "{}", out.sql);
    }

    #[test]
    fn relation_every_becomes_a_negated_exists_of_the_negated_predicate() {
        let registry = registry();
        let out =
            emit(&registry, "User", Operation::FindMany, json!({"where": {"posts": {"every": {"published": true}}}}));
        assert!(out.sql.contains("NOT EXISTS"), "{}", out.sql);
        assert!(out.sql.contains("NOT (\"t1\".\"published\" = $1)"), "{}", out.sql);
    }

    #[test]
    fn many_to_many_relation_predicate_goes_through_the_junction_table() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::FindMany, json!({"where": {"tags": {"some": {"name": "rust"}}}}));
        assert!(out.sql.contains("FROM \"Tag\" \"t1\""), "{}", out.sql);
        assert!(out.sql.contains("EXISTS (SELECT 1\nFROM \"post_tag\" \"t2\""), "{}", out.sql);
        assert!(out.sql.contains("\"t1\".\"name\" = $1"), "{}", out.sql);
    }
}
