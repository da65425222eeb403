//! `create`/`update`/`delete`/`upsert` and their batch variants -> a single
//! INSERT/UPDATE/DELETE (spec §4.5/§4.13).
//!
//! Nested relation writes (`connect`/`create`/`upsert`/... on a
//! [`DataField::Relation`]) don't fit a single parameterized statement —
//! each implies its own round of reads and writes against the target model.
//! This emitter covers the scalar-field half of `data`; sequencing the
//! relation half across multiple statements is left to the caller (scoping
//! decision, recorded in DESIGN.md).

use sqlcraft_core::{BatchData, ConflictTarget as AstConflictTarget, Data, DataField, FieldDataOp, Query, Upsert, Value};
use sqlcraft_schema::{ModelRef, Registry, TypeTag};
use sqlcraft_sql::{
    BinOp, ColumnName, ConflictAction, ConflictTarget, DeleteStmt, Expr, InsertSelectStmt, InsertStmt, OnConflict,
    Stmt, TableName, Unnest, UpdateStmt,
};

use super::condition::emit_condition;
use super::{pg_type_for, Emitter};
use crate::{EmitError, EmitResult};

fn returning_all(model: ModelRef<'_>) -> Vec<ColumnName> {
    model.model.fields.values().map(|f| f.column().into()).collect()
}

/// Bind a `data` field's value, casting arrays and `json`/`jsonb` to their
/// PostgreSQL type the way `condition::bind_scalar`/`bind_array` do for
/// `where` values — but keyed on `Value::is_array` rather than a fixed
/// scalar-vs-array call site, since a field's own value may be either.
fn bind_field_value(emitter: &Emitter<'_>, value: &Value) -> Expr {
    let json: serde_json::Value = value.raw.clone().into();
    let param = emitter.bind(json);
    match pg_type_for(value.type_tag, value.is_array) {
        Some(ty) if value.is_array || value.type_tag == TypeTag::Json => param.cast(ty),
        _ => param,
    }
}

fn insert_columns(emitter: &Emitter<'_>, mut stmt: InsertStmt, data: &Data<'_>) -> EmitResult<InsertStmt> {
    for field in &data.fields {
        match field {
            DataField::Field { field_ref, op, value } => {
                if *op != FieldDataOp::Set {
                    return Err(EmitError::Invariant(format!(
                        "field operator {op:?} is only valid for update, not create"
                    )));
                }
                stmt = stmt.column(field_ref.field.column().into(), bind_field_value(emitter, value));
            }
            DataField::Relation { .. } => {}
        }
    }
    Ok(stmt)
}

pub(crate) fn emit_create(emitter: &Emitter<'_>, query: &Query<'_>, data: &Data<'_>) -> EmitResult<InsertStmt> {
    let model = query.model_ref;
    let stmt = InsertStmt::new(model.model.table().into());
    let stmt = insert_columns(emitter, stmt, data)?;
    Ok(stmt.returning(returning_all(model)))
}

fn assignment_expr(emitter: &Emitter<'_>, col: &ColumnName, op: FieldDataOp, value: &Value) -> Expr {
    let existing = || Expr::column(col.clone());
    let arith = |bin_op| Expr::BinOp { left: Box::new(existing()), op: bin_op, right: Box::new(bind_field_value(emitter, value)) };
    match op {
        FieldDataOp::Set => bind_field_value(emitter, value),
        FieldDataOp::Increment => arith(BinOp::Add),
        FieldDataOp::Decrement => arith(BinOp::Sub),
        FieldDataOp::Multiply => arith(BinOp::Mul),
        FieldDataOp::Divide => arith(BinOp::Div),
        FieldDataOp::Push => Expr::FnCall { name: "array_append".into(), args: vec![existing(), bind_field_value(emitter, value)] },
    }
}

fn update_assignments(emitter: &Emitter<'_>, mut stmt: UpdateStmt, data: &Data<'_>) -> UpdateStmt {
    for field in &data.fields {
        if let DataField::Field { field_ref, op, value } = field {
            let col: ColumnName = field_ref.field.column().into();
            let expr = assignment_expr(emitter, &col, *op, value);
            stmt = stmt.set(col, expr);
        }
    }
    stmt
}

pub(crate) fn emit_update(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>, data: &Data<'_>) -> EmitResult<UpdateStmt> {
    let model = query.model_ref;
    let table: TableName = model.model.table().into();
    let mut stmt = update_assignments(emitter, UpdateStmt::new(table.clone()), data);

    if let Some(where_) = &query.args.where_ {
        stmt = stmt.where_(emit_condition(emitter, registry, &table, where_)?);
    }
    Ok(stmt.returning(returning_all(model)))
}

pub(crate) fn emit_delete(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>) -> EmitResult<DeleteStmt> {
    let model = query.model_ref;
    let table: TableName = model.model.table().into();
    let mut stmt = DeleteStmt::new(table.clone());

    if let Some(where_) = &query.args.where_ {
        stmt = stmt.where_(emit_condition(emitter, registry, &table, where_)?);
    }
    Ok(stmt.returning(returning_all(model)))
}

/// `Upsert::conflict_target` -> the `sql` crate's [`ConflictTarget`]. Both a
/// named index and a named constraint resolve to `ON CONSTRAINT` — Postgres
/// has no separate "by bare index name" conflict-target syntax, and an
/// index backing a unique constraint shares the constraint's name.
fn conflict_target(target: &AstConflictTarget<'_>) -> ConflictTarget {
    match target {
        AstConflictTarget::Fields(fields) => {
            ConflictTarget::Columns(fields.iter().map(|f| f.field.column().into()).collect())
        }
        AstConflictTarget::Index(name) | AstConflictTarget::Constraint(name) => ConflictTarget::Constraint(name.clone()),
    }
}

pub(crate) fn emit_upsert(emitter: &Emitter<'_>, registry: &Registry, upsert: &Upsert<'_>) -> EmitResult<InsertStmt> {
    let model = upsert.model_ref;
    let stmt = InsertStmt::new(model.model.table().into());
    let stmt = insert_columns(emitter, stmt, &upsert.create_data)?;

    let mut update_stmt = update_assignments(emitter, UpdateStmt::new(model.model.table().into()), &upsert.update_data);
    let where_ = match &upsert.where_ {
        Some(cond) => Some(emit_condition(emitter, registry, &model.model.table().into(), cond)?),
        None => None,
    };
    // `update_stmt` only exists to reuse `update_assignments`'s per-field op
    // dispatch; its own `where_`/`table`/`returning` are discarded, only
    // `assignments` feeds the ON CONFLICT action.
    let _ = &mut update_stmt;

    let on_conflict = OnConflict {
        target: conflict_target(&upsert.conflict_target),
        action: ConflictAction::DoUpdate { assignments: update_stmt.assignments, where_ },
    };

    Ok(stmt.on_conflict(on_conflict).returning(returning_all(model)))
}

/// `createMany` as a single bulk `INSERT ... SELECT ... FROM UNNEST(...)`
/// (spec §4.13): one array parameter per column, row-aligned across `items`.
///
/// Array- and JSON-typed fields are excluded from the batch: `UNNEST` needs
/// one homogeneous array type per column, and a column of arrays (or of
/// jsonb values) would need a 2-D array parameter PostgreSQL's driver-level
/// array encoding doesn't give us here (scoping decision, DESIGN.md).
pub(crate) fn emit_create_many(emitter: &Emitter<'_>, batch: &BatchData<'_>) -> EmitResult<Stmt> {
    let model = batch.model_ref;
    let unnest_alias = emitter.next_alias();

    // Column order: the union of fields set across every item, in the order
    // first seen, so every row contributes `null` for a field it omits.
    let mut columns: Vec<(ColumnName, sqlcraft_schema::FieldRef<'_>)> = Vec::new();
    for item in &batch.items {
        for field in &item.fields {
            if let DataField::Field { field_ref, op, .. } = field {
                if *op != FieldDataOp::Set {
                    return Err(EmitError::Invariant(format!(
                        "field operator {op:?} is only valid for update, not createMany"
                    )));
                }
                if field_ref.field.is_array || field_ref.field.type_tag == TypeTag::Json {
                    return Err(EmitError::Invariant(format!(
                        "field `{}` is array/json-typed and can't be used in createMany",
                        field_ref.name
                    )));
                }
                if !columns.iter().any(|(col, _)| col.as_str() == field_ref.field.column()) {
                    columns.push((field_ref.field.column().into(), *field_ref));
                }
            }
        }
    }

    let mut unnest = Unnest::new(unnest_alias.clone());
    let mut insert_columns: Vec<(ColumnName, Expr)> = Vec::with_capacity(columns.len());

    for (col, field_ref) in &columns {
        let values: Vec<serde_json::Value> = batch
            .items
            .iter()
            .map(|item| {
                item.fields
                    .iter()
                    .find_map(|f| match f {
                        DataField::Field { field_ref: fr, value, .. } if fr.field.column() == field_ref.field.column() => {
                            Some(value.raw.clone().into())
                        }
                        _ => None,
                    })
                    .unwrap_or(serde_json::Value::Null)
            })
            .collect();

        let pg_type = pg_type_for(field_ref.field.type_tag, true)
            .ok_or_else(|| EmitError::Invariant(format!("field `{}` has no array-castable PostgreSQL type", field_ref.name)))?;
        let param_name: ColumnName = emitter.bind_name(serde_json::Value::Array(values)).into();

        unnest = unnest.param(param_name.clone(), pg_type);
        insert_columns.push((col.clone(), Expr::qualified_column(unnest_alias.clone(), param_name)));
    }

    let mut insert = InsertSelectStmt::new(model.model.table().into(), unnest);
    for (col, expr) in insert_columns {
        insert = insert.column(col, expr);
    }

    if batch.skip_duplicates {
        insert = insert.on_conflict(OnConflict { target: ConflictTarget::Any, action: ConflictAction::DoNothing });
    }
    insert = insert.returning(returning_all(model));

    Ok(Stmt::InsertSelect(insert))
}

pub(crate) fn emit_update_many(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>, batch: &BatchData<'_>) -> EmitResult<UpdateStmt> {
    let model = query.model_ref;
    let table: TableName = model.model.table().into();
    let data = batch.items.first().ok_or_else(|| EmitError::Invariant("updateMany requires one data payload".into()))?;
    let mut stmt = update_assignments(emitter, UpdateStmt::new(table.clone()), data);

    if let Some(where_) = &query.args.where_ {
        stmt = stmt.where_(emit_condition(emitter, registry, &table, where_)?);
    }
    Ok(stmt.returning(returning_all(model)))
}

pub(crate) fn emit_delete_many(emitter: &Emitter<'_>, registry: &Registry, query: &Query<'_>) -> EmitResult<DeleteStmt> {
    emit_delete(emitter, registry, query)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sqlcraft_core::Operation;

    use super::super::testutil::{emit, registry};

    const RETURNING: &str = "RETURNING \"id\", \"title\", \"content\", \"published\", \"authorId\", \"views\", \"metadata\"";

    #[test]
    fn create_binds_every_field_and_returns_the_whole_row() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::Create,
            json!({"data": {"authorId": 1, "published": false, "title": "Hello, World", "views": 0}}),
        );
        assert_eq!(
            out.sql,
            format!(
                "INSERT INTO \"Post\" (\"authorId\", \"published\", \"title\", \"views\")\nVALUES ($1, $2, $3, $4)\n{RETURNING}"
            )
        );
        assert_eq!(out.params, vec![json!(1), json!(false), json!("Hello, World"), json!(0)]);
    }

    #[test]
    fn create_rejects_a_field_operator_other_than_set() {
        let registry = registry();
        let input = sqlcraft_core::InputValue::from(json!({"data": {"views": {"increment": 1}}}));
        let query = sqlcraft_core::parse_query(&registry, "Post", Operation::Create, &input).unwrap();
        let dialect = crate::PostgresDialect;
        let err = crate::emit(&query, &registry, &dialect).unwrap_err();
        assert!(matches!(err, crate::EmitError::Invariant(_)));
    }

    #[test]
    fn update_increment_references_the_existing_column() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::Update,
            json!({"where": {"id": 1}, "data": {"views": {"increment": 5}}}),
        );
        assert_eq!(
            out.sql,
            format!("UPDATE \"Post\"\nSET \"views\" = \"views\" + $1\nWHERE \"Post\".\"id\" = $2\n{RETURNING}")
        );
        assert_eq!(out.params, vec![json!(5), json!(1)]);
    }

    #[test]
    fn update_plain_value_defaults_to_a_set_assignment() {
        let registry = registry();
        let out = emit(&registry, "Tag", Operation::Update, json!({"where": {"id": 1}, "data": {"name": "rust"}}));
        assert!(out.sql.contains("SET \"name\" = $1"), "{}", out.sql);
        assert_eq!(out.params[0], json!("rust"));
    }

    #[test]
    fn delete_emits_a_bare_delete_with_returning() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::Delete, json!({"where": {"id": 1}}));
        assert_eq!(out.sql, format!("DELETE FROM \"Post\"\nWHERE \"Post\".\"id\" = $1\n{RETURNING}"));
        assert_eq!(out.params, vec![json!(1)]);
    }

    #[test]
    fn upsert_infers_the_conflict_target_from_the_id_field_in_create() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::Upsert,
            json!({
                "create": {"id": 1, "authorId": 1, "published": true, "title": "Hi", "views": 0},
                "update": {"views": {"increment": 1}},
            }),
        );
        assert!(out.sql.starts_with(
            "INSERT INTO \"Post\" (\"authorId\", \"id\", \"published\", \"title\", \"views\")\nVALUES ($1, $2, $3, $4, $5)"
        ), "{}", out.sql);
        assert!(out.sql.contains("ON CONFLICT (\"id\") DO UPDATE SET \"views\" = \"views\" + $6"), "{}", out.sql);
        assert_eq!(out.params.last(), Some(&json!(1)));
    }

    #[test]
    fn create_many_unnests_one_array_parameter_per_column() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::CreateMany,
            json!({
                "data": [
                    {"authorId": 1, "published": true, "title": "A"},
                    {"authorId": 2, "title": "B"},
                ],
            }),
        );
        assert_eq!(
            out.sql,
            format!(
                "INSERT INTO \"Post\" (\"authorId\", \"published\", \"title\")\nSELECT \"t0\".\"p0\", \"t0\".\"p1\", \"t0\".\"p2\"\nFROM UNNEST($1::INTEGER[], $2::BOOLEAN[], $3::TEXT[]) AS \"t0\"(\"p0\", \"p1\", \"p2\")\n{RETURNING}"
            )
        );
        assert_eq!(out.params, vec![json!([1, 2]), json!([true, null]), json!(["A", "B"])]);
    }

    #[test]
    fn create_many_skip_duplicates_adds_a_targetless_on_conflict() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::CreateMany,
            json!({"data": [{"authorId": 1, "published": true, "title": "A"}], "skipDuplicates": true}),
        );
        assert!(out.sql.contains("\nON CONFLICT DO NOTHING\n"), "{}", out.sql);
    }

    #[test]
    fn create_many_rejects_json_typed_fields() {
        let registry = registry();
        let input = sqlcraft_core::InputValue::from(json!({"data": [{"metadata": {"a": 1}}]}));
        let query = sqlcraft_core::parse_query(&registry, "Post", Operation::CreateMany, &input).unwrap();
        let dialect = crate::PostgresDialect;
        let err = crate::emit(&query, &registry, &dialect).unwrap_err();
        assert!(matches!(err, crate::EmitError::Invariant(_)));
    }

    #[test]
    fn update_many_applies_one_payload_to_every_matched_row() {
        let registry = registry();
        let out = emit(
            &registry,
            "Post",
            Operation::UpdateMany,
            json!({"where": {"authorId": 1}, "data": {"published": false}}),
        );
        assert_eq!(
            out.sql,
            format!("UPDATE \"Post\"\nSET \"published\" = $1\nWHERE \"Post\".\"authorId\" = $2\n{RETURNING}")
        );
    }

    #[test]
    fn delete_many_shares_emit_delete_since_batch_data_carries_no_rows() {
        let registry = registry();
        let out = emit(&registry, "Post", Operation::DeleteMany, json!({"where": {"authorId": 1}}));
        assert_eq!(out.sql, format!("DELETE FROM \"Post\"\nWHERE \"Post\".\"authorId\" = $1\n{RETURNING}"));
    }
}
