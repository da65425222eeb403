//! Concrete end-to-end scenarios and boundary behaviors, run through the
//! public `sqlcraft::parse`/`sqlcraft::emit` entry points against a small
//! `user`/`post`/`tag` schema (analogous to the one used in illustrative
//! scenario walkthroughs, with this renderer's actual output conventions —
//! no `AS` keyword on `FROM`/`JOIN`, `COUNT(t.*)` rather than `COUNT(*)`,
//! uppercase cast suffixes).

use serde_json::json;
use sqlcraft::{
    Field, InputValue, Model, Operation, ParseErrorKind, PostgresDialect, Registry, Relation, RelationKind,
    SchemaBuilder, TypeTag,
};

fn registry() -> Registry {
    let mut builder = SchemaBuilder::new();

    let user = Model::new("user")
        .field(Field::new("id", TypeTag::String).id())
        .field(Field::new("name", TypeTag::String))
        .field(Field::new("age", TypeTag::Int))
        .field(Field::new("salary", TypeTag::Int))
        .field(Field::new("department", TypeTag::String))
        .field(Field::new("isActive", TypeTag::Boolean))
        .field(Field::new("createdAt", TypeTag::DateTime))
        .relation(Relation::new("posts", RelationKind::OneToMany, "post").ref_field("userId"));
    builder.register_model("user", user).unwrap();

    let post = Model::new("post")
        .field(Field::new("id", TypeTag::String).id())
        .field(Field::new("title", TypeTag::String))
        .field(Field::new("userId", TypeTag::String))
        .relation(Relation::new("author", RelationKind::ManyToOne, "user").on_field("userId"))
        .relation(Relation::new("tags", RelationKind::ManyToMany, "tag").junction_table("post_tags"));
    builder.register_model("post", post).unwrap();

    let tag = Model::new("tag")
        .field(Field::new("id", TypeTag::String).id())
        .field(Field::new("name", TypeTag::String))
        .relation(Relation::new("posts", RelationKind::ManyToMany, "post").junction_table("post_tags"));
    builder.register_model("tag", tag).unwrap();

    builder.finalize().unwrap()
}

fn run(registry: &Registry, model: &str, op: Operation, args: serde_json::Value) -> sqlcraft::Emitted {
    let input = InputValue::from(args);
    let query = sqlcraft::parse(registry, model, op, &input).expect("parse");
    sqlcraft::emit(&query, registry, &PostgresDialect).expect("emit")
}

// E1
#[test]
fn e1_bare_count_has_no_where_clause() {
    let registry = registry();
    let out = run(&registry, "user", Operation::Count, json!({}));
    assert_eq!(out.sql, "SELECT COUNT(\"t0\".*) AS \"_count\"\nFROM \"user\" \"t0\"");
    assert!(out.params.is_empty());
}

// E2
#[test]
fn e2_count_with_a_where_clause_binds_one_param() {
    let registry = registry();
    let out = run(&registry, "user", Operation::Count, json!({"where": {"isActive": true}}));
    assert_eq!(
        out.sql,
        "SELECT COUNT(\"t0\".*) AS \"_count\"\nFROM \"user\" \"t0\"\nWHERE \"t0\".\"isActive\" = $1"
    );
    assert_eq!(out.params, vec![json!(true)]);
}

// E3
#[test]
fn e3_aggregate_emits_count_sum_and_avg_columns() {
    let registry = registry();
    let out = run(
        &registry,
        "user",
        Operation::Aggregate,
        json!({"_count": {"_all": true}, "_sum": {"salary": true}, "_avg": {"age": true}}),
    );
    assert_eq!(
        out.sql,
        "SELECT COUNT(\"t0\".*) AS \"_count\", avg(\"t0\".\"age\") AS \"_avg_age\", sum(\"t0\".\"salary\") AS \"_sum_salary\"\nFROM \"user\" \"t0\""
    );
    assert!(out.params.is_empty());
}

// E4
#[test]
fn e4_group_by_filters_groups_and_orders_by_the_count() {
    let registry = registry();
    let out = run(
        &registry,
        "user",
        Operation::GroupBy,
        json!({
            "by": ["department"],
            "_count": {"_all": true},
            "_sum": {"salary": true},
            "where": {"isActive": true},
            "orderBy": {"_count": "desc"},
        }),
    );
    assert!(out.sql.contains("SELECT \"t0\".\"department\" AS \"department\", COUNT(\"t0\".*) AS \"_count\""), "{}", out.sql);
    assert!(out.sql.contains("WHERE \"t0\".\"isActive\" = $1"), "{}", out.sql);
    assert!(out.sql.contains("GROUP BY \"t0\".\"department\""), "{}", out.sql);
    assert!(out.sql.contains("ORDER BY \"_count\" DESC"), "{}", out.sql);
    assert_eq!(out.params, vec![json!(true)]);
}

// E5
#[test]
fn e5_one_to_many_include_wraps_a_json_array_agg_subquery() {
    let registry = registry();
    let out = run(&registry, "user", Operation::FindMany, json!({"include": {"posts": true}}));
    assert!(out.sql.contains("\"posts\""), "{}", out.sql);
    assert!(out.sql.contains("json_agg(row_to_json(t1))"), "{}", out.sql);
    assert!(out.sql.contains("FROM \"post\" \"t1\""), "{}", out.sql);
    assert!(out.sql.contains("\"t0\".\"id\" = \"t1\".\"userId\""), "{}", out.sql);
}

// E6
#[test]
fn e6_many_to_many_include_emits_an_exists_over_the_junction_table() {
    let registry = registry();
    let out = run(&registry, "post", Operation::FindMany, json!({"include": {"tags": true}}));
    assert!(out.sql.contains("\"tags\""), "{}", out.sql);
    assert!(out.sql.contains("FROM \"post_tags\""), "{}", out.sql);
    assert!(out.sql.contains("EXISTS (SELECT 1"), "{}", out.sql);
}

// Boundary behavior 9
#[test]
fn empty_where_yields_no_where_clause() {
    let registry = registry();
    let out = run(&registry, "user", Operation::FindMany, json!({"where": {}}));
    assert_eq!(out.sql, "SELECT \"t0\".*\nFROM \"user\" \"t0\"");
}

// Boundary behavior 10
#[test]
fn find_unique_without_where_is_missing_required() {
    let registry = registry();
    let input = InputValue::from(json!({}));
    let err = sqlcraft::parse(&registry, "user", Operation::FindUnique, &input).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::MissingRequired { .. }), "{:?}", err.kind);
}

#[test]
fn delete_without_where_is_missing_required() {
    let registry = registry();
    let input = InputValue::from(json!({}));
    let err = sqlcraft::parse(&registry, "user", Operation::Delete, &input).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::MissingRequired { .. }), "{:?}", err.kind);
}

// Boundary behavior 11
#[test]
fn cursor_with_two_keys_is_wrong_cardinality() {
    let registry = registry();
    let input = InputValue::from(json!({"cursor": {"id": "u1", "name": "a"}}));
    let err = sqlcraft::parse(&registry, "user", Operation::FindMany, &input).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::WrongCardinality { .. }), "{:?}", err.kind);
}

#[test]
fn cursor_with_zero_keys_is_wrong_cardinality() {
    let registry = registry();
    let input = InputValue::from(json!({"cursor": {}}));
    let err = sqlcraft::parse(&registry, "user", Operation::FindMany, &input).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::WrongCardinality { .. }), "{:?}", err.kind);
}

// Boundary behavior 12
#[test]
fn avg_on_a_non_numeric_field_is_a_type_mismatch() {
    let registry = registry();
    let input = InputValue::from(json!({"_avg": {"name": true}}));
    let err = sqlcraft::parse(&registry, "user", Operation::Aggregate, &input).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::TypeMismatch { .. }), "{:?}", err.kind);
}

// Boundary behavior 4 (alias uniqueness): every `FROM` an include opens
// (the outer scope, a direct-join relation, a many-to-many relation, and its
// junction-table EXISTS) gets its own table alias, even with two sibling
// includes in play.
#[test]
fn sibling_includes_never_reuse_a_table_alias() {
    let registry = registry();
    let out = run(&registry, "post", Operation::FindMany, json!({"include": {"tags": true, "author": true}}));

    assert!(out.sql.contains("FROM \"post\" \"t0\""), "{}", out.sql);
    assert!(out.sql.contains("FROM \"user\" \"t1\""), "{}", out.sql);
    assert!(out.sql.contains("FROM \"tag\" \"t2\""), "{}", out.sql);
    assert!(out.sql.contains("FROM \"post_tags\" \"t3\""), "{}", out.sql);
}

// Boundary behavior 2 (parameter safety): a value containing SQL-special
// characters is bound, never concatenated into the text.
#[test]
fn a_value_with_quotes_is_bound_not_inlined() {
    let registry = registry();
    let out = run(&registry, "user", Operation::FindMany, json!({"where": {"name": "O'Brien\"; DROP TABLE user;--"}}));
    assert!(!out.sql.contains("O'Brien"), "{}", out.sql);
    assert_eq!(out.params, vec![json!("O'Brien\"; DROP TABLE user;--")]);
}
