//! Property tests for the determinism/idempotence guarantees named in the
//! "Correctness properties" scenarios:
//!
//!   1. emit(parse(m, op, a)) is byte-identical across runs given the same
//!      schema.
//!   7. Parsing the same input twice yields structurally equal ASTs.
//!   8. Reordering AND-children in `where` does not change the set of
//!      emitted conditions (only their textual order).
//!
//! These run against small, hand-built schemas and generated filter trees
//! rather than the full illustrative schema — the point is to exercise the
//! invariant over many shapes, not to re-cover the concrete scenarios
//! already in `end_to_end.rs`.

use proptest::prelude::*;
use serde_json::{json, Value as Json};
use sqlcraft::{Field, InputValue, Model, Operation, PostgresDialect, Registry, SchemaBuilder, TypeTag};

fn numeric_registry() -> Registry {
    let mut builder = SchemaBuilder::new();
    let row = Model::new("row")
        .field(Field::new("id", TypeTag::Int).id())
        .field(Field::new("a", TypeTag::Int))
        .field(Field::new("b", TypeTag::Int))
        .field(Field::new("c", TypeTag::Int))
        .field(Field::new("d", TypeTag::Int));
    builder.register_model("row", row).unwrap();
    builder.finalize().unwrap()
}

/// One `field = value` leaf of a generated `where` tree.
#[derive(Debug, Clone)]
struct Leaf {
    field: &'static str,
    value: i64,
}

fn leaf_strategy() -> impl Strategy<Value = Leaf> {
    (prop_oneof!["a", "b", "c", "d"], -1000i64..1000).prop_map(|(field, value)| Leaf { field, value })
}

fn where_clause(leaves: &[Leaf]) -> Json {
    let conditions: Vec<Json> = leaves.iter().map(|l| json!({l.field: l.value})).collect();
    json!({"AND": conditions})
}

/// Parse+emit `args` against `model` and `op`, panicking (with context) on
/// failure — property bodies only generate inputs that must parse cleanly.
fn compile(registry: &Registry, model: &str, op: Operation, args: Json) -> sqlcraft::Emitted {
    let input = InputValue::from(args.clone());
    let query = sqlcraft::parse(registry, model, op, &input).unwrap_or_else(|e| panic!("parse {args}: {e:?}"));
    sqlcraft::emit(&query, registry, &PostgresDialect).unwrap_or_else(|e| panic!("emit {args}: {e:?}"))
}

/// Every rendered `"row"."field" = $N` fragment, normalized by substituting
/// `$N` with the actual bound value so fragments compare equal regardless
/// of which parameter slot a condition landed in.
fn normalized_conditions(sql: &str, params: &[Json]) -> Vec<String> {
    let where_start = sql.find("WHERE ").expect("a WHERE clause").to_owned() + "WHERE ".len();
    let where_clause = &sql[where_start..];
    where_clause
        .split(" AND ")
        .map(|fragment| {
            let dollar = fragment.rfind('$').expect("a bound parameter");
            let idx: usize = fragment[dollar + 1..].parse().expect("a parameter index");
            let value = &params[idx - 1];
            format!("{}{value}", &fragment[..dollar])
        })
        .collect()
}

proptest! {
    /// Property 1: emitting the same parsed query twice produces byte-identical SQL and params.
    #[test]
    fn emit_is_deterministic(leaves in prop::collection::vec(leaf_strategy(), 1..5)) {
        let registry = numeric_registry();
        let args = where_clause(&leaves);

        let input = InputValue::from(args.clone());
        let query = sqlcraft::parse(&registry, "row", Operation::FindMany, &input).unwrap();
        let first = sqlcraft::emit(&query, &registry, &PostgresDialect).unwrap();
        let second = sqlcraft::emit(&query, &registry, &PostgresDialect).unwrap();

        prop_assert_eq!(first.sql, second.sql);
        prop_assert_eq!(first.params, second.params);
    }

    /// Property 7: parsing the same input twice and emitting both yields identical output —
    /// the AST `parse` builds has no hidden dependency on parse-call order or mutable state.
    #[test]
    fn parsing_the_same_input_twice_is_equivalent(leaves in prop::collection::vec(leaf_strategy(), 0..5)) {
        let registry = numeric_registry();
        let args = where_clause(&leaves);

        let out_a = compile(&registry, "row", Operation::FindMany, args.clone());
        let out_b = compile(&registry, "row", Operation::FindMany, args);

        prop_assert_eq!(out_a.sql, out_b.sql);
        prop_assert_eq!(out_a.params, out_b.params);
    }

    /// Property 8: shuffling the children of a top-level AND changes their textual
    /// order in the emitted SQL but not the set of conditions it expresses.
    #[test]
    fn and_reordering_preserves_the_condition_set(
        leaves in prop::collection::vec(leaf_strategy(), 2..6),
        shuffle_seed in prop::collection::vec(any::<u32>(), 2..6),
    ) {
        let registry = numeric_registry();

        let mut shuffled = leaves.clone();
        let seed = &shuffle_seed[..shuffled.len().min(shuffle_seed.len())];
        let mut keyed: Vec<(u32, Leaf)> = seed.iter().copied().zip(shuffled.drain(..)).collect();
        keyed.sort_by_key(|(k, _)| *k);
        let reordered: Vec<Leaf> = keyed.into_iter().map(|(_, l)| l).collect();

        let original = compile(&registry, "row", Operation::FindMany, where_clause(&leaves));
        let shuffled = compile(&registry, "row", Operation::FindMany, where_clause(&reordered));

        let mut original_conditions = normalized_conditions(&original.sql, &original.params);
        let mut shuffled_conditions = normalized_conditions(&shuffled.sql, &shuffled.params);
        original_conditions.sort();
        shuffled_conditions.sort();

        prop_assert_eq!(original_conditions, shuffled_conditions);
    }
}
