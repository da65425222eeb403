//! Shared schema fixture and parse+emit helpers for the `emit` test modules.

use sqlcraft_core::{InputValue, Operation};
use sqlcraft_schema::{Field, Model, Registry, Relation, RelationKind, SchemaBuilder, TypeTag};

use crate::PostgresDialect;

/// `User`/`Post`/`Tag` with a `oneToMany`/`manyToOne` pair (`User.posts` /
/// `Post.author`) and a `manyToMany` pair (`Post.tags` / `Tag.posts`), wired
/// up the way a schema with a self-contained blog domain would be.
pub(crate) fn registry() -> Registry {
    let mut builder = SchemaBuilder::new();

    let user = Model::new("User")
        .field(Field::new("id", TypeTag::Int).id().auto())
        .field(Field::new("name", TypeTag::String))
        .field(Field::new("email", TypeTag::String).unique())
        .field(Field::new("age", TypeTag::Int).nullable())
        .relation(Relation::new("posts", RelationKind::OneToMany, "Post").ref_field("authorId"));
    builder.register_model("User", user).unwrap();

    let post = Model::new("Post")
        .field(Field::new("id", TypeTag::Int).id().auto())
        .field(Field::new("title", TypeTag::String))
        .field(Field::new("content", TypeTag::String).nullable())
        .field(Field::new("published", TypeTag::Boolean))
        .field(Field::new("authorId", TypeTag::Int))
        .field(Field::new("views", TypeTag::Int))
        .field(Field::new("metadata", TypeTag::Json).nullable())
        .relation(Relation::new("author", RelationKind::ManyToOne, "User").on_field("authorId"))
        .relation(Relation::new("tags", RelationKind::ManyToMany, "Tag").junction_table("post_tag"));
    builder.register_model("Post", post).unwrap();

    let tag = Model::new("Tag")
        .field(Field::new("id", TypeTag::Int).id().auto())
        .field(Field::new("name", TypeTag::String).unique())
        .relation(Relation::new("posts", RelationKind::ManyToMany, "Post").junction_table("post_tag"));
    builder.register_model("Tag", tag).unwrap();

    builder.finalize().unwrap()
}

/// Parse `args` (a `serde_json::json!` value) for `operation` against
/// `model`, then emit it against [`PostgresDialect`]. Panics on parse or
/// emit failure — tests assert on the happy path unless named otherwise.
pub(crate) fn emit(registry: &Registry, model: &str, operation: Operation, args: serde_json::Value) -> crate::Emitted {
    let input = InputValue::from(args);
    let query = sqlcraft_core::parse_query(registry, model, operation, &input).expect("parse");
    crate::emit(&query, registry, &PostgresDialect).expect("emit")
}
