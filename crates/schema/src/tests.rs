use super::*;

fn user_model() -> Model {
    Model::new("User")
        .field(Field::new("id", TypeTag::Int).id().auto())
        .field(Field::new("email", TypeTag::String).unique())
        .field(Field::new("name", TypeTag::String).nullable())
        .relation(Relation::new("posts", RelationKind::OneToMany, "Post").ref_field("authorId"))
}

fn post_model() -> Model {
    Model::new("Post")
        .field(Field::new("id", TypeTag::Int).id().auto())
        .field(Field::new("authorId", TypeTag::Int))
        .field(Field::new("title", TypeTag::String))
        .relation(Relation::new("author", RelationKind::ManyToOne, "User").on_field("authorId"))
        .relation(Relation::new("tags", RelationKind::ManyToMany, "Tag"))
}

fn tag_model() -> Model {
    Model::new("Tag")
        .field(Field::new("id", TypeTag::Int).id().auto())
        .field(Field::new("name", TypeTag::String).unique())
        .relation(Relation::new("posts", RelationKind::ManyToMany, "Post"))
}

#[test]
fn duplicate_model_name_rejected() {
    let mut builder = SchemaBuilder::new();
    builder.register_model("User", user_model()).unwrap();
    let err = builder.register_model("User", Model::new("User")).unwrap_err();
    assert_eq!(err, SchemaError::DuplicateModel { model: "User".to_string() });
}

#[test]
fn relations_may_forward_reference_unregistered_models() {
    // Post.author targets User, but User is registered after Post: this must
    // not fail at registration time, only at finalize if still unresolved.
    let mut builder = SchemaBuilder::new();
    builder.register_model("Post", post_model()).unwrap();
    builder.register_model("User", user_model()).unwrap();
    builder.register_model("Tag", tag_model()).unwrap();
    builder.finalize().expect("forward references resolve at finalize");
}

#[test]
fn finalize_rejects_dangling_relation_target() {
    let mut builder = SchemaBuilder::new();
    builder.register_model("Post", post_model()).unwrap();
    // User and Tag never registered.
    let err = builder.finalize().unwrap_err();
    assert_eq!(
        err,
        SchemaError::TargetModelUnavailable { relation: "author".to_string(), target: "User".to_string() }
    );
}

#[test]
fn finalize_rejects_nullable_id_field() {
    let mut builder = SchemaBuilder::new();
    builder
        .register_model("Bad", Model::new("Bad").field(Field::new("id", TypeTag::Int).id().nullable()))
        .unwrap();
    let err = builder.finalize().unwrap_err();
    assert_eq!(err, SchemaError::InvalidIdField { model: "Bad".to_string(), field: "id".to_string() });
}

#[test]
fn finalize_rejects_a_field_and_relation_sharing_a_name() {
    let mut builder = SchemaBuilder::new();
    builder
        .register_model(
            "Bad",
            Model::new("Bad")
                .field(Field::new("id", TypeTag::Int).id().auto())
                .field(Field::new("posts", TypeTag::String))
                .relation(Relation::new("posts", RelationKind::OneToMany, "Post").ref_field("authorId")),
        )
        .unwrap();
    builder.register_model("Post", post_model()).unwrap();
    let err = builder.finalize().unwrap_err();
    assert_eq!(err, SchemaError::AmbiguousFieldOrRelation { model: "Bad".to_string(), name: "posts".to_string() });
}

#[test]
fn many_to_many_junction_table_defaults_to_sorted_model_names() {
    let mut builder = SchemaBuilder::new();
    builder.register_model("Post", post_model()).unwrap();
    builder.register_model("User", user_model()).unwrap();
    builder.register_model("Tag", tag_model()).unwrap();
    let registry = builder.finalize().unwrap();

    let post = registry.get_model("Post").unwrap();
    let tags = registry.get_relation(post, "tags").unwrap();
    assert_eq!(tags.junction_table(), "post_tag");

    let tag = registry.get_model("Tag").unwrap();
    let posts = registry.get_relation(tag, "posts").unwrap();
    assert_eq!(posts.junction_table(), "post_tag");
}

#[test]
fn explicit_junction_table_overrides_default() {
    let mut builder = SchemaBuilder::new();
    builder
        .register_model(
            "Post",
            Model::new("Post")
                .field(Field::new("id", TypeTag::Int).id().auto())
                .relation(
                    Relation::new("tags", RelationKind::ManyToMany, "Tag").junction_table("post_tags_map"),
                ),
        )
        .unwrap();
    builder.register_model("Tag", tag_model()).unwrap();
    let registry = builder.finalize().unwrap();

    let post = registry.get_model("Post").unwrap();
    let tags = registry.get_relation(post, "tags").unwrap();
    assert_eq!(tags.junction_table(), "post_tags_map");
}

#[test]
fn field_ref_and_relation_ref_round_trip() {
    let mut builder = SchemaBuilder::new();
    builder.register_model("User", user_model()).unwrap();
    builder.register_model("Post", post_model()).unwrap();
    builder.register_model("Tag", tag_model()).unwrap();
    let registry = builder.finalize().unwrap();

    let email = registry.field_ref("User", "email").unwrap();
    assert_eq!(email.owner.name, "User");
    assert!(email.field.is_unique);

    let author = registry.relation_ref("Post", "author").unwrap();
    let target = author.target(&registry).unwrap();
    assert_eq!(target.name, "User");
}

#[test]
fn unknown_model_field_relation_lookups_error() {
    let mut builder = SchemaBuilder::new();
    builder.register_model("User", user_model()).unwrap();
    let registry = builder.finalize().unwrap();

    assert_eq!(
        registry.get_model("Missing").unwrap_err(),
        SchemaError::ModelNotFound { model: "Missing".to_string() }
    );

    let user = registry.get_model("User").unwrap();
    assert_eq!(
        registry.get_field(user, "missing").unwrap_err(),
        SchemaError::FieldNotFound { model: "User".to_string(), field: "missing".to_string() }
    );
    assert_eq!(
        registry.get_relation(user, "missing").unwrap_err(),
        SchemaError::RelationNotFound { model: "User".to_string(), relation: "missing".to_string() }
    );
}

#[test]
fn id_field_helper_finds_marked_field() {
    let model = user_model();
    let id = model.id_field().expect("User has an id field");
    assert_eq!(id.name, "id");
}

#[test]
fn type_tag_orderable_and_numeric_classification() {
    assert!(TypeTag::Int.is_orderable());
    assert!(TypeTag::Int.is_numeric());
    assert!(TypeTag::String.is_orderable());
    assert!(!TypeTag::String.is_numeric());
    assert!(!TypeTag::Json.is_orderable());
    assert!(!TypeTag::Boolean.is_numeric());
}
