use thiserror::Error;

/// Structural errors raised while registering or resolving the model graph.
///
/// Each variant carries the names involved rather than a pre-formatted
/// message, so callers can match on them or re-render them as needed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("model `{model}` is already registered")]
    DuplicateModel { model: String },

    #[error("model `{model}` not found")]
    ModelNotFound { model: String },

    #[error("field `{field}` not found on model `{model}`")]
    FieldNotFound { model: String, field: String },

    #[error("relation `{relation}` not found on model `{model}`")]
    RelationNotFound { model: String, relation: String },

    #[error("relation `{relation}` targets unregistered model `{target}`")]
    TargetModelUnavailable { relation: String, target: String },

    #[error("field `{field}` on model `{model}` is marked as id but is nullable or an array")]
    InvalidIdField { model: String, field: String },

    #[error("model `{model}` declares `{name}` as both a field and a relation")]
    AmbiguousFieldOrRelation { model: String, name: String },
}
