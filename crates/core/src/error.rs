use sqlcraft_schema::SchemaError;
use thiserror::Error;

/// The single error type surfaced by every parser, with structured context
/// rather than a pre-formatted message.
///
/// One error kind, categorized by [`ParseErrorKind`]; `model`/`field`/
/// `operation`/`path` are filled in as they become available as the error
/// propagates back up through the orchestrator.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind}{}", context_suffix(.model, .field, .operation, .path))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub model: Option<String>,
    pub field: Option<String>,
    pub operation: Option<String>,
    pub path: Option<String>,
}

fn context_suffix(
    model: &Option<String>,
    field: &Option<String>,
    operation: &Option<String>,
    path: &Option<String>,
) -> String {
    let mut parts = Vec::new();
    if let Some(m) = model {
        parts.push(format!("model={m}"));
    }
    if let Some(f) = field {
        parts.push(format!("field={f}"));
    }
    if let Some(o) = operation {
        parts.push(format!("operation={o}"));
    }
    if let Some(p) = path {
        parts.push(format!("path={p}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl ParseError {
    pub fn new(kind: ParseErrorKind) -> Self {
        Self { kind, model: None, field: None, operation: None, path: None }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Prefix `path` with a batch item index, per §7's "per-item failures are
    /// wrapped with the item index prefix".
    pub fn with_item_index(mut self, index: usize) -> Self {
        let prefixed = match self.path.take() {
            Some(existing) => format!("[{index}].{existing}"),
            None => format!("[{index}]"),
        };
        self.path = Some(prefixed);
        self
    }
}

impl From<SchemaError> for ParseError {
    fn from(err: SchemaError) -> Self {
        let kind = match &err {
            SchemaError::ModelNotFound { model } => {
                ParseErrorKind::ModelNotFound { model: model.clone() }
            }
            SchemaError::FieldNotFound { model, field } => {
                ParseErrorKind::FieldNotFound { model: model.clone(), field: field.clone() }
            }
            SchemaError::RelationNotFound { model, relation } => {
                ParseErrorKind::RelationNotFound { model: model.clone(), relation: relation.clone() }
            }
            SchemaError::TargetModelUnavailable { relation, target } => {
                ParseErrorKind::TargetModelUnavailable { relation: relation.clone(), target: target.clone() }
            }
            SchemaError::DuplicateModel { .. } | SchemaError::InvalidIdField { .. } => {
                ParseErrorKind::InvalidObject { reason: err.to_string() }
            }
        };
        ParseError::new(kind)
    }
}

/// Error categories, matching §7: Schema, Shape, Operator, Type, Upsert, Batch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseErrorKind {
    // Schema
    #[error("model `{model}` not found")]
    ModelNotFound { model: String },
    #[error("field `{field}` not found on model `{model}`")]
    FieldNotFound { model: String, field: String },
    #[error("relation `{relation}` not found on model `{model}`")]
    RelationNotFound { model: String, relation: String },
    #[error("relation `{relation}` targets unavailable model `{target}`")]
    TargetModelUnavailable { relation: String, target: String },
    #[error("`{model}` has no field or relation named `{name}`")]
    UnknownFieldOrRelation { model: String, name: String },

    // Shape
    #[error("expected an object: {reason}")]
    InvalidObject { reason: String },
    #[error("expected an array: {reason}")]
    InvalidArray { reason: String },
    #[error("missing required argument `{argument}`")]
    MissingRequired { argument: String },
    #[error("wrong cardinality: {reason}")]
    WrongCardinality { reason: String },

    // Operator
    #[error("unknown operator `{operator}`, known operators: {known}")]
    UnknownOperator { operator: String, known: String },
    #[error("operator `{operator}` used with the wrong shape: {reason}")]
    WrongOperatorShape { operator: String, reason: String },
    #[error("`in`/`notIn` require an array value")]
    InNotInRequiresArray,

    // Type
    #[error("type mismatch: expected `{expected}`, got `{got}`")]
    TypeMismatch { expected: String, got: String },
    #[error("array contains elements of mixed types")]
    MixedArrayTypes,
    #[error("field `{field}` is not orderable, cannot be used as a cursor")]
    NotOrderableCursorField { field: String },

    // Upsert
    #[error("no conflict target given and none could be inferred")]
    NoConflictTarget,
    #[error("invalid conflict target: {reason}")]
    BadConflictTarget { reason: String },
}
