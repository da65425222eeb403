//! The Field Resolver (spec §4.3): resolves names and dotted paths to field
//! or relation references.

use crate::error::{ParseError, ParseErrorKind};
use sqlcraft_schema::{FieldRef, ModelRef, Registry, RelationRef};

/// Either a field or a relation reference, as returned by path resolution.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedRef<'a> {
    Field(FieldRef<'a>),
    Relation(RelationRef<'a>),
}

pub fn resolve_field<'a>(
    registry: &'a Registry,
    model: ModelRef<'a>,
    name: &str,
) -> Result<FieldRef<'a>, ParseError> {
    registry.get_field(model, name).map_err(Into::into)
}

pub fn resolve_relation<'a>(
    registry: &'a Registry,
    model: ModelRef<'a>,
    name: &str,
) -> Result<RelationRef<'a>, ParseError> {
    registry.get_relation(model, name).map_err(Into::into)
}

/// Resolve `name` against `model` as a field first, then a relation.
/// Failing both raises `unknown-field-or-relation`.
pub fn resolve_field_or_relation<'a>(
    registry: &'a Registry,
    model: ModelRef<'a>,
    name: &str,
) -> Result<ResolvedRef<'a>, ParseError> {
    if let Ok(field) = registry.get_field(model, name) {
        return Ok(ResolvedRef::Field(field));
    }
    if let Ok(relation) = registry.get_relation(model, name) {
        return Ok(ResolvedRef::Relation(relation));
    }
    Err(ParseError::new(ParseErrorKind::UnknownFieldOrRelation {
        model: model.name.to_string(),
        name: name.to_string(),
    }))
}

/// Walk `path` through `model`: every segment but the last must resolve to a
/// relation (stepping into its target model); the last segment may be either
/// a field or a relation. An empty path is rejected.
pub fn resolve_path<'a>(
    registry: &'a Registry,
    model: ModelRef<'a>,
    path: &[&str],
) -> Result<ResolvedRef<'a>, ParseError> {
    let Some((last, hops)) = path.split_last() else {
        return Err(ParseError::new(ParseErrorKind::WrongCardinality {
            reason: "path must have at least one segment".to_string(),
        }));
    };

    let mut current = model;
    for hop in hops {
        if hop.is_empty() {
            return Err(ParseError::new(ParseErrorKind::WrongCardinality {
                reason: "path segments must be non-empty".to_string(),
            }));
        }
        let relation = resolve_relation(registry, current, hop)?;
        current = relation.target(registry)?;
    }

    if last.is_empty() {
        return Err(ParseError::new(ParseErrorKind::WrongCardinality {
            reason: "path segments must be non-empty".to_string(),
        }));
    }
    resolve_field_or_relation(registry, current, last)
}
