//! Join-predicate derivation shared by `where`/`having` relation conditions
//! ([`super::condition`]) and relation subquery columns ([`super::select`]).
//!
//! Resolution of [`Relation::on_field`]/[`Relation::ref_field`] (an Open
//! Question left unresolved by the distilled spec): both are always read
//! relative to the model that *owns* the [`RelationRef`] — `on_field` names
//! a field on that model, `ref_field` a field on the relation's target —
//! regardless of which side of a one-to-many pair is being walked. Each
//! direction of a relation is registered as its own [`Relation`] entry with
//! its own `on_field`/`ref_field`, so this holds uniformly; it mirrors how a
//! schema typically declares both directions of a foreign key explicitly
//! rather than inferring one from the other.
//!
//! `manyToMany` junction column names are not stored per-side in the schema
//! (only a single `junction_field` is exposed), so this derives them by
//! convention: `{model.table()}_id` for each side, unless `junction_field`
//! overrides the owning side's column. Documented as a scoping decision in
//! `DESIGN.md`.

use sqlcraft_schema::{ModelRef, RelationKind, RelationRef, Registry};
use sqlcraft_sql::{Expr, FromClause, SelectColumn, SelectStmt, TableName};

use crate::{EmitError, EmitResult};
use crate::emit::Emitter;

fn id_column<'a>(model: ModelRef<'a>) -> EmitResult<&'a str> {
    model
        .model
        .id_field()
        .map(|f| f.column())
        .ok_or_else(|| EmitError::Invariant(format!("model `{}` has no id field", model.name)))
}

/// The join predicate for a `oneToOne`/`oneToMany`/`manyToOne` relation:
/// `outer_alias.on_field = inner_alias.ref_field`, defaulting each side's
/// field to its model's id field when the relation doesn't name one.
fn direct_join_predicate(
    registry: &Registry,
    outer_alias: &TableName,
    inner_alias: &TableName,
    relation_ref: RelationRef<'_>,
    target: ModelRef<'_>,
) -> EmitResult<Expr> {
    let relation = relation_ref.relation;

    let owner_field = match &relation.on_field {
        Some(name) => registry.get_field(relation_ref.owner, name)?,
        None => {
            let name = relation_ref.owner.model.id_field().map(|f| f.name.clone()).ok_or_else(|| {
                EmitError::Invariant(format!("relation `{}` has no on_field and owner has no id field", relation_ref.name))
            })?;
            registry.get_field(relation_ref.owner, &name)?
        }
    };
    let target_field = match &relation.ref_field {
        Some(name) => registry.get_field(target, name)?,
        None => {
            let name = target.model.id_field().map(|f| f.name.clone()).ok_or_else(|| {
                EmitError::Invariant(format!("relation `{}` has no ref_field and target has no id field", relation_ref.name))
            })?;
            registry.get_field(target, &name)?
        }
    };

    Ok(Expr::qualified_column(outer_alias.clone(), owner_field.field.column().into())
        .eq(Expr::qualified_column(inner_alias.clone(), target_field.field.column().into())))
}

fn junction_column_for(model: ModelRef<'_>) -> String {
    format!("{}_id", model.model.table())
}

/// The predicate for a `manyToMany` relation: an `EXISTS` over the junction
/// table correlating both the outer row and the candidate inner row.
fn many_to_many_predicate(
    emitter: &Emitter<'_>,
    outer_alias: &TableName,
    inner_alias: &TableName,
    relation_ref: RelationRef<'_>,
    target: ModelRef<'_>,
) -> EmitResult<Expr> {
    let junction_alias = emitter.next_alias();
    let owner_id = id_column(relation_ref.owner)?;
    let target_id = id_column(target)?;
    let owner_col = relation_ref.relation.junction_field.clone().unwrap_or_else(|| junction_column_for(relation_ref.owner));
    let target_col = junction_column_for(target);

    let pred = Expr::qualified_column(junction_alias.clone(), owner_col.into())
        .eq(Expr::qualified_column(outer_alias.clone(), owner_id.into()))
        .and(
            Expr::qualified_column(junction_alias.clone(), target_col.into())
                .eq(Expr::qualified_column(inner_alias.clone(), target_id.into())),
        );

    let junction_select = SelectStmt::new()
        .columns([SelectColumn::expr(Expr::Int(1))])
        .from(FromClause::aliased(relation_ref.junction_table().into(), junction_alias))
        .where_(pred);

    Ok(Expr::exists(junction_select))
}

/// The full predicate correlating `inner_alias` (a candidate row of the
/// relation's target table) to `outer_alias` (the current row), for either a
/// `where`/`having` relation condition or a relation subquery's own `WHERE`.
pub(crate) fn relation_predicate(
    emitter: &Emitter<'_>,
    registry: &Registry,
    outer_alias: &TableName,
    inner_alias: &TableName,
    relation_ref: RelationRef<'_>,
    target: ModelRef<'_>,
) -> EmitResult<Expr> {
    match relation_ref.relation.kind {
        RelationKind::ManyToMany => many_to_many_predicate(emitter, outer_alias, inner_alias, relation_ref, target),
        RelationKind::OneToOne | RelationKind::OneToMany | RelationKind::ManyToOne => {
            direct_join_predicate(registry, outer_alias, inner_alias, relation_ref, target)
        }
    }
}

/// Whether a relation's subquery should aggregate to a JSON array
/// (`oneToMany`/`manyToMany`) or a single JSON object (`oneToOne`/`manyToOne`).
pub(crate) fn is_to_many(kind: RelationKind) -> bool {
    matches!(kind, RelationKind::OneToMany | RelationKind::ManyToMany)
}
