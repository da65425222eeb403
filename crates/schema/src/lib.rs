//! The Schema Registry: a resolved, cross-referenced model graph.
//!
//! Mirrors the split the teacher draws between raw registration and a
//! finalized, cross-linked graph: callers build up a [`SchemaBuilder`] by
//! calling [`SchemaBuilder::register_model`] in any order (relations may name
//! models that haven't been registered yet — that's what makes cyclic model
//! graphs possible), then call [`SchemaBuilder::finalize`] once, which
//! cross-links every relation and hands back an immutable, freely-shareable
//! [`Registry`].

use indexmap::IndexMap;
use std::sync::OnceLock;

mod error;
pub use error::SchemaError;

#[cfg(test)]
mod tests;

/// Stable index of a model within a finalized [`Registry`].
///
/// Only meaningful relative to the `Registry` that produced it; stable for
/// the lifetime of that registry since it never mutates after `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub(crate) u32);

/// The scalar/structural type of a field, independent of any SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Int,
    BigInt,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Json,
    Blob,
    Vector,
    Enum,
    Null,
}

impl TypeTag {
    /// Whether values of this type support ordering (`<`, `>`, hence `ORDER BY`
    /// and cursor pagination).
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            TypeTag::String
                | TypeTag::Int
                | TypeTag::BigInt
                | TypeTag::Float
                | TypeTag::Decimal
                | TypeTag::DateTime
        )
    }

    /// Whether `_avg`/`_sum` aggregates are meaningful for this type.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeTag::Int | TypeTag::BigInt | TypeTag::Float | TypeTag::Decimal
        )
    }
}

/// A scalar or array column of a model.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub column_name: Option<String>,
    pub type_tag: TypeTag,
    pub is_array: bool,
    pub is_nullable: bool,
    pub is_id: bool,
    pub is_unique: bool,
    pub default: Option<String>,
    pub auto: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            column_name: None,
            type_tag,
            is_array: false,
            is_nullable: false,
            is_id: false,
            is_unique: false,
            default: None,
            auto: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self.is_nullable = false;
        self.is_array = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = Some(name.into());
        self
    }

    pub fn auto(mut self) -> Self {
        self.auto = true;
        self
    }

    /// The physical column name: `column_name` if set, else `name`.
    pub fn column(&self) -> &str {
        self.column_name.as_deref().unwrap_or(&self.name)
    }
}

/// The cardinality of a typed edge between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// A typed edge between two models.
///
/// `target_name` is recorded verbatim at registration time — the target
/// model doesn't need to exist yet, which is what makes cyclic model graphs
/// possible — and resolved to a [`ModelId`] on first use, memoized in
/// `target_id`. [`SchemaBuilder::finalize`] forces that resolution for every
/// relation up front so a finalized registry never surfaces a dangling
/// target.
#[derive(Debug)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    target_name: String,
    target_id: OnceLock<ModelId>,
    junction_table_default: OnceLock<String>,
    pub on_field: Option<String>,
    pub ref_field: Option<String>,
    pub junction_table: Option<String>,
    pub junction_field: Option<String>,
    pub cascade_on_delete: bool,
    pub cascade_on_update: bool,
}

impl Relation {
    pub fn new(name: impl Into<String>, kind: RelationKind, target_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target_name: target_name.into(),
            target_id: OnceLock::new(),
            junction_table_default: OnceLock::new(),
            on_field: None,
            ref_field: None,
            junction_table: None,
            junction_field: None,
            cascade_on_delete: false,
            cascade_on_update: false,
        }
    }

    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.on_field = Some(field.into());
        self
    }

    pub fn ref_field(mut self, field: impl Into<String>) -> Self {
        self.ref_field = Some(field.into());
        self
    }

    pub fn junction_table(mut self, table: impl Into<String>) -> Self {
        self.junction_table = Some(table.into());
        self
    }

    pub fn junction_field(mut self, field: impl Into<String>) -> Self {
        self.junction_field = Some(field.into());
        self
    }

    pub fn cascade_on_delete(mut self) -> Self {
        self.cascade_on_delete = true;
        self
    }

    pub fn cascade_on_update(mut self) -> Self {
        self.cascade_on_update = true;
        self
    }

    /// The name of the target model, as given at registration time.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Resolve (and memoize) the target model's id against `registry`.
    ///
    /// `Registry::finalize` calls this eagerly for every relation; harmless
    /// to call again afterwards since it's idempotent.
    fn resolve_target_id(&self, registry: &Registry) -> Result<ModelId, SchemaError> {
        if let Some(id) = self.target_id.get() {
            return Ok(*id);
        }
        let id = registry
            .models
            .get_index_of(self.target_name.as_str())
            .map(|idx| ModelId(idx as u32))
            .ok_or_else(|| SchemaError::TargetModelUnavailable {
                relation: self.name.clone(),
                target: self.target_name.clone(),
            })?;
        // `OnceLock::set` losing a race (e.g. concurrent callers resolving the
        // same relation for the first time) is fine: the value is identical.
        let _ = self.target_id.set(id);
        Ok(id)
    }
}

/// A named table-like entity with fields and relations.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub table_name: Option<String>,
    pub fields: IndexMap<String, Field>,
    pub relations: IndexMap<String, Relation>,
    pub indexes: Vec<Vec<String>>,
    pub uniques: Vec<Vec<String>>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            fields: IndexMap::new(),
            relations: IndexMap::new(),
            indexes: Vec::new(),
            uniques: Vec::new(),
        }
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// The physical table name: `table_name` if set, else `name`.
    pub fn table(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    pub fn index(mut self, fields: Vec<String>) -> Self {
        self.indexes.push(fields);
        self
    }

    pub fn unique(mut self, fields: Vec<String>) -> Self {
        self.uniques.push(fields);
        self
    }

    /// The first field marked `is_id`, if any.
    pub fn id_field(&self) -> Option<&Field> {
        self.fields.values().find(|f| f.is_id)
    }
}

/// A lightweight, non-owning handle to a registered model.
#[derive(Debug, Clone, Copy)]
pub struct ModelRef<'a> {
    pub name: &'a str,
    pub model: &'a Model,
}

/// A lightweight, non-owning handle to a field plus the model that owns it.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub name: &'a str,
    pub field: &'a Field,
    pub owner: ModelRef<'a>,
}

/// A lightweight, non-owning handle to a relation plus the model that owns it.
#[derive(Debug, Clone, Copy)]
pub struct RelationRef<'a> {
    pub name: &'a str,
    pub relation: &'a Relation,
    pub owner: ModelRef<'a>,
}

impl<'a> RelationRef<'a> {
    /// The target model this relation points to, resolved against `registry`.
    ///
    /// `registry` must be the registry `self` was obtained from.
    pub fn target(&self, registry: &'a Registry) -> Result<ModelRef<'a>, SchemaError> {
        let id = self.relation.resolve_target_id(registry)?;
        Ok(registry.model_by_id(id))
    }

    /// The junction table name for a `manyToMany` relation: the explicit
    /// `junction_table` if set, else the default derived at `finalize` time
    /// from sorted model names.
    pub fn junction_table(&self) -> &str {
        self.relation
            .junction_table
            .as_deref()
            .or_else(|| self.relation.junction_table_default.get().map(String::as_str))
            .expect("manyToMany relations always have a junction table after finalize")
    }
}

/// Accumulates model registrations before cross-linking.
///
/// The registry never eagerly dereferences during registration — relations
/// may name models not yet registered.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    models: IndexMap<String, Model>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under `name`. Errors if a model with that name was
    /// already registered.
    pub fn register_model(&mut self, name: impl Into<String>, model: Model) -> Result<(), SchemaError> {
        let name = name.into();
        if self.models.contains_key(&name) {
            return Err(SchemaError::DuplicateModel { model: name });
        }
        self.models.insert(name, model);
        Ok(())
    }

    /// Cross-link every relation and hand back an immutable [`Registry`].
    ///
    /// Validates:
    /// - every relation resolves to an existing target model;
    /// - `manyToMany` relations end up with a non-empty `junction_table`
    ///   (deriving a default from sorted model names when absent);
    /// - `is_id` fields are non-nullable and non-array.
    #[tracing::instrument(skip(self), fields(model_count = self.models.len()))]
    pub fn finalize(self) -> Result<Registry, SchemaError> {
        for (model_name, model) in &self.models {
            for field in model.fields.values() {
                if field.is_id && (field.is_nullable || field.is_array) {
                    return Err(SchemaError::InvalidIdField {
                        model: model_name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            for name in model.relations.keys() {
                if model.fields.contains_key(name) {
                    return Err(SchemaError::AmbiguousFieldOrRelation {
                        model: model_name.clone(),
                        name: name.clone(),
                    });
                }
            }
        }

        let registry = Registry { models: self.models };

        for (model_name, model) in registry.models.iter() {
            for relation in model.relations.values() {
                let target_id = relation.resolve_target_id(&registry)?;
                if relation.kind == RelationKind::ManyToMany && relation.junction_table.is_none() {
                    let target = registry.model_by_id(target_id);
                    let mut pair = [model_name.as_str(), target.name];
                    pair.sort_unstable();
                    let derived = format!("{}_{}", pair[0], pair[1]);
                    let _ = relation.junction_table_default.set(derived);
                }
            }
        }

        tracing::debug!(models = registry.models.len(), "schema finalized");
        Ok(registry)
    }
}

/// The finalized, immutable model graph. Freely shareable across threads and
/// across parse calls.
#[derive(Debug)]
pub struct Registry {
    models: IndexMap<String, Model>,
}

impl Registry {
    pub fn get_model<'a>(&'a self, name: &str) -> Result<ModelRef<'a>, SchemaError> {
        self.models
            .get(name)
            .map(|model| ModelRef { name: &model.name, model })
            .ok_or_else(|| SchemaError::ModelNotFound { model: name.to_string() })
    }

    fn model_by_id(&self, id: ModelId) -> ModelRef<'_> {
        let (name, model) = self
            .models
            .get_index(id.0 as usize)
            .expect("ModelId only ever produced for this registry");
        ModelRef { name, model }
    }

    pub fn get_field<'a>(&'a self, model: ModelRef<'a>, name: &str) -> Result<FieldRef<'a>, SchemaError> {
        model
            .model
            .fields
            .get(name)
            .map(|field| FieldRef { name: &field.name, field, owner: model })
            .ok_or_else(|| SchemaError::FieldNotFound {
                model: model.name.to_string(),
                field: name.to_string(),
            })
    }

    pub fn get_relation<'a>(
        &'a self,
        model: ModelRef<'a>,
        name: &str,
    ) -> Result<RelationRef<'a>, SchemaError> {
        model
            .model
            .relations
            .get(name)
            .map(|relation| RelationRef { name: &relation.name, relation, owner: model })
            .ok_or_else(|| SchemaError::RelationNotFound {
                model: model.name.to_string(),
                relation: name.to_string(),
            })
    }

    pub fn field_ref<'a>(&'a self, model: &str, field: &str) -> Result<FieldRef<'a>, SchemaError> {
        let model_ref = self.get_model(model)?;
        self.get_field(model_ref, field)
    }

    pub fn relation_ref<'a>(&'a self, model: &str, relation: &str) -> Result<RelationRef<'a>, SchemaError> {
        let model_ref = self.get_model(model)?;
        self.get_relation(model_ref, relation)
    }

    pub fn models(&self) -> impl Iterator<Item = ModelRef<'_>> {
        self.models.iter().map(|(name, model)| ModelRef { name, model })
    }
}
