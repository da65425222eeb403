//! The query AST (spec §3.2). Every node carries an explicit kind
//! discriminator; nodes hold non-owning references into the schema registry,
//! never owned copies of schema data, and are produced in a single parser
//! pass then discarded after emission.

use crate::value::Value;
use crate::input::InputValue;
use sqlcraft_schema::{FieldRef, ModelRef, RelationRef};

/// One of the operations a [`Query`] may express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindUnique,
    FindUniqueOrThrow,
    FindFirst,
    FindFirstOrThrow,
    FindMany,
    Create,
    CreateMany,
    Update,
    UpdateMany,
    Upsert,
    Delete,
    DeleteMany,
    Count,
    Aggregate,
    GroupBy,
}

impl Operation {
    /// Operations with "unique" semantics require `where` (spec §4.12).
    pub fn requires_where(self) -> bool {
        matches!(
            self,
            Operation::FindUnique
                | Operation::FindUniqueOrThrow
                | Operation::Update
                | Operation::Delete
        )
    }
}

/// The root AST node.
#[derive(Debug)]
pub struct Query<'a> {
    pub operation: Operation,
    pub model_ref: ModelRef<'a>,
    pub args: QueryArgs<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsPlacement {
    First,
    Last,
}

#[derive(Debug, Default)]
pub struct QueryArgs<'a> {
    pub where_: Option<Condition<'a>>,
    pub data: Option<DataArg<'a>>,
    pub select: Option<Selection<'a>>,
    pub include: Option<Inclusion<'a>>,
    pub order_by: Vec<Ordering<'a>>,
    pub group_by: Vec<GroupBy<'a>>,
    pub having: Option<Condition<'a>>,
    pub take: Option<i64>,
    pub skip: Option<i64>,
    pub cursor: Option<Cursor<'a>>,
    pub distinct: Vec<FieldRef<'a>>,
    pub aggregate: Option<Aggregation<'a>>,
}

impl<'a> QueryArgs<'a> {
    pub fn new() -> Self {
        Self::default()
    }
}

// --- Conditions (where/having) -----------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationOp {
    Some,
    Every,
    None,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy)]
pub enum ConditionTarget<'a> {
    Field(FieldRef<'a>),
    Relation(RelationRef<'a>, RelationOp),
    Logical(LogicalOp),
}

/// A single node of a `where`/`having` tree.
///
/// `operator`/`value` are populated for [`ConditionTarget::Field`]; `nested`
/// holds sub-conditions for [`ConditionTarget::Relation`] (exactly one) and
/// [`ConditionTarget::Logical`] (one or more, per `AND`/`OR`/`NOT`
/// semantics).
#[derive(Debug)]
pub struct Condition<'a> {
    pub target: ConditionTarget<'a>,
    pub operator: Option<crate::operators::Operator>,
    pub value: Option<Value>,
    pub nested: Vec<Condition<'a>>,
    pub negated: bool,
}

impl<'a> Condition<'a> {
    pub fn field(field_ref: FieldRef<'a>, operator: crate::operators::Operator, value: Value) -> Self {
        Self {
            target: ConditionTarget::Field(field_ref),
            operator: Some(operator),
            value: Some(value),
            nested: Vec::new(),
            negated: false,
        }
    }

    pub fn logical(op: LogicalOp, nested: Vec<Condition<'a>>) -> Self {
        Self { target: ConditionTarget::Logical(op), operator: None, value: None, nested, negated: false }
    }

    pub fn relation(relation_ref: RelationRef<'a>, op: RelationOp, nested: Condition<'a>) -> Self {
        Self {
            target: ConditionTarget::Relation(relation_ref, op),
            operator: None,
            value: None,
            nested: vec![nested],
            negated: false,
        }
    }
}

// --- Selection / Inclusion ----------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SelectionField<'a> {
    pub field_ref: FieldRef<'a>,
    pub include: bool,
}

/// A relation selected (via `select`) or included (via `include`), with
/// optional nested args narrowing what's fetched for it.
#[derive(Debug)]
pub struct NestedSelection<'a> {
    pub relation_ref: RelationRef<'a>,
    pub args: Option<Box<QueryArgs<'a>>>,
}

#[derive(Debug)]
pub struct Selection<'a> {
    pub model_ref: ModelRef<'a>,
    pub fields: Vec<SelectionField<'a>>,
    pub relations: Vec<NestedSelection<'a>>,
}

#[derive(Debug)]
pub struct InclusionRelation<'a> {
    pub relation_ref: RelationRef<'a>,
    pub nested: NestedSelection<'a>,
}

#[derive(Debug)]
pub struct Inclusion<'a> {
    pub model_ref: ModelRef<'a>,
    pub relations: Vec<InclusionRelation<'a>>,
}

// --- Data (create/update payloads) --------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldDataOp {
    Set,
    Increment,
    Decrement,
    Multiply,
    Divide,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationDataOp {
    Connect,
    Disconnect,
    ConnectOrCreate,
    Create,
    Update,
    Upsert,
    Delete,
}

#[derive(Debug)]
pub enum DataField<'a> {
    Field { field_ref: FieldRef<'a>, op: FieldDataOp, value: Value },
    /// Nested create/update payloads are not recursively expanded here (spec
    /// §4.5); `payload` is carried opaquely for the owning operation to
    /// re-parse at emission time if it needs to.
    Relation { relation_ref: RelationRef<'a>, op: RelationDataOp, payload: InputValue },
}

#[derive(Debug)]
pub struct Data<'a> {
    pub model_ref: ModelRef<'a>,
    pub fields: Vec<DataField<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOp {
    CreateMany,
    UpdateMany,
    DeleteMany,
}

#[derive(Debug)]
pub struct BatchData<'a> {
    pub model_ref: ModelRef<'a>,
    pub op: BatchOp,
    pub items: Vec<Data<'a>>,
    pub skip_duplicates: bool,
}

/// The union of shapes `QueryArgs.data` may take, depending on `operation`.
#[derive(Debug)]
pub enum DataArg<'a> {
    Single(Data<'a>),
    Batch(BatchData<'a>),
    Upsert(Box<Upsert<'a>>),
}

// --- Ordering ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Count,
    Avg,
    Sum,
    Min,
    Max,
}

impl AggregateOp {
    pub fn alias_prefix(self) -> &'static str {
        match self {
            AggregateOp::Count => "_count",
            AggregateOp::Avg => "_avg",
            AggregateOp::Sum => "_sum",
            AggregateOp::Min => "_min",
            AggregateOp::Max => "_max",
        }
    }
}

#[derive(Debug)]
pub enum OrderingTarget<'a> {
    Field(FieldRef<'a>),
    RelationCount(RelationRef<'a>),
    RelationNested(RelationRef<'a>, Box<Ordering<'a>>),
    Aggregate(AggregateOp, Option<FieldRef<'a>>),
    /// An underscore-prefixed aggregate key (`_count`, `_avg.age`, …) in a
    /// `groupBy`/`aggregate` orderBy: references that aggregate's own
    /// select-list alias rather than re-deriving an aggregate expression.
    AggregateAlias(AggregateOp, Option<FieldRef<'a>>),
}

#[derive(Debug)]
pub struct Ordering<'a> {
    pub target: OrderingTarget<'a>,
    pub direction: Direction,
    pub nulls: Option<NullsPlacement>,
}

// --- Aggregation / groupBy ------------------------------------------------

#[derive(Debug)]
pub struct AggField<'a> {
    pub op: AggregateOp,
    pub field_ref: Option<FieldRef<'a>>,
    pub alias: Option<String>,
}

#[derive(Debug)]
pub struct Aggregation<'a> {
    pub model_ref: ModelRef<'a>,
    pub aggregations: Vec<AggField<'a>>,
}

#[derive(Debug)]
pub struct GroupBy<'a> {
    pub field_ref: FieldRef<'a>,
}

// --- Cursor ---------------------------------------------------------------

#[derive(Debug)]
pub struct Cursor<'a> {
    pub field_ref: FieldRef<'a>,
    pub value: Value,
    pub direction: Option<Direction>,
}

// --- Upsert -----------------------------------------------------------------

#[derive(Debug)]
pub enum ConflictTarget<'a> {
    Fields(Vec<FieldRef<'a>>),
    Index(String),
    Constraint(String),
}

#[derive(Debug)]
pub struct Upsert<'a> {
    pub model_ref: ModelRef<'a>,
    pub conflict_target: ConflictTarget<'a>,
    pub create_data: Data<'a>,
    pub update_data: Data<'a>,
    pub where_: Option<Condition<'a>>,
}
