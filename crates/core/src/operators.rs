//! The condition operator set, encoded as a table indexed by `(type_tag,
//! operator)` rather than scattered type-specific branches (spec §9:
//! "Polymorphic per-type operator tables").

use sqlcraft_schema::TypeTag;

/// A closed enum of every condition operator the filter grammar recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    Not,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
    Has,
    HasEvery,
    HasSome,
    IsEmpty,
    JsonPath,
    JsonContains,
    JsonStartsWith,
    JsonEndsWith,
    ArrayContains,
    ArrayStartsWith,
    ArrayEndsWith,
}

impl Operator {
    /// Parse the wire name of an operator key (e.g. `"startsWith"`).
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "equals" => Operator::Equals,
            "not" => Operator::Not,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "contains" => Operator::Contains,
            "startsWith" => Operator::StartsWith,
            "endsWith" => Operator::EndsWith,
            "isNull" => Operator::IsNull,
            "isNotNull" => Operator::IsNotNull,
            "has" => Operator::Has,
            "hasEvery" => Operator::HasEvery,
            "hasSome" => Operator::HasSome,
            "isEmpty" => Operator::IsEmpty,
            "jsonPath" => Operator::JsonPath,
            "jsonContains" => Operator::JsonContains,
            "jsonStartsWith" => Operator::JsonStartsWith,
            "jsonEndsWith" => Operator::JsonEndsWith,
            "arrayContains" => Operator::ArrayContains,
            "arrayStartsWith" => Operator::ArrayStartsWith,
            "arrayEndsWith" => Operator::ArrayEndsWith,
            _ => return None,
        })
    }

    pub fn key(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::Not => "not",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::IsNull => "isNull",
            Operator::IsNotNull => "isNotNull",
            Operator::Has => "has",
            Operator::HasEvery => "hasEvery",
            Operator::HasSome => "hasSome",
            Operator::IsEmpty => "isEmpty",
            Operator::JsonPath => "jsonPath",
            Operator::JsonContains => "jsonContains",
            Operator::JsonStartsWith => "jsonStartsWith",
            Operator::JsonEndsWith => "jsonEndsWith",
            Operator::ArrayContains => "arrayContains",
            Operator::ArrayStartsWith => "arrayStartsWith",
            Operator::ArrayEndsWith => "arrayEndsWith",
        }
    }

    /// Array-field-only operators (spec §4.4 rule 2): these are only
    /// meaningful when the target field itself is declared `is_array`.
    pub fn is_array_field_operator(self) -> bool {
        matches!(self, Operator::Has | Operator::HasEvery | Operator::HasSome | Operator::IsEmpty)
    }

    /// JSON-field-only operators.
    pub fn is_json_operator(self) -> bool {
        matches!(
            self,
            Operator::JsonPath
                | Operator::JsonContains
                | Operator::JsonStartsWith
                | Operator::JsonEndsWith
                | Operator::ArrayContains
                | Operator::ArrayStartsWith
                | Operator::ArrayEndsWith
        )
    }

    pub fn requires_array_value(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

/// Scalar operators allowed for a given `type_tag`, independent of whether
/// the field is an array or JSON field (those are handled by dedicated
/// branches in the filter parser, see [`Operator::is_array_field_operator`]
/// and [`Operator::is_json_operator`]).
pub fn allowed_operators(type_tag: TypeTag) -> &'static [Operator] {
    use Operator::*;
    match type_tag {
        TypeTag::String => {
            &[Equals, Not, In, NotIn, Lt, Lte, Gt, Gte, Contains, StartsWith, EndsWith, IsNull, IsNotNull]
        }
        TypeTag::Int | TypeTag::BigInt | TypeTag::Float | TypeTag::Decimal | TypeTag::DateTime => {
            &[Equals, Not, In, NotIn, Lt, Lte, Gt, Gte, IsNull, IsNotNull]
        }
        TypeTag::Boolean => &[Equals, Not, IsNull, IsNotNull],
        TypeTag::Enum => &[Equals, Not, In, NotIn, IsNull, IsNotNull],
        TypeTag::Json => &[
            Equals,
            Not,
            IsNull,
            IsNotNull,
            JsonPath,
            JsonContains,
            JsonStartsWith,
            JsonEndsWith,
            ArrayContains,
            ArrayStartsWith,
            ArrayEndsWith,
        ],
        TypeTag::Blob | TypeTag::Vector => &[Equals, Not, IsNull, IsNotNull],
        TypeTag::Null => &[IsNull, IsNotNull],
    }
}

pub fn is_allowed(type_tag: TypeTag, operator: Operator) -> bool {
    allowed_operators(type_tag).contains(&operator)
}

/// The list of every known operator key, used when reporting an
/// `unknown-operator` error.
pub fn known_operator_keys() -> &'static [&'static str] {
    &[
        "equals",
        "not",
        "in",
        "notIn",
        "lt",
        "lte",
        "gt",
        "gte",
        "contains",
        "startsWith",
        "endsWith",
        "isNull",
        "isNotNull",
        "has",
        "hasEvery",
        "hasSome",
        "isEmpty",
        "jsonPath",
        "jsonContains",
        "jsonStartsWith",
        "jsonEndsWith",
        "arrayContains",
        "arrayStartsWith",
        "arrayEndsWith",
    ]
}
