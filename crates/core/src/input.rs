//! The loosely-typed argument tree parsers narrow into the AST.
//!
//! Query arguments arrive as a generic dynamic value — a sum type over
//! scalars, arrays, and objects — rather than threaded-through `Any`/dynamic
//! typing. `serde_json::Value` already plays this role across this corpus for
//! ad hoc trees; `InputValue` wraps it in its own enum so the parser surface
//! doesn't leak `serde_json`'s API.

use indexmap::IndexMap;

/// A dynamic value in an incoming query-argument tree.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
}

impl InputValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InputValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            InputValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[InputValue]> {
        match self {
            InputValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, InputValue>> {
        match self {
            InputValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, InputValue::Null)
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, InputValue::Null | InputValue::Bool(false))
    }
}

impl From<serde_json::Value> for InputValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => InputValue::Null,
            serde_json::Value::Bool(b) => InputValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    InputValue::Int(i)
                } else {
                    InputValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => InputValue::String(s),
            serde_json::Value::Array(items) => {
                InputValue::Array(items.into_iter().map(InputValue::from).collect())
            }
            serde_json::Value::Object(map) => {
                InputValue::Object(map.into_iter().map(|(k, v)| (k, InputValue::from(v))).collect())
            }
        }
    }
}

impl From<InputValue> for serde_json::Value {
    fn from(value: InputValue) -> Self {
        match value {
            InputValue::Null => serde_json::Value::Null,
            InputValue::Bool(b) => serde_json::Value::Bool(b),
            InputValue::Int(i) => serde_json::Value::Number(i.into()),
            InputValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            InputValue::String(s) => serde_json::Value::String(s),
            InputValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            InputValue::Object(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
