//! Attribute value model for captured entity state.
//!
//! Entity snapshots arrive as flat maps of loosely-typed attribute values:
//! plain scalars, enum-like wrappers carrying an underlying primitive, and
//! nested maps/lists. Modeling them as a small closed union lets the rest of
//! the pipeline (redaction, structural comparison, serialization) pattern-match
//! exhaustively instead of relying on dynamic type checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A flat attribute snapshot: field name to value.
///
/// `BTreeMap` keeps keys ordered, which gives every map a canonical
/// serialized form for free.
pub type AttributeMap = BTreeMap<String, Value>;

/// A single attribute value in an entity snapshot.
///
/// This is a closed union: every value the pipeline can observe is one of
/// these variants. The `Enum` variant represents a typed wrapper (a backed
/// enum, a status object) whose identity for audit purposes is its underlying
/// primitive; the structural comparator unwraps it before comparing.
///
/// # Examples
///
/// ```
/// use audit_core::Value;
///
/// let price = Value::from(120);
/// let status = Value::wrapped("active");
///
/// assert_eq!(price, Value::Int(120));
/// assert!(matches!(status, Value::Enum { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Absent / SQL NULL.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar.
    Str(String),
    /// Enum-like wrapper around an underlying primitive.
    Enum {
        /// The primitive the wrapper carries.
        underlying: Box<Value>,
    },
    /// Nested attribute map.
    Map(AttributeMap),
    /// Ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// Wraps a value in an enum-like wrapper.
    pub fn wrapped(underlying: impl Into<Value>) -> Self {
        Value::Enum {
            underlying: Box::new(underlying.into()),
        }
    }

    /// Peels enum-like wrappers until a non-wrapper value is reached.
    pub fn unwrapped(&self) -> &Value {
        let mut current = self;
        while let Value::Enum { underlying } = current {
            current = underlying;
        }
        current
    }

    /// Returns true if this value is a scalar (not a map, list, or wrapper).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// Renders this value as canonical JSON.
    ///
    /// Map keys are already sorted, so two structurally identical values
    /// always produce byte-identical output.
    pub fn canonical_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Enum { underlying } => underlying.canonical_json(),
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.canonical_json()))
                    .collect(),
            ),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::canonical_json).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<AttributeMap> for Value {
    fn from(v: AttributeMap) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
