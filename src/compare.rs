//! Structural equality over attribute maps.
//!
//! The basis for no-op update suppression: an ORM "touch" that only moves an
//! auto-maintained (and itself excluded) timestamp would otherwise flood the
//! trail with empty diffs. After redaction, an update whose before and after
//! maps compare equal here is not persisted.

use crate::value::{AttributeMap, Value};

/// Deep, order-insensitive comparison of two optional attribute maps.
///
/// Rules:
/// - two `None`s are equal; `None` vs `Some` is not;
/// - key sets must match exactly, then values compare recursively;
/// - enum-like wrappers are unwrapped to their underlying primitive, so
///   `Wrapped("active")` equals `"active"`;
/// - nested maps recurse structurally (key order never matters), lists
///   compare element-wise in order;
/// - scalars compare strictly by type and value: `Int(1)` is not
///   `Float(1.0)`.
///
/// # Examples
///
/// ```
/// use audit_core::{structurally_equal, AttributeMap, Value};
///
/// let mut a = AttributeMap::new();
/// a.insert("status".to_string(), Value::wrapped("active"));
/// let mut b = AttributeMap::new();
/// b.insert("status".to_string(), Value::from("active"));
///
/// assert!(structurally_equal(Some(&a), Some(&b)));
/// ```
pub fn structurally_equal(a: Option<&AttributeMap>, b: Option<&AttributeMap>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => maps_equal(a, b),
        _ => false,
    }
}

fn maps_equal(a: &AttributeMap, b: &AttributeMap) -> bool {
    a.len() == b.len()
        && a.iter().all(|(key, value)| {
            b.get(key)
                .is_some_and(|other| values_equal(value, other))
        })
}

/// Compares two values after peeling enum-like wrappers from both sides.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.unwrapped(), b.unwrapped()) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Map(a), Value::Map(b)) => maps_equal(a, b),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => false,
    }
}
