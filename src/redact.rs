//! Field redaction over captured value maps.

use std::collections::BTreeSet;

use crate::value::AttributeMap;

/// Removes every excluded top-level key from a value map.
///
/// `None` stays `None`: "this event has no meaningful side" and "this side
/// was fully redacted" are different states, and creation/deletion handling
/// depends on the distinction.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use audit_core::{redact, AttributeMap, Value};
///
/// let mut values = AttributeMap::new();
/// values.insert("name".to_string(), Value::from("x"));
/// values.insert("secret".to_string(), Value::from("s"));
///
/// let excluded = BTreeSet::from(["secret".to_string()]);
/// let redacted = redact(Some(values), &excluded).unwrap();
///
/// assert!(redacted.contains_key("name"));
/// assert!(!redacted.contains_key("secret"));
/// ```
pub fn redact(values: Option<AttributeMap>, excluded: &BTreeSet<String>) -> Option<AttributeMap> {
    values.map(|map| {
        map.into_iter()
            .filter(|(key, _)| !excluded.contains(key))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn fields(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn removes_excluded_keys_only() {
        let values = attrs(&[
            ("name", "x".into()),
            ("password", "hunter2".into()),
            ("price", 100.into()),
        ]);

        let redacted = redact(Some(values), &fields(&["password"])).unwrap();

        assert_eq!(redacted.len(), 2);
        assert!(!redacted.contains_key("password"));
    }

    #[test]
    fn none_input_yields_none_not_empty_map() {
        assert_eq!(redact(None, &fields(&["password"])), None);
    }

    #[test]
    fn fully_redacted_map_is_empty_not_none() {
        let values = attrs(&[("secret", "s".into())]);
        let redacted = redact(Some(values), &fields(&["secret"]));

        assert_eq!(redacted, Some(AttributeMap::new()));
    }

    #[test]
    fn empty_exclusion_set_is_identity() {
        let values = attrs(&[("a", 1.into()), ("b", 2.into())]);
        let redacted = redact(Some(values.clone()), &BTreeSet::new());

        assert_eq!(redacted, Some(values));
    }
}
