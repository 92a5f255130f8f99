//! Change extraction: event kind to raw old/new value maps.

use crate::event::EventKind;
use crate::value::AttributeMap;

/// Which side of an event a single entity snapshot belongs to.
///
/// The kind-to-side mapping is table-driven so adding a custom kind does not
/// scatter new branches across the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSide {
    /// Both a before and an after snapshot carry meaning (updates).
    Both,
    /// Only the vanishing state matters (deletion).
    Old,
    /// Only the incoming state matters (creation, restoration, custom data).
    New,
}

/// Returns the side assignment for an event kind.
///
/// - `Updated`: both sides.
/// - `Deleted` / `ForceDeleted`: the state that is vanishing, on the old side.
/// - `Created` / `Restored`: the state being brought in, on the new side.
/// - `Custom`: caller-supplied data on the new side.
pub fn snapshot_side(kind: &EventKind) -> SnapshotSide {
    match kind {
        EventKind::Updated => SnapshotSide::Both,
        EventKind::Deleted | EventKind::ForceDeleted => SnapshotSide::Old,
        EventKind::Created | EventKind::Restored | EventKind::Custom(_) => SnapshotSide::New,
    }
}

/// Derives the raw `(old_values, new_values)` pair for an event.
///
/// Inconsistent input for the kind (a `before` snapshot on a creation, an
/// `after` snapshot on a deletion) is a programmer error: asserted in debug
/// builds, silently dropped in release builds so the calling business
/// operation is never taken down by its audit hook.
pub fn extract_changes(
    kind: &EventKind,
    before: Option<AttributeMap>,
    after: Option<AttributeMap>,
) -> (Option<AttributeMap>, Option<AttributeMap>) {
    match snapshot_side(kind) {
        SnapshotSide::Both => (before, after),
        SnapshotSide::Old => {
            debug_assert!(
                after.is_none(),
                "unexpected after-snapshot for {kind} event"
            );
            (before, None)
        }
        SnapshotSide::New => {
            debug_assert!(
                before.is_none(),
                "unexpected before-snapshot for {kind} event"
            );
            (None, after)
        }
    }
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

    #[test]
    fn created_keeps_only_the_new_side() {
        let snapshot = attrs(&[("name", "x".into())]);
        let (old, new) = extract_changes(&EventKind::Created, None, Some(snapshot.clone()));

        assert_eq!(old, None);
        assert_eq!(new, Some(snapshot));
    }

    #[test]
    fn updated_keeps_both_sides() {
        let before = attrs(&[("price", 100.into())]);
        let after = attrs(&[("price", 120.into())]);

        let (old, new) =
            extract_changes(&EventKind::Updated, Some(before.clone()), Some(after.clone()));

        assert_eq!(old, Some(before));
        assert_eq!(new, Some(after));
    }

    #[test]
    fn deleted_assigns_snapshot_to_the_old_side() {
        let snapshot = attrs(&[("name", "x".into())]);
        let (old, new) = extract_changes(&EventKind::Deleted, Some(snapshot.clone()), None);

        assert_eq!(old, Some(snapshot));
        assert_eq!(new, None);
    }

    #[test]
    fn force_deleted_matches_deleted_semantics() {
        let snapshot = attrs(&[("name", "x".into())]);
        let (old, new) = extract_changes(&EventKind::ForceDeleted, Some(snapshot.clone()), None);

        assert_eq!(old, Some(snapshot));
        assert_eq!(new, None);
    }

    #[test]
    fn restored_assigns_snapshot_to_the_new_side() {
        let snapshot = attrs(&[("name", "x".into())]);
        let (old, new) = extract_changes(&EventKind::Restored, None, Some(snapshot.clone()));

        assert_eq!(old, None);
        assert_eq!(new, Some(snapshot));
    }

    #[test]
    fn custom_kinds_carry_data_on_the_new_side() {
        let data = attrs(&[("attempts", 3.into())]);
        let (old, new) = extract_changes(&EventKind::custom("login"), None, Some(data.clone()));

        assert_eq!(old, None);
        assert_eq!(new, Some(data));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn release_builds_drop_the_unexpected_side() {
        let snapshot = attrs(&[("name", "x".into())]);
        let (old, new) =
            extract_changes(&EventKind::Created, Some(snapshot.clone()), Some(snapshot));

        assert_eq!(old, None);
        assert!(new.is_some());
    }
}
