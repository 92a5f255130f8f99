//! Event kinds recorded in the audit trail.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind of lifecycle or custom event being recorded.
///
/// The five built-in variants cover the standard entity lifecycle. Anything
/// else (authentication events, domain-specific actions) is carried as
/// `Custom` with a free-form name.
///
/// # Examples
///
/// ```
/// use audit_core::EventKind;
///
/// assert_eq!(EventKind::Updated.to_string(), "updated");
/// assert_eq!(EventKind::from("login"), EventKind::custom("login"));
/// assert_eq!(EventKind::from("created"), EventKind::Created);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Entity was created.
    Created,
    /// Entity attributes were modified.
    Updated,
    /// Entity was soft-deleted.
    Deleted,
    /// Entity was restored from soft deletion.
    Restored,
    /// Entity was permanently deleted.
    ForceDeleted,
    /// Non-lifecycle event identified by name (e.g. `login`).
    Custom(String),
}

impl EventKind {
    /// Creates an event kind from a name, normalizing built-in names.
    ///
    /// `custom("created")` yields `EventKind::Created`, not a `Custom`
    /// variant that would compare unequal to it.
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            "created" => EventKind::Created,
            "updated" => EventKind::Updated,
            "deleted" => EventKind::Deleted,
            "restored" => EventKind::Restored,
            "force_deleted" => EventKind::ForceDeleted,
            _ => EventKind::Custom(name),
        }
    }

    /// Returns the event name as recorded in the trail.
    pub fn name(&self) -> &str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
            EventKind::Restored => "restored",
            EventKind::ForceDeleted => "force_deleted",
            EventKind::Custom(name) => name,
        }
    }

    /// Returns true for the built-in lifecycle kinds.
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, EventKind::Custom(_))
    }

    /// The built-in lifecycle kinds, in declaration order.
    pub fn lifecycle_kinds() -> [EventKind; 5] {
        [
            EventKind::Created,
            EventKind::Updated,
            EventKind::Deleted,
            EventKind::Restored,
            EventKind::ForceDeleted,
        ]
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        EventKind::custom(name)
    }
}

// Serialized as the bare event name so persisted records read naturally.
impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(EventKind::custom(name))
    }
}
