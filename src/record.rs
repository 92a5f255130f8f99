//! The persisted audit record and per-capture options.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestInfo;
use crate::event::EventKind;
use crate::value::AttributeMap;

/// One immutable entry in the audit trail.
///
/// Built exactly once per captured event by the recorder, persisted through
/// the store, and never mutated afterwards. The value maps have already been
/// redacted; for `updated` records they are guaranteed not to be
/// structurally equal.
///
/// Serializes cleanly to JSON for export and downstream shipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    entity_type: String,
    entity_id: Option<String>,
    event_kind: EventKind,
    old_values: Option<AttributeMap>,
    new_values: Option<AttributeMap>,
    actor_id: Option<String>,
    actor_type: Option<String>,
    request: Option<RequestInfo>,
    batch_id: Uuid,
    tags: BTreeSet<String>,
    occurred_at: DateTime<Utc>,
}

impl AuditRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entity_type: String,
        entity_id: Option<String>,
        event_kind: EventKind,
        old_values: Option<AttributeMap>,
        new_values: Option<AttributeMap>,
        actor_id: Option<String>,
        actor_type: Option<String>,
        request: Option<RequestInfo>,
        batch_id: Uuid,
        tags: BTreeSet<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            event_kind,
            old_values,
            new_values,
            actor_id,
            actor_type,
            request,
            batch_id,
            tags,
            occurred_at,
        }
    }

    /// Fully-qualified type of the audited entity.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Primary key of the audited instance, if assigned.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// The recorded event kind.
    pub fn event_kind(&self) -> &EventKind {
        &self.event_kind
    }

    /// Redacted pre-state; `None` when the kind has no meaningful before.
    pub fn old_values(&self) -> Option<&AttributeMap> {
        self.old_values.as_ref()
    }

    /// Redacted post-state; `None` when the kind has no meaningful after.
    pub fn new_values(&self) -> Option<&AttributeMap> {
        self.new_values.as_ref()
    }

    /// Id of the acting principal; `None` for system-initiated events.
    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    /// Type of the acting principal (e.g. `admin`, `user`).
    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    /// Ambient request metadata, present only when policy requested it.
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    /// Correlation id shared by records of one logical operation.
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Free-form labels on this record (order not significant).
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns true if the record carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Tags joined into one comma-delimited string, for flat storage.
    pub fn tags_joined(&self) -> String {
        self.tags.iter().cloned().collect::<Vec<_>>().join(",")
    }

    /// When the event occurred.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Per-call knobs for a capture.
///
/// Everything defaults: a fresh batch id, capture-time timestamp, no extra
/// tags.
///
/// # Examples
///
/// ```
/// use audit_core::CaptureOptions;
/// use uuid::Uuid;
///
/// let batch = Uuid::new_v4();
/// let options = CaptureOptions::new()
///     .with_batch_id(batch)
///     .with_tag("import");
///
/// assert_eq!(options.batch_id(), Some(batch));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    batch_id: Option<Uuid>,
    occurred_at: Option<DateTime<Utc>>,
    tags: Vec<String>,
}

impl CaptureOptions {
    /// Creates empty options (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Correlates this record with an existing batch instead of a fresh id.
    pub fn with_batch_id(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    /// Overrides the occurrence timestamp (defaults to capture time).
    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Adds a caller-supplied tag, unioned with the policy tags.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// The explicit batch id, if one was supplied.
    pub fn batch_id(&self) -> Option<Uuid> {
        self.batch_id
    }

    /// The explicit occurrence timestamp, if one was supplied.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occurred_at
    }

    /// Caller-supplied tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}
