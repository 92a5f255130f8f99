//! Read facade: composable record filters and aggregate statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::event::EventKind;
use crate::record::AuditRecord;

/// Composable filter over persisted audit records.
///
/// Every set criterion must hold for a record to match (logical AND). An
/// empty query matches everything. Unknown entity types or actors simply
/// match nothing; querying is never an error.
///
/// # Examples
///
/// ```
/// use audit_core::{AuditQuery, EventKind};
///
/// let query = AuditQuery::new()
///     .for_entity("app::Listing", "7")
///     .by_event(EventKind::Updated)
///     .by_tag("marketplace");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    entity_type: Option<String>,
    entity_id: Option<String>,
    event_kind: Option<EventKind>,
    actor_id: Option<String>,
    tag: Option<String>,
    batch_id: Option<Uuid>,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

impl AuditQuery {
    /// Creates a query matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one entity instance.
    pub fn for_entity(self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.for_entity_type(entity_type).for_entity_id(entity_id)
    }

    /// Restricts to one entity type.
    pub fn for_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Restricts to one entity id (any type unless also constrained).
    pub fn for_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Restricts to one event kind.
    pub fn by_event(mut self, kind: EventKind) -> Self {
        self.event_kind = Some(kind);
        self
    }

    /// Restricts to records performed by one actor.
    pub fn by_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Restricts to records carrying a tag.
    pub fn by_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Restricts to records of one batch.
    pub fn by_batch(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    /// Restricts to a time window: `start` inclusive, `end` exclusive.
    ///
    /// `None` for `end` leaves the window open-ended.
    pub fn in_range(mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        self.from = Some(start);
        self.until = end;
        self
    }

    /// Returns true if the record satisfies every set criterion.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(entity_type) = &self.entity_type {
            if record.entity_type() != entity_type {
                return false;
            }
        }
        if let Some(entity_id) = &self.entity_id {
            if record.entity_id() != Some(entity_id.as_str()) {
                return false;
            }
        }
        if let Some(kind) = &self.event_kind {
            if record.event_kind() != kind {
                return false;
            }
        }
        if let Some(actor_id) = &self.actor_id {
            if record.actor_id() != Some(actor_id.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !record.has_tag(tag) {
                return false;
            }
        }
        if let Some(batch_id) = &self.batch_id {
            if record.batch_id() != *batch_id {
                return false;
            }
        }
        if let Some(from) = &self.from {
            if record.occurred_at() < *from {
                return false;
            }
        }
        if let Some(until) = &self.until {
            if record.occurred_at() >= *until {
                return false;
            }
        }
        true
    }
}

/// Aggregate statistics over a set of records.
///
/// `counts_by_kind` is seeded with every built-in lifecycle kind at zero so
/// reporting always sees the full breakdown; custom kinds appear only when
/// observed. Zero records yield all-zero aggregates, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    total_events: u64,
    counts_by_kind: BTreeMap<String, u64>,
    unique_actor_count: u64,
    events_by_day: BTreeMap<NaiveDate, u64>,
}

impl EntityStats {
    /// Aggregates statistics from a slice of records.
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let mut counts_by_kind: BTreeMap<String, u64> = EventKind::lifecycle_kinds()
            .iter()
            .map(|kind| (kind.name().to_string(), 0))
            .collect();
        let mut actors = BTreeSet::new();
        let mut events_by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();

        for record in records {
            *counts_by_kind
                .entry(record.event_kind().name().to_string())
                .or_insert(0) += 1;
            if let Some(actor_id) = record.actor_id() {
                actors.insert(actor_id.to_string());
            }
            *events_by_day
                .entry(record.occurred_at().date_naive())
                .or_insert(0) += 1;
        }

        Self {
            total_events: records.len() as u64,
            counts_by_kind,
            unique_actor_count: actors.len() as u64,
            events_by_day,
        }
    }

    /// Total number of events in the window.
    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    /// Event counts broken down by kind name.
    pub fn counts_by_kind(&self) -> &BTreeMap<String, u64> {
        &self.counts_by_kind
    }

    /// Count for one kind; zero when never observed.
    pub fn count_for(&self, kind: &EventKind) -> u64 {
        self.counts_by_kind.get(kind.name()).copied().unwrap_or(0)
    }

    /// Number of distinct (non-system) actors in the window.
    pub fn unique_actor_count(&self) -> u64 {
        self.unique_actor_count
    }

    /// Per-day event histogram.
    pub fn events_by_day(&self) -> &BTreeMap<NaiveDate, u64> {
        &self.events_by_day
    }
}
