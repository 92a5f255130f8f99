//! The recorder: policy gate, extraction, redaction, suppression, assembly.
//!
//! [`Recorder::capture`] is the single entry point lifecycle hooks call. One
//! call walks the full pipeline:
//!
//! 1. resolve the effective policy for `(entity type, event kind)`;
//! 2. stop silently if capture is disabled or the kind is not allowed;
//! 3. derive the raw old/new value maps per event semantics;
//! 4. redact excluded fields from both sides;
//! 5. for updates, suppress the record if nothing non-excluded changed;
//! 6. assemble the record (actor, request context, batch id, tags,
//!    timestamp) and append it to the store.
//!
//! Every persisted record is also emitted as a structured `tracing` event
//! on the `audit_trail` target.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::compare::structurally_equal;
use crate::context::CaptureContext;
use crate::dispatch::{DispatchMode, DispatchRegistry};
use crate::error::CaptureError;
use crate::event::EventKind;
use crate::extract::extract_changes;
use crate::policy::{PolicyCell, PolicyStore};
use crate::query::{AuditQuery, EntityStats};
use crate::record::{AuditRecord, CaptureOptions};
use crate::redact::redact;
use crate::store::AuditStore;
use crate::value::AttributeMap;

/// One lifecycle event on one entity instance, as supplied by the ORM layer.
///
/// # Examples
///
/// ```
/// use audit_core::{AttributeMap, EntityChange, Value};
///
/// let mut after = AttributeMap::new();
/// after.insert("price".to_string(), Value::from(120));
///
/// let change = EntityChange::new("app::Listing")
///     .with_id("7")
///     .with_after(after);
/// assert_eq!(change.entity_type(), "app::Listing");
/// ```
#[derive(Debug, Clone)]
pub struct EntityChange {
    entity_type: String,
    entity_id: Option<String>,
    before: Option<AttributeMap>,
    after: Option<AttributeMap>,
}

impl EntityChange {
    /// Starts a change description for an entity type.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: None,
            before: None,
            after: None,
        }
    }

    /// Sets the entity's primary key.
    pub fn with_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Attaches the pre-event attribute snapshot.
    pub fn with_before(mut self, before: AttributeMap) -> Self {
        self.before = Some(before);
        self
    }

    /// Attaches the post-event attribute snapshot.
    pub fn with_after(mut self, after: AttributeMap) -> Self {
        self.after = Some(after);
        self
    }

    /// The entity's fully-qualified type.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The entity's primary key, if assigned.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }
}

/// The audit pipeline: captures lifecycle and custom events into a trail.
///
/// Holds the three long-lived collaborators: the policy snapshot cell
/// (read-only per capture, atomically reloadable), the dispatch registry
/// (write-once at startup), and the persistence store. All of them are safe
/// to share across threads, so one `Recorder` serves a whole process.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use audit_core::{
///     AttributeMap, CaptureContext, CaptureOptions, EntityChange, EventKind, MemoryStore,
///     PolicyStore, Recorder, Value,
/// };
///
/// let recorder = Recorder::new(PolicyStore::new(), Arc::new(MemoryStore::new()));
///
/// let mut after = AttributeMap::new();
/// after.insert("name".to_string(), Value::from("Fair Deal Ltd"));
///
/// let record = recorder
///     .capture(
///         &EntityChange::new("app::Vendor").with_id("3").with_after(after),
///         EventKind::Created,
///         &CaptureContext::system(),
///         CaptureOptions::new(),
///     )
///     .unwrap()
///     .expect("created events are captured by default");
///
/// assert_eq!(record.event_kind(), &EventKind::Created);
/// ```
pub struct Recorder {
    policy: PolicyCell,
    registry: DispatchRegistry,
    store: Arc<dyn AuditStore>,
}

impl Recorder {
    /// Creates a recorder with an empty dispatch registry.
    ///
    /// Suitable when every capture call is explicit; automatic lifecycle
    /// attachment needs [`Recorder::with_registry`].
    pub fn new(policy: PolicyStore, store: Arc<dyn AuditStore>) -> Self {
        Self::with_registry(policy, DispatchRegistry::default(), store)
    }

    /// Creates a recorder with a frozen dispatch registry.
    pub fn with_registry(
        policy: PolicyStore,
        registry: DispatchRegistry,
        store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            policy: PolicyCell::new(policy),
            registry,
            store,
        }
    }

    /// Atomically replaces the active policy snapshot.
    pub fn reload_policy(&self, policy: PolicyStore) {
        self.policy.replace(policy);
    }

    /// The dispatch registry this recorder routes through.
    pub fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }

    /// Captures one lifecycle event.
    ///
    /// Returns `Ok(None)` when policy disables the entity type, the kind is
    /// not in the allowed set, or a no-op update was suppressed; returns the
    /// persisted record otherwise. Only storage failures are errors.
    pub fn capture(
        &self,
        change: &EntityChange,
        kind: EventKind,
        ctx: &CaptureContext,
        options: CaptureOptions,
    ) -> Result<Option<AuditRecord>, CaptureError> {
        let (old_values, new_values) =
            extract_changes(&kind, change.before.clone(), change.after.clone());
        self.capture_prepared(change, kind, old_values, new_values, ctx, options)
    }

    /// Captures a non-lifecycle event (authentication, domain actions).
    ///
    /// The event data lands on the record's new-values side. Custom kinds
    /// are captured only when a policy override lists them in its allowed
    /// events.
    pub fn capture_custom(
        &self,
        change: &EntityChange,
        kind: impl Into<String>,
        data: AttributeMap,
        ctx: &CaptureContext,
        options: CaptureOptions,
    ) -> Result<Option<AuditRecord>, CaptureError> {
        let kind = EventKind::custom(kind.into());
        self.capture_prepared(change, kind, None, Some(data), ctx, options)
    }

    /// Lifecycle entry point for the dedicated-dispatcher path.
    ///
    /// No-op unless the entity type is registered as dispatcher-backed.
    pub fn capture_via_dispatcher(
        &self,
        change: &EntityChange,
        kind: EventKind,
        ctx: &CaptureContext,
        options: CaptureOptions,
    ) -> Result<Option<AuditRecord>, CaptureError> {
        if self.registry.mode(change.entity_type()) != DispatchMode::DispatcherBacked {
            return Ok(None);
        }
        self.capture(change, kind, ctx, options)
    }

    /// Lifecycle entry point for the self-auditing mixin path.
    ///
    /// No-op unless the mixin is the active path for the entity type; in
    /// particular, stays inert when a dedicated dispatcher is registered,
    /// so an event can never be logged twice.
    pub fn capture_via_mixin(
        &self,
        change: &EntityChange,
        kind: EventKind,
        ctx: &CaptureContext,
        options: CaptureOptions,
    ) -> Result<Option<AuditRecord>, CaptureError> {
        if !self.registry.should_use_mixin_dispatch(change.entity_type()) {
            return Ok(None);
        }
        self.capture(change, kind, ctx, options)
    }

    /// Returns the records matching a query, in append order.
    pub fn find(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, CaptureError> {
        Ok(self.store.find(query)?)
    }

    /// Aggregates statistics for one entity type over the trailing window.
    ///
    /// A window of `n` days covers `now - n days` up to now. Zero matching
    /// records yield all-zero aggregates.
    pub fn stats_for(
        &self,
        entity_type: &str,
        window_days: i64,
    ) -> Result<EntityStats, CaptureError> {
        let start = Utc::now() - chrono::Duration::days(window_days);
        let records = self.store.find(
            &AuditQuery::new()
                .for_entity_type(entity_type)
                .in_range(start, None),
        )?;
        Ok(EntityStats::from_records(&records))
    }

    fn capture_prepared(
        &self,
        change: &EntityChange,
        kind: EventKind,
        old_values: Option<AttributeMap>,
        new_values: Option<AttributeMap>,
        ctx: &CaptureContext,
        options: CaptureOptions,
    ) -> Result<Option<AuditRecord>, CaptureError> {
        let policy = self
            .policy
            .snapshot()
            .resolve(change.entity_type(), &kind);

        if !policy.allows(&kind) {
            tracing::debug!(
                target: "audit_trail",
                entity_type = change.entity_type(),
                kind = %kind,
                "event not captured: disabled or kind not allowed"
            );
            return Ok(None);
        }

        let old_values = redact(old_values, &policy.excluded_fields);
        let new_values = redact(new_values, &policy.excluded_fields);

        if kind == EventKind::Updated
            && structurally_equal(old_values.as_ref(), new_values.as_ref())
        {
            tracing::debug!(
                target: "audit_trail",
                entity_type = change.entity_type(),
                entity_id = ?change.entity_id(),
                "no-op update suppressed"
            );
            return Ok(None);
        }

        let mut tags: BTreeSet<String> = policy.tags.iter().cloned().collect();
        tags.extend(options.tags().iter().cloned());

        let request = if policy.include_request_context {
            ctx.request().cloned()
        } else {
            None
        };

        let record = AuditRecord::new(
            change.entity_type().to_string(),
            change.entity_id().map(str::to_string),
            kind,
            old_values,
            new_values,
            ctx.actor().map(|a| a.id().to_string()),
            ctx.actor().map(|a| a.kind().to_string()),
            request,
            options.batch_id().unwrap_or_else(Uuid::new_v4),
            tags,
            options.occurred_at().unwrap_or_else(Utc::now),
        );

        let record_id = self.store.append(record.clone())?;
        tracing::info!(
            target: "audit_trail",
            record_id = %record_id,
            entity_type = record.entity_type(),
            entity_id = ?record.entity_id(),
            kind = %record.event_kind(),
            actor_id = ?record.actor_id(),
            batch_id = %record.batch_id(),
            "audit record captured"
        );
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Actor;
    use crate::policy::TypePolicy;
    use crate::store::MemoryStore;
    use crate::value::Value;

    fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn recorder_with(policy: PolicyStore) -> (Recorder, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let recorder = Recorder::new(policy, store.clone() as Arc<dyn AuditStore>);
        (recorder, store)
    }

    #[test]
    fn created_event_persists_redacted_new_values() {
        let (recorder, store) = recorder_with(PolicyStore::new().exclude_field_globally("secret"));

        let record = recorder
            .capture(
                &EntityChange::new("app::Vendor")
                    .with_id("3")
                    .with_after(attrs(&[("name", "x".into()), ("secret", "s".into())])),
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap()
            .unwrap();

        assert!(record.old_values().is_none());
        let new_values = record.new_values().unwrap();
        assert!(new_values.contains_key("name"));
        assert!(!new_values.contains_key("secret"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn disabled_type_is_a_silent_no_op() {
        let (recorder, store) = recorder_with(
            PolicyStore::new().override_for("app::Draft", TypePolicy::disabled()),
        );

        let outcome = recorder
            .capture(
                &EntityChange::new("app::Draft")
                    .with_id("1")
                    .with_after(attrs(&[("name", "x".into())])),
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();

        assert!(outcome.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn disallowed_kind_is_a_silent_no_op() {
        // ForceDeleted is outside the default allowed set.
        let (recorder, store) = recorder_with(PolicyStore::new());

        let outcome = recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id("7")
                    .with_before(attrs(&[("name", "x".into())])),
                EventKind::ForceDeleted,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();

        assert!(outcome.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn noop_update_is_suppressed_after_redaction() {
        let (recorder, store) = recorder_with(
            PolicyStore::new().override_for(
                "app::Listing",
                TypePolicy::new().exclude_field("internal_notes"),
            ),
        );

        let outcome = recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id("7")
                    .with_before(attrs(&[("internal_notes", "a".into()), ("price", 100.into())]))
                    .with_after(attrs(&[("internal_notes", "b".into()), ("price", 100.into())])),
                EventKind::Updated,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();

        assert!(outcome.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn real_update_survives_suppression() {
        let (recorder, _store) = recorder_with(PolicyStore::new());

        let record = recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id("7")
                    .with_before(attrs(&[("price", 100.into())]))
                    .with_after(attrs(&[("price", 120.into())])),
                EventKind::Updated,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(record.old_values().unwrap()["price"], Value::Int(100));
        assert_eq!(record.new_values().unwrap()["price"], Value::Int(120));
    }

    #[test]
    fn restored_event_is_not_suppressed_even_when_identical() {
        // Restoring to a state identical to a prior one is still a
        // transition worth recording; suppression applies to updates only.
        let (recorder, store) = recorder_with(PolicyStore::new());

        let outcome = recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id("7")
                    .with_after(attrs(&[("price", 100.into())])),
                EventKind::Restored,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();

        assert!(outcome.is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn actor_and_tags_land_on_the_record() {
        let (recorder, _store) = recorder_with(PolicyStore::new().override_for(
            "app::Listing",
            TypePolicy::new().with_tag("marketplace"),
        ));

        let record = recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id("7")
                    .with_after(attrs(&[("name", "x".into())])),
                EventKind::Created,
                &CaptureContext::for_actor(Actor::new("42", "admin")),
                CaptureOptions::new().with_tag("import"),
            )
            .unwrap()
            .unwrap();

        assert_eq!(record.actor_id(), Some("42"));
        assert_eq!(record.actor_type(), Some("admin"));
        assert!(record.has_tag("Listing"));
        assert!(record.has_tag("marketplace"));
        assert!(record.has_tag("import"));
    }

    #[test]
    fn request_context_requires_policy_opt_in() {
        let ctx = CaptureContext::for_actor(Actor::new("42", "admin")).with_request(
            crate::context::RequestInfo::new().with_ip("203.0.113.9"),
        );

        let (recorder, _) = recorder_with(PolicyStore::new());
        let without = recorder
            .capture(
                &EntityChange::new("app::User")
                    .with_id("1")
                    .with_after(attrs(&[("name", "x".into())])),
                EventKind::Created,
                &ctx,
                CaptureOptions::new(),
            )
            .unwrap()
            .unwrap();
        assert!(without.request().is_none());

        let (recorder, _) =
            recorder_with(PolicyStore::new().capture_request_for(EventKind::Created));
        let with = recorder
            .capture(
                &EntityChange::new("app::User")
                    .with_id("1")
                    .with_after(attrs(&[("name", "x".into())])),
                EventKind::Created,
                &ctx,
                CaptureOptions::new(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(with.request().unwrap().ip(), Some("203.0.113.9"));
    }

    #[test]
    fn custom_event_needs_a_policy_allowance() {
        let (recorder, store) = recorder_with(PolicyStore::new());
        let outcome = recorder
            .capture_custom(
                &EntityChange::new("app::User").with_id("1"),
                "login",
                attrs(&[("ip", "203.0.113.9".into())]),
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();
        assert!(outcome.is_none());
        assert!(store.is_empty());

        let (recorder, store) = recorder_with(PolicyStore::new().override_for(
            "app::User",
            TypePolicy::new().allow_events([
                EventKind::Created,
                EventKind::Updated,
                EventKind::custom("login"),
            ]),
        ));
        let record = recorder
            .capture_custom(
                &EntityChange::new("app::User").with_id("1"),
                "login",
                attrs(&[("ip", "203.0.113.9".into())]),
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(record.event_kind(), &EventKind::custom("login"));
        assert!(record.new_values().unwrap().contains_key("ip"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn batch_id_defaults_fresh_and_honors_override() {
        let (recorder, _) = recorder_with(PolicyStore::new());
        let change = EntityChange::new("app::Listing")
            .with_id("7")
            .with_after(attrs(&[("name", "x".into())]));

        let a = recorder
            .capture(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap()
            .unwrap();
        let b = recorder
            .capture(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap()
            .unwrap();
        assert_ne!(a.batch_id(), b.batch_id());

        let shared = Uuid::new_v4();
        let c = recorder
            .capture(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new().with_batch_id(shared),
            )
            .unwrap()
            .unwrap();
        assert_eq!(c.batch_id(), shared);
    }

    #[test]
    fn dispatcher_registration_keeps_mixin_inert() {
        let registry = crate::dispatch::DispatchRegistryBuilder::new()
            .register_dispatcher("app::Listing")
            .register_mixin("app::Listing")
            .build();
        let store = Arc::new(MemoryStore::new());
        let recorder = Recorder::with_registry(
            PolicyStore::new(),
            registry,
            store.clone() as Arc<dyn AuditStore>,
        );

        let change = EntityChange::new("app::Listing")
            .with_id("7")
            .with_after(attrs(&[("name", "x".into())]));

        // Both attachment mechanisms fire for the same event; only the
        // dispatcher path records.
        let via_dispatcher = recorder
            .capture_via_dispatcher(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();
        let via_mixin = recorder
            .capture_via_mixin(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();

        assert!(via_dispatcher.is_some());
        assert!(via_mixin.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unregistered_type_has_no_automatic_capture() {
        let (recorder, store) = recorder_with(PolicyStore::new());
        let change = EntityChange::new("app::Orphan")
            .with_id("1")
            .with_after(attrs(&[("name", "x".into())]));

        assert!(recorder
            .capture_via_dispatcher(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new()
            )
            .unwrap()
            .is_none());
        assert!(recorder
            .capture_via_mixin(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new()
            )
            .unwrap()
            .is_none());
        assert!(store.is_empty());

        // Explicit capture still works.
        assert!(recorder
            .capture(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new()
            )
            .unwrap()
            .is_some());
    }

    #[test]
    fn policy_reload_takes_effect_for_later_captures() {
        let (recorder, store) = recorder_with(PolicyStore::new());
        let change = EntityChange::new("app::Listing")
            .with_id("7")
            .with_after(attrs(&[("name", "x".into())]));

        recorder
            .capture(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();
        assert_eq!(store.len(), 1);

        recorder.reload_policy(PolicyStore::new().with_enabled(false));
        let outcome = recorder
            .capture(
                &change,
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new(),
            )
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn stats_for_aggregates_the_window() {
        let (recorder, _) = recorder_with(PolicyStore::new());
        let ctx = CaptureContext::for_actor(Actor::new("42", "admin"));

        recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id("7")
                    .with_after(attrs(&[("name", "x".into())])),
                EventKind::Created,
                &ctx,
                CaptureOptions::new(),
            )
            .unwrap();
        for price in [110, 120, 130] {
            recorder
                .capture(
                    &EntityChange::new("app::Listing")
                        .with_id("7")
                        .with_before(attrs(&[("price", 100.into())]))
                        .with_after(attrs(&[("price", price.into())])),
                    EventKind::Updated,
                    &ctx,
                    CaptureOptions::new(),
                )
                .unwrap();
        }

        let stats = recorder.stats_for("app::Listing", 7).unwrap();
        assert_eq!(stats.total_events(), 4);
        assert_eq!(stats.count_for(&EventKind::Updated), 3);
        assert_eq!(stats.count_for(&EventKind::Created), 1);
        assert_eq!(stats.count_for(&EventKind::Deleted), 0);
        assert_eq!(stats.unique_actor_count(), 1);
    }

    #[test]
    fn stats_for_unknown_entity_type_is_empty_not_an_error() {
        let (recorder, _) = recorder_with(PolicyStore::new());
        let stats = recorder.stats_for("app::Nothing", 30).unwrap();
        assert_eq!(stats.total_events(), 0);
    }
}
