//! Capture policy: global defaults, per-entity-type overrides, and resolution.
//!
//! A [`PolicyStore`] is an immutable snapshot of the capture rules loaded at
//! startup (or on explicit reload). Resolution merges the global defaults
//! with the per-type override, if any, into one [`EffectivePolicy`] for a
//! given `(entity type, event kind)` pair:
//!
//! - `enabled`: the override flag, when set, replaces the global one.
//! - allowed events: the override set, when set, *replaces* the default set.
//! - excluded fields: the override set is *unioned* with the global set;
//!   type overrides only add redactions, never remove global ones.
//! - tags: the entity's short type name plus the override's tags.
//! - request context: captured if either the global per-event allow-list or
//!   the override says so for this kind.
//!
//! Resolution always succeeds; an unknown entity type degrades to pure
//! global policy.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::event::EventKind;

/// Fields redacted from every captured record regardless of entity type.
///
/// Password-like secrets, verification timestamps, and the auto-maintained
/// audit/soft-delete timestamps that would otherwise turn every ORM "touch"
/// into a spurious diff.
pub const GLOBAL_EXCLUDED_FIELDS: &[&str] = &[
    "password",
    "password_confirmation",
    "remember_token",
    "email_verified_at",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Per-entity-type override of the global capture defaults.
///
/// Every field is optional or additive; an empty override is equivalent to
/// no override at all.
///
/// # Examples
///
/// ```
/// use audit_core::TypePolicy;
///
/// let listing = TypePolicy::new()
///     .exclude_field("internal_notes")
///     .with_tag("marketplace");
///
/// assert!(listing.excluded_fields().contains("internal_notes"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypePolicy {
    enabled: Option<bool>,
    allowed_events: Option<BTreeSet<EventKind>>,
    excluded_fields: BTreeSet<String>,
    tags: Vec<String>,
    request_context_events: BTreeSet<EventKind>,
}

impl TypePolicy {
    /// Creates an empty override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the enabled flag, replacing the global default.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Disables capture for this entity type entirely.
    pub fn disabled() -> Self {
        Self::new().with_enabled(false)
    }

    /// Replaces the allowed-event set for this entity type.
    ///
    /// This *replaces* the global default set; to keep a lifecycle kind,
    /// list it here alongside any custom kinds.
    pub fn allow_events(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.allowed_events = Some(kinds.into_iter().collect());
        self
    }

    /// Adds a field to redact, on top of the global exclusions.
    pub fn exclude_field(mut self, field: impl Into<String>) -> Self {
        self.excluded_fields.insert(field.into());
        self
    }

    /// Adds a free-form tag applied to every record for this entity type.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Requests ambient request-context capture for the given event kind.
    pub fn capture_request_for(mut self, kind: EventKind) -> Self {
        self.request_context_events.insert(kind);
        self
    }

    /// Returns the fields this override redacts.
    pub fn excluded_fields(&self) -> &BTreeSet<String> {
        &self.excluded_fields
    }
}

/// Immutable snapshot of the full capture configuration.
///
/// Built once at startup with the `with_*` methods, then shared read-only.
/// Runtime reconfiguration goes through [`PolicyCell`], which swaps whole
/// snapshots atomically so a resolver never observes a half-updated policy.
///
/// # Examples
///
/// ```
/// use audit_core::{EventKind, PolicyStore, TypePolicy};
///
/// let store = PolicyStore::new()
///     .exclude_field_globally("ssn")
///     .override_for("app::Listing", TypePolicy::new().exclude_field("internal_notes"));
///
/// let policy = store.resolve("app::Listing", &EventKind::Updated);
/// assert!(policy.enabled);
/// assert!(policy.excluded_fields.contains("ssn"));
/// assert!(policy.excluded_fields.contains("internal_notes"));
/// ```
#[derive(Debug, Clone)]
pub struct PolicyStore {
    enabled: bool,
    default_allowed: BTreeSet<EventKind>,
    global_excluded: BTreeSet<String>,
    request_context_events: BTreeSet<EventKind>,
    overrides: BTreeMap<String, TypePolicy>,
}

impl PolicyStore {
    /// Creates a store with the global defaults: capture enabled, the four
    /// soft-lifecycle kinds allowed, [`GLOBAL_EXCLUDED_FIELDS`] redacted,
    /// and no request-context capture.
    pub fn new() -> Self {
        Self {
            enabled: true,
            default_allowed: BTreeSet::from([
                EventKind::Created,
                EventKind::Updated,
                EventKind::Deleted,
                EventKind::Restored,
            ]),
            global_excluded: GLOBAL_EXCLUDED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            request_context_events: BTreeSet::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Sets the global enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replaces the default allowed-event set.
    pub fn default_allowed_events(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.default_allowed = kinds.into_iter().collect();
        self
    }

    /// Adds a globally redacted field.
    pub fn exclude_field_globally(mut self, field: impl Into<String>) -> Self {
        self.global_excluded.insert(field.into());
        self
    }

    /// Requests request-context capture for the given event kind, globally.
    pub fn capture_request_for(mut self, kind: EventKind) -> Self {
        self.request_context_events.insert(kind);
        self
    }

    /// Installs a per-type override.
    pub fn override_for(mut self, entity_type: impl Into<String>, policy: TypePolicy) -> Self {
        self.overrides.insert(entity_type.into(), policy);
        self
    }

    /// Resolves the effective policy for one `(entity type, event kind)` pair.
    ///
    /// Never fails: an entity type without an override resolves to pure
    /// global policy, and an event kind outside every allow-list still
    /// produces a policy; callers gate on [`EffectivePolicy::allows`].
    pub fn resolve(&self, entity_type: &str, kind: &EventKind) -> EffectivePolicy {
        let short_name = short_type_name(entity_type);
        let override_ = self.overrides.get(entity_type);

        let enabled = override_.and_then(|o| o.enabled).unwrap_or(self.enabled);

        let allowed_events = override_
            .and_then(|o| o.allowed_events.clone())
            .unwrap_or_else(|| self.default_allowed.clone());

        let mut excluded_fields = self.global_excluded.clone();
        if let Some(o) = override_ {
            excluded_fields.extend(o.excluded_fields.iter().cloned());
        }

        let mut tags = vec![short_name.to_string()];
        if let Some(o) = override_ {
            for tag in &o.tags {
                if !tags.iter().any(|t| t == tag) {
                    tags.push(tag.clone());
                }
            }
        }

        let include_request_context = self.request_context_events.contains(kind)
            || override_.is_some_and(|o| o.request_context_events.contains(kind));

        EffectivePolicy {
            enabled,
            allowed_events,
            excluded_fields,
            tags,
            include_request_context,
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The merged capture rules for one `(entity type, event kind)` pair.
///
/// Transient: computed per call by [`PolicyStore::resolve`], never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePolicy {
    /// Whether capture is enabled at all for this entity type.
    pub enabled: bool,
    /// Event kinds that may be captured.
    pub allowed_events: BTreeSet<EventKind>,
    /// Fields removed from both value maps before persistence.
    pub excluded_fields: BTreeSet<String>,
    /// Tags applied to every record (entity short name first).
    pub tags: Vec<String>,
    /// Whether ambient request metadata is captured for this event kind.
    pub include_request_context: bool,
}

impl EffectivePolicy {
    /// Returns true if the given event kind should be captured.
    pub fn allows(&self, kind: &EventKind) -> bool {
        self.enabled && self.allowed_events.contains(kind)
    }
}

/// Atomically swappable holder for the active [`PolicyStore`] snapshot.
///
/// Reloads replace the whole snapshot; readers clone out an `Arc` and
/// resolve against a consistent view for the duration of one capture.
#[derive(Debug)]
pub struct PolicyCell {
    inner: RwLock<Arc<PolicyStore>>,
}

impl PolicyCell {
    /// Wraps an initial snapshot.
    pub fn new(store: PolicyStore) -> Self {
        Self {
            inner: RwLock::new(Arc::new(store)),
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<PolicyStore> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replaces the active snapshot.
    pub fn replace(&self, store: PolicyStore) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(store);
    }
}

/// Returns the short type name: the last `::`, `.`, or `\` delimited segment.
pub(crate) fn short_type_name(entity_type: &str) -> &str {
    entity_type
        .rsplit(|c| c == ':' || c == '.' || c == '\\')
        .next()
        .unwrap_or(entity_type)
}
