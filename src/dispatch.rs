//! Dispatch coordination: exactly one capture path per entity type.
//!
//! Lifecycle events can reach the recorder through two attachment
//! mechanisms: a dedicated dispatcher registered for the entity type, or a
//! self-auditing mixin embedded in the entity. If both fired, every event
//! would be logged twice. The registry is the single source of truth for
//! which path is live: it is populated by explicit registration calls at
//! startup, frozen by [`DispatchRegistryBuilder::build`], and read-only for
//! the life of the process. A dedicated dispatcher is always authoritative;
//! a mixin registered on the same type stays inert.

use std::collections::BTreeMap;
use std::fmt;

/// Which capture path, if any, is active for an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// No automatic capture; only explicit `capture` calls record events.
    #[default]
    NoDispatch,
    /// A dedicated dispatcher handles this type's lifecycle events.
    DispatcherBacked,
    /// The entity's embedded self-auditing hook handles its own events.
    MixinBacked,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::NoDispatch => write!(f, "no_dispatch"),
            DispatchMode::DispatcherBacked => write!(f, "dispatcher_backed"),
            DispatchMode::MixinBacked => write!(f, "mixin_backed"),
        }
    }
}

/// Collects registrations at startup, then freezes into a registry.
///
/// Registration order does not matter: a dispatcher registration wins over a
/// mixin registration for the same type no matter which came first.
#[derive(Debug, Default)]
pub struct DispatchRegistryBuilder {
    modes: BTreeMap<String, DispatchMode>,
}

impl DispatchRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dedicated dispatcher for an entity type.
    pub fn register_dispatcher(mut self, entity_type: impl Into<String>) -> Self {
        self.modes
            .insert(entity_type.into(), DispatchMode::DispatcherBacked);
        self
    }

    /// Registers an entity type as carrying the self-auditing mixin.
    ///
    /// Kept inert if a dedicated dispatcher is (or later gets) registered
    /// for the same type.
    pub fn register_mixin(mut self, entity_type: impl Into<String>) -> Self {
        self.modes
            .entry(entity_type.into())
            .or_insert(DispatchMode::MixinBacked);
        self
    }

    /// Freezes the registrations into a read-only registry.
    pub fn build(self) -> DispatchRegistry {
        DispatchRegistry { modes: self.modes }
    }
}

/// Frozen entity-type-to-dispatch-mode table.
///
/// # Examples
///
/// ```
/// use audit_core::{DispatchMode, DispatchRegistryBuilder};
///
/// let registry = DispatchRegistryBuilder::new()
///     .register_dispatcher("app::Listing")
///     .register_mixin("app::Listing")   // inert: dispatcher wins
///     .register_mixin("app::Vendor")
///     .build();
///
/// assert_eq!(registry.mode("app::Listing"), DispatchMode::DispatcherBacked);
/// assert!(registry.should_use_mixin_dispatch("app::Vendor"));
/// assert!(!registry.should_use_mixin_dispatch("app::Listing"));
/// ```
#[derive(Debug, Default)]
pub struct DispatchRegistry {
    modes: BTreeMap<String, DispatchMode>,
}

impl DispatchRegistry {
    /// Returns the dispatch mode for an entity type.
    ///
    /// Unregistered types fall back to [`DispatchMode::NoDispatch`].
    pub fn mode(&self, entity_type: &str) -> DispatchMode {
        self.modes.get(entity_type).copied().unwrap_or_default()
    }

    /// Returns true if the self-auditing mixin should fire for this type.
    ///
    /// False whenever a dedicated dispatcher is registered, which is what
    /// keeps the mixin hook inert and prevents double-logging.
    pub fn should_use_mixin_dispatch(&self, entity_type: &str) -> bool {
        self.mode(entity_type) == DispatchMode::MixinBacked
    }
}
