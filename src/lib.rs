//! Audit change-capture pipeline for back-office applications.
//!
//! This crate turns entity lifecycle events (create, update, delete,
//! restore, permanent delete) into durable, queryable audit trail entries:
//!
//! - **Policy**: per-entity-type rules decide which events are captured,
//!   which fields are redacted, and which tags are applied
//! - **Redaction**: sensitive fields never reach the persisted record
//! - **No-op suppression**: updates that change nothing after redaction are
//!   silently dropped instead of flooding the trail
//! - **Single dispatch**: a startup-time registry guarantees exactly one
//!   capture path per entity type, even when two attachment mechanisms exist
//! - **Query facade**: composable filters and aggregate statistics over the
//!   persisted trail
//!
//! # Core Types
//!
//! - [`Recorder`]: the pipeline; `capture` is the single entry point
//! - [`PolicyStore`] / [`TypePolicy`]: global defaults and per-type overrides
//! - [`EntityChange`] / [`CaptureContext`]: what happened, and who did it
//! - [`AuditRecord`]: the immutable persisted unit
//! - [`AuditStore`] / [`MemoryStore`]: the persistence seam
//! - [`AuditQuery`] / [`EntityStats`]: the read side
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use audit_core::{
//!     Actor, AttributeMap, CaptureContext, CaptureOptions, EntityChange, EventKind,
//!     MemoryStore, PolicyStore, Recorder, TypePolicy, Value,
//! };
//!
//! let policy = PolicyStore::new()
//!     .override_for("app::Listing", TypePolicy::new().exclude_field("internal_notes"));
//! let recorder = Recorder::new(policy, Arc::new(MemoryStore::new()));
//!
//! let mut before = AttributeMap::new();
//! before.insert("price".to_string(), Value::from(100));
//! let mut after = AttributeMap::new();
//! after.insert("price".to_string(), Value::from(120));
//!
//! let record = recorder
//!     .capture(
//!         &EntityChange::new("app::Listing").with_id("7").with_before(before).with_after(after),
//!         EventKind::Updated,
//!         &CaptureContext::for_actor(Actor::new("42", "admin")),
//!         CaptureOptions::new(),
//!     )
//!     .unwrap()
//!     .expect("a real change is captured");
//!
//! assert_eq!(record.new_values().unwrap()["price"], Value::Int(120));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod compare;
mod context;
mod dispatch;
mod error;
mod event;
mod extract;
mod policy;
mod query;
mod record;
mod recorder;
mod redact;
mod store;
mod value;

pub use compare::{structurally_equal, values_equal};
pub use context::{Actor, CaptureContext, RequestInfo};
pub use dispatch::{DispatchMode, DispatchRegistry, DispatchRegistryBuilder};
pub use error::CaptureError;
pub use event::EventKind;
pub use extract::{extract_changes, snapshot_side, SnapshotSide};
pub use policy::{
    EffectivePolicy, PolicyCell, PolicyStore, TypePolicy, GLOBAL_EXCLUDED_FIELDS,
};
pub use query::{AuditQuery, EntityStats};
pub use record::{AuditRecord, CaptureOptions};
pub use recorder::{EntityChange, Recorder};
pub use redact::redact;
pub use store::{AuditStore, MemoryStore, QueuedStore, RecordId, StoreError, StoreErrorKind};
pub use value::{AttributeMap, Value};
