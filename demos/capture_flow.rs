//! Capture pipeline demonstration.
//!
//! This example walks the full flow:
//! 1. Configure policy with per-type redactions
//! 2. Capture create/update/delete lifecycle events
//! 3. Show no-op suppression and batch correlation
//!
//! Run with: `cargo run --example capture_flow`

use std::sync::Arc;

use audit_core::{
    Actor, AttributeMap, AuditStore, CaptureContext, CaptureOptions, EntityChange, EventKind,
    MemoryStore, PolicyStore, Recorder, TypePolicy, Value,
};
use uuid::Uuid;

fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn main() {
    tracing_subscriber::fmt().with_target(true).init();

    println!("=== Capture Flow Example ===\n");

    let policy = PolicyStore::new().override_for(
        "app::Listing",
        TypePolicy::new()
            .exclude_field("internal_notes")
            .with_tag("marketplace"),
    );
    let store = Arc::new(MemoryStore::new());
    let recorder = Recorder::new(policy, store.clone() as Arc<dyn AuditStore>);
    let admin = CaptureContext::for_actor(Actor::new("42", "admin"));

    // Scenario 1: creation. The excluded field never reaches the trail.
    println!("--- Scenario 1: Creation with redaction ---");
    let record = recorder
        .capture(
            &EntityChange::new("app::Listing").with_id("7").with_after(attrs(&[
                ("title", "Vintage desk".into()),
                ("price", 100.into()),
                ("internal_notes", "check provenance".into()),
            ])),
            EventKind::Created,
            &admin,
            CaptureOptions::new(),
        )
        .unwrap()
        .expect("created events are captured");
    println!(
        "✓ Recorded creation, new_values keys: {:?}",
        record.new_values().unwrap().keys().collect::<Vec<_>>()
    );

    // Scenario 2: a real update.
    println!("\n--- Scenario 2: Price update ---");
    recorder
        .capture(
            &EntityChange::new("app::Listing")
                .with_id("7")
                .with_before(attrs(&[("price", 100.into())]))
                .with_after(attrs(&[("price", 120.into())])),
            EventKind::Updated,
            &admin,
            CaptureOptions::new(),
        )
        .unwrap()
        .expect("price changed");
    println!("✓ Recorded price change");

    // Scenario 3: only the excluded field changed; nothing is persisted.
    println!("\n--- Scenario 3: No-op update suppression ---");
    let suppressed = recorder
        .capture(
            &EntityChange::new("app::Listing")
                .with_id("7")
                .with_before(attrs(&[("internal_notes", "a".into())]))
                .with_after(attrs(&[("internal_notes", "b".into())])),
            EventKind::Updated,
            &admin,
            CaptureOptions::new(),
        )
        .unwrap();
    println!("✓ Suppressed: {}", suppressed.is_none());

    // Scenario 4: batch-correlated import.
    println!("\n--- Scenario 4: Batch correlation ---");
    let batch = Uuid::new_v4();
    for id in ["8", "9", "10"] {
        recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id(id)
                    .with_after(attrs(&[("title", "imported".into())])),
                EventKind::Created,
                &CaptureContext::system(),
                CaptureOptions::new().with_batch_id(batch).with_tag("import"),
            )
            .unwrap();
    }
    println!("✓ Imported 3 listings under batch {batch}");

    println!("\nTrail now holds {} records", store.len());
}
