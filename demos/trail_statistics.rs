//! Query and statistics facade demonstration.
//!
//! Run with: `cargo run --example trail_statistics`

use std::sync::Arc;

use audit_core::{
    Actor, AttributeMap, AuditQuery, AuditStore, CaptureContext, CaptureOptions, EntityChange,
    EventKind, MemoryStore, PolicyStore, Recorder, Value,
};

fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn main() {
    println!("=== Trail Statistics Example ===\n");

    let store = Arc::new(MemoryStore::new());
    let recorder = Recorder::new(PolicyStore::new(), store as Arc<dyn AuditStore>);

    let alice = CaptureContext::for_actor(Actor::new("1", "admin"));
    let bob = CaptureContext::for_actor(Actor::new("2", "admin"));

    recorder
        .capture(
            &EntityChange::new("app::Listing")
                .with_id("7")
                .with_after(attrs(&[("price", 100.into())])),
            EventKind::Created,
            &alice,
            CaptureOptions::new(),
        )
        .unwrap();
    for (ctx, from, to) in [(&alice, 100, 110), (&bob, 110, 95), (&bob, 95, 120)] {
        recorder
            .capture(
                &EntityChange::new("app::Listing")
                    .with_id("7")
                    .with_before(attrs(&[("price", from.into())]))
                    .with_after(attrs(&[("price", to.into())])),
                EventKind::Updated,
                ctx,
                CaptureOptions::new(),
            )
            .unwrap();
    }

    let updates = recorder
        .find(
            &AuditQuery::new()
                .for_entity("app::Listing", "7")
                .by_event(EventKind::Updated),
        )
        .unwrap();
    println!("Updates on listing 7: {}", updates.len());
    for record in &updates {
        println!(
            "  by actor {:?}: {:?} -> {:?}",
            record.actor_id(),
            record.old_values().unwrap()["price"],
            record.new_values().unwrap()["price"],
        );
    }

    let stats = recorder.stats_for("app::Listing", 30).unwrap();
    println!("\nLast 30 days for app::Listing:");
    println!("  total events:   {}", stats.total_events());
    println!("  unique actors:  {}", stats.unique_actor_count());
    for (kind, count) in stats.counts_by_kind() {
        println!("  {kind}: {count}");
    }
    for (day, count) in stats.events_by_day() {
        println!("  {day}: {count} events");
    }
}
