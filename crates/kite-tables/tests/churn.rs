//! Churn tests for kite-tables
//!
//! These tests exercise the tables the way a busy forwarder does: entries
//! created and reclaimed in bulk while tokens to them are still held
//! elsewhere.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use kite_core::{Face, FaceId, Interest, MobileProducerInfo, Name};
use kite_tables::{Fib, Measurements, Pit};

fn name(uri: &str) -> Name {
    Name::parse(uri).unwrap()
}

// ============================================================================
// PIT Token Liveness
// ============================================================================

/// Tokens held across slot reuse must never resolve to the new occupant
#[test]
fn test_stale_tokens_survive_slot_reuse() {
    let mut pit = Pit::new();
    let rounds = 50;
    let per_round = 200;
    let mut stale = Vec::new();

    for round in 0..rounds {
        let tokens: Vec<_> = (0..per_round)
            .map(|i| pit.insert(&Interest::new(name(&format!("/mp/{}/{}", round, i)))).0)
            .collect();

        for token in &stale {
            assert!(pit.get(*token).is_none(), "stale token {} resolved", token);
        }

        for token in &tokens {
            pit.remove(*token).expect("live token must be removable");
        }
        stale.extend(tokens);
    }

    assert!(pit.is_empty());
    // Slots were reused, not leaked
    let indices: HashSet<_> = stale.iter().map(|t| t.index).collect();
    assert_eq!(indices.len(), per_round);
}

/// A producer replay map that outlives its entries resolves nothing
#[test]
fn test_replay_map_after_reclaim() {
    let now = Instant::now();
    let mut pit = Pit::new();
    let mut info = MobileProducerInfo::new(name("/mp"));

    for i in 0..100 {
        let interest = Interest::new(name(&format!("/mp/{}", i)));
        let (token, _) = pit.insert(&interest);
        pit.get_mut(token)
            .unwrap()
            .insert_or_update_in_record(Face::remote(1), &interest, now);
        info.track(interest.name.clone(), token);
    }

    // Reclaim every other entry
    for (name, token) in info.pending_tokens() {
        let index: u32 = name.get(1).unwrap().parse().unwrap();
        if index % 2 == 0 {
            pit.remove(token).unwrap();
        }
    }

    let live = info
        .pending_tokens()
        .into_iter()
        .filter(|(_, token)| pit.contains(*token))
        .count();
    assert_eq!(live, 50);
}

// ============================================================================
// FIB and Measurements
// ============================================================================

#[test]
fn test_fib_lookup_after_face_churn() {
    let mut fib = Fib::new();
    for face in 0..20u64 {
        fib.insert(name("/mp"), FaceId(face), face);
        fib.insert(name(&format!("/mp/{}", face)), FaceId(face), 0);
    }

    for face in (0..20u64).filter(|f| f % 2 == 1) {
        fib.remove_face(FaceId(face));
    }

    // Odd faces are gone; their specific prefixes fall back to /mp
    let entry = fib.find_longest_prefix_match(&name("/mp/3/data"));
    assert_eq!(entry.prefix(), &name("/mp"));
    assert_eq!(entry.next_hops().len(), 10);
    assert_eq!(entry.next_hops()[0].face, FaceId(0));

    let entry = fib.find_longest_prefix_match(&name("/mp/4/data"));
    assert_eq!(entry.prefix(), &name("/mp/4"));
}

#[test]
fn test_measurements_expiry_sweep() {
    let now = Instant::now();
    let mut table = Measurements::new();
    for i in 0..100u64 {
        let prefix = name(&format!("/mp/{}", i));
        table.get_or_insert(&prefix, now);
        table
            .extend_lifetime(&prefix, Duration::from_secs(i), now)
            .unwrap();
    }

    // Entries with lifetime <= 4s keep the default 4s expiry
    let removed = table.cleanup(now + Duration::from_secs(50));
    assert_eq!(removed, 51);
    assert_eq!(table.len(), 49);
}
