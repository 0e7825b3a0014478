//! Integration test: bounded churn on membership changes.
//!
//! Adding or removing one shard should only move the keys adjacent to that
//! shard's virtual nodes, about `1/N` of the keyspace.

use shardring::Ring;
use shardring_integration_tests::{assignments, changed_fraction, ring_with, sample_keys};

/// replicas=5, DB1..DB3, then DB4 joins: at most about a quarter of keys
/// move, and every moved key moves to DB4.
#[test]
fn test_fourth_shard_takes_bounded_share() {
    let ring = ring_with(5, &["DB1", "DB2", "DB3"]);
    let keys = sample_keys(20_000);
    let alice_before = ring.get_shard("alice").cloned().unwrap();

    let mut grown = ring.clone();
    grown.add_shard("DB4");

    let moved = Ring::diff(&ring, &grown, &keys);
    let fraction = moved.len() as f64 / keys.len() as f64;
    // Five vnodes per shard is a coarse ring; allow wide slack around 1/4.
    assert!(
        fraction > 0.0 && fraction < 0.6,
        "moved fraction {fraction:.3} out of bounds"
    );
    assert!(moved.iter().all(|r| r.to == "DB4"));

    let alice_after = grown.get_shard("alice").unwrap();
    assert!(*alice_after == alice_before || *alice_after == "DB4");
}

#[test]
fn test_churn_shrinks_with_more_shards() {
    let keys = sample_keys(20_000);

    for n in [4usize, 8, 16] {
        let names: Vec<String> = (0..n).map(|i| format!("node-{i}")).collect();
        let mut ring = Ring::new(160).unwrap();
        for name in &names {
            ring.add_shard(name);
        }
        let before = assignments(&ring, &keys);

        ring.add_shard("newcomer");
        let after = assignments(&ring, &keys);

        let fraction = changed_fraction(&before, &after);
        let ideal = 1.0 / (n as f64 + 1.0);
        assert!(
            fraction < ideal * 1.6,
            "n={n}: moved {fraction:.3}, ideal {ideal:.3}"
        );
        assert!(fraction > ideal * 0.4, "n={n}: suspiciously few moves");
    }
}

#[test]
fn test_removal_only_moves_removed_shard_keys() {
    let ring = ring_with(100, &["a", "b", "c", "d", "e"]);
    let keys = sample_keys(10_000);

    let mut shrunk = ring.clone();
    shrunk.remove_shard("c");

    let moved = Ring::diff(&ring, &shrunk, &keys);
    assert!(!moved.is_empty());
    for r in &moved {
        assert_eq!(r.from, "c");
        assert_ne!(r.to, "c");
    }

    // Everything c owned went somewhere.
    let c_keys = ring.distribution(&keys)["c"];
    assert_eq!(moved.len(), c_keys);
}

#[test]
fn test_distribution_smooths_with_replicas() {
    let keys = sample_keys(20_000);
    let shards = ["a", "b", "c", "d"];

    let spread = |replicas: u32| {
        let dist = ring_with(replicas, &shards).distribution(&keys);
        let max = *dist.values().max().unwrap() as f64;
        let min = *dist.values().min().unwrap() as f64;
        max / min.max(1.0)
    };

    assert!(spread(256) < 1.5, "256 vnodes still skewed");
    assert!(spread(256) <= spread(1));
}
