//! Integration test: concurrent readers and writers on a shared ring.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use shardring::{SharedRing, ShardId};
use shardring_integration_tests::{assignments, ring_with, sample_keys};

#[test]
#[ntest::timeout(30000)]
fn test_readers_never_see_partial_add() {
    let stable = ring_with(64, &["a", "b", "c"]);
    let mut grown = stable.clone();
    grown.add_shard("d");

    let keys = sample_keys(200);
    let before = assignments(&stable, &keys);
    let after = assignments(&grown, &keys);

    let shared = SharedRing::from_ring(stable);
    let done = Arc::new(AtomicBool::new(false));

    thread::scope(|s| {
        for _ in 0..4 {
            let shared = shared.clone();
            let done = Arc::clone(&done);
            let (keys, before, after) = (&keys, &before, &after);
            s.spawn(move || {
                while !done.load(Ordering::Acquire) {
                    // A snapshot is one whole ring: either all old or all new.
                    let snap = shared.snapshot();
                    let seen = assignments(&snap, keys);
                    assert!(seen == *before || seen == *after, "torn ring observed");
                }
            });
        }

        let shared = shared.clone();
        let done = Arc::clone(&done);
        s.spawn(move || {
            for _ in 0..200 {
                shared.add_shard("d");
                shared.remove_shard("d");
            }
            done.store(true, Ordering::Release);
        });
    });
}

#[test]
#[ntest::timeout(30000)]
fn test_batched_update_is_atomic() {
    let shared = SharedRing::new(32).unwrap();
    shared.update(|r| {
        r.add_shard("x");
        r.add_shard("y");
    });

    let done = Arc::new(AtomicBool::new(false));

    thread::scope(|s| {
        let reader = shared.clone();
        let reader_done = Arc::clone(&done);
        s.spawn(move || {
            while !reader_done.load(Ordering::Acquire) {
                let snap = reader.snapshot();
                // Shards move in pairs, so the count is always even.
                assert_eq!(snap.shard_count() % 2, 0);
                assert_eq!(snap.vnode_count(), snap.shard_count() * 32);
            }
        });

        let writer = shared.clone();
        let writer_done = Arc::clone(&done);
        s.spawn(move || {
            for i in 0..100 {
                writer.update(|r| {
                    r.add_shard(format!("p{i}"));
                    r.add_shard(format!("q{i}"));
                });
                if i % 2 == 1 {
                    writer.update(|r| {
                        r.remove_shard(&format!("p{i}"));
                        r.remove_shard(&format!("q{i}"));
                    });
                }
            }
            writer_done.store(true, Ordering::Release);
        });
    });

    assert_eq!(shared.shard_count(), 2 + 2 * 50);
}

#[test]
#[ntest::timeout(30000)]
fn test_parallel_lookups_agree() {
    let shared = SharedRing::from_ring(ring_with(64, &["a", "b", "c", "d"]));
    let keys = sample_keys(1_000);
    let expected: Vec<Option<ShardId>> = keys.iter().map(|k| shared.get_shard(k)).collect();

    thread::scope(|s| {
        for _ in 0..8 {
            let shared = shared.clone();
            let (keys, expected) = (&keys, &expected);
            s.spawn(move || {
                let seen: Vec<Option<ShardId>> = keys.iter().map(|k| shared.get_shard(k)).collect();
                assert_eq!(&seen, expected);
            });
        }
    });
}
