//! Consistent hashing ring implementation.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::RingError;
use crate::hash::{Position, key_position, vnode_position};
use crate::types::ShardId;

/// A key whose owner differs between two ring states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// The key that moved.
    pub key: String,
    /// The shard that owned it before the change.
    pub from: ShardId,
    /// The shard that owns it after the change.
    pub to: ShardId,
}

/// Consistent hashing ring mapping keys to shards.
///
/// Each shard is mapped to `replicas` virtual nodes on a `u128` ring. A key
/// belongs to the first virtual node at or after its own position, wrapping
/// past the top of the space back to the lowest position.
#[derive(Debug, Clone)]
pub struct Ring {
    /// Virtual node positions: ring position -> shard.
    vnodes: BTreeMap<Position, ShardId>,
    /// Active shards.
    shards: BTreeSet<ShardId>,
    /// Shards whose virtual node lost a collision, queued per position in
    /// arrival order.
    contested: BTreeMap<Position, Vec<ShardId>>,
    /// Virtual nodes per shard, fixed for the ring's lifetime.
    replicas: u32,
}

impl Ring {
    /// Create a new empty ring with `replicas` virtual nodes per shard.
    ///
    /// More replicas give a smoother key distribution at the cost of a larger
    /// ring to search.
    pub fn new(replicas: u32) -> Result<Self, RingError> {
        if replicas == 0 {
            return Err(RingError::InvalidConfiguration(
                "replicas must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            vnodes: BTreeMap::new(),
            shards: BTreeSet::new(),
            contested: BTreeMap::new(),
            replicas,
        })
    }

    /// Add a shard to the ring.
    ///
    /// Returns `false` and leaves the ring untouched when the shard is
    /// already a member.
    pub fn add_shard(&mut self, shard_id: impl Into<ShardId>) -> bool {
        let shard_id = shard_id.into();
        if self.shards.contains(&shard_id) {
            debug!(shard = %shard_id, "shard already in ring, ignoring add");
            return false;
        }

        let mut placed = 0u32;
        for i in 0..self.replicas {
            let pos = vnode_position(shard_id.as_str(), i);
            if self.occupy(pos, &shard_id) {
                placed += 1;
            }
        }

        debug!(shard = %shard_id, vnodes = placed, "added shard to ring");
        self.shards.insert(shard_id);
        true
    }

    /// Remove a shard and all of its virtual nodes.
    ///
    /// Returns `false` if the shard was not a member.
    pub fn remove_shard(&mut self, shard_id: &str) -> bool {
        if !self.shards.remove(shard_id) {
            return false;
        }

        for i in 0..self.replicas {
            self.release(vnode_position(shard_id, i), shard_id);
        }

        debug!(shard = %shard_id, "removed shard from ring");
        true
    }

    /// Return the shard owning `key`, or `None` if the ring is empty.
    pub fn get_shard(&self, key: impl AsRef<[u8]>) -> Option<&ShardId> {
        self.locate(key_position(key.as_ref()))
    }

    /// Return the owner of the first virtual node at or after `pos`.
    ///
    /// Wraps around to the lowest position when `pos` is past every stored
    /// virtual node.
    pub fn locate(&self, pos: Position) -> Option<&ShardId> {
        self.vnodes
            .range(pos..)
            .next()
            .or_else(|| self.vnodes.iter().next())
            .map(|(_, shard_id)| shard_id)
    }

    /// Return up to `count` distinct shards responsible for `key`.
    ///
    /// Walks clockwise from the key's position. The first entry is the
    /// primary owner (the same as [`Ring::get_shard`]); if fewer than `count`
    /// shards exist, all of them are returned.
    pub fn owners(&self, key: impl AsRef<[u8]>, count: usize) -> Vec<ShardId> {
        if self.vnodes.is_empty() || count == 0 {
            return Vec::new();
        }

        let pos = key_position(key.as_ref());
        let max_distinct = count.min(self.shards.len());
        let mut owners: Vec<ShardId> = Vec::with_capacity(max_distinct);

        let after = self.vnodes.range(pos..);
        let before = self.vnodes.range(..pos);

        for (_, shard_id) in after.chain(before) {
            if !owners.contains(shard_id) {
                owners.push(shard_id.clone());
                if owners.len() == max_distinct {
                    break;
                }
            }
        }

        owners
    }

    /// Compute which keys change owner between two ring states.
    ///
    /// Keys unowned in either ring (an empty ring) are not reported.
    pub fn diff<I, K>(old: &Ring, new: &Ring, keys: I) -> Vec<Reassignment>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut moved = Vec::new();

        for key in keys {
            let key = key.as_ref();
            if let (Some(from), Some(to)) = (old.get_shard(key), new.get_shard(key)) {
                if from != to {
                    moved.push(Reassignment {
                        key: key.to_string(),
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        moved
    }

    /// Count how many of `keys` land on each shard.
    ///
    /// Shards that receive no key still appear with a count of zero.
    pub fn distribution<I, K>(&self, keys: I) -> BTreeMap<ShardId, usize>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut counts: BTreeMap<ShardId, usize> =
            self.shards.iter().map(|s| (s.clone(), 0)).collect();

        for key in keys {
            if let Some(shard_id) = self.get_shard(key) {
                *counts.entry(shard_id.clone()).or_insert(0) += 1;
            }
        }

        counts
    }

    /// Fraction of the hash space owned by each shard.
    ///
    /// A virtual node owns the arc running from its predecessor (exclusive)
    /// up to itself (inclusive). Fractions sum to 1.0 on a non-empty ring.
    pub fn ownership(&self) -> BTreeMap<ShardId, f64> {
        let mut fractions: BTreeMap<ShardId, f64> =
            self.shards.iter().map(|s| (s.clone(), 0.0)).collect();

        let Some((&last, _)) = self.vnodes.iter().next_back() else {
            return fractions;
        };

        if self.vnodes.len() == 1 {
            if let Some(owner) = self.vnodes.values().next() {
                fractions.insert(owner.clone(), 1.0);
            }
            return fractions;
        }

        const SPACE: f64 = 340_282_366_920_938_463_463_374_607_431_768_211_456.0; // 2^128
        let mut prev = last;
        for (&pos, shard_id) in &self.vnodes {
            let arc = pos.wrapping_sub(prev) as f64 / SPACE;
            *fractions.entry(shard_id.clone()).or_insert(0.0) += arc;
            prev = pos;
        }

        fractions
    }

    /// Return the number of virtual nodes per shard.
    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// Return the number of shards in the ring.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Return the total number of virtual nodes in the ring.
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }

    /// Whether the ring has no shards.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Whether `shard_id` is a member of the ring.
    pub fn contains_shard(&self, shard_id: &str) -> bool {
        self.shards.contains(shard_id)
    }

    /// Iterate over member shards in sorted order.
    pub fn shards(&self) -> impl Iterator<Item = &ShardId> {
        self.shards.iter()
    }

    /// Iterate over virtual nodes in ascending position order.
    pub fn vnodes(&self) -> impl Iterator<Item = (Position, &ShardId)> {
        self.vnodes.iter().map(|(&pos, shard_id)| (pos, shard_id))
    }

    /// Claim `pos` for `shard_id`. First writer wins: an occupied position
    /// is left with its current owner and `shard_id` queues for it, taking
    /// it over once the owner leaves (see [`Ring::release`]).
    fn occupy(&mut self, pos: Position, shard_id: &ShardId) -> bool {
        match self.vnodes.get(&pos) {
            Some(owner) => {
                warn!(
                    shard = %shard_id,
                    owner = %owner,
                    position = %pos,
                    "virtual node collision, keeping existing owner"
                );
                self.contested
                    .entry(pos)
                    .or_default()
                    .push(shard_id.clone());
                false
            }
            None => {
                self.vnodes.insert(pos, shard_id.clone());
                true
            }
        }
    }

    /// Give up `shard_id`'s claim on `pos`.
    ///
    /// If it owned the position, the longest-waiting shard that lost a
    /// collision there takes it over; otherwise `shard_id` leaves the queue.
    fn release(&mut self, pos: Position, shard_id: &str) {
        if self.vnodes.get(&pos).is_some_and(|owner| owner == shard_id) {
            self.vnodes.remove(&pos);

            let Some(mut waiting) = self.contested.remove(&pos) else {
                return;
            };
            if !waiting.is_empty() {
                let heir = waiting.remove(0);
                debug!(shard = %heir, position = %pos, "reclaimed contested virtual node");
                self.vnodes.insert(pos, heir);
            }
            if !waiting.is_empty() {
                self.contested.insert(pos, waiting);
            }
        } else if let Some(waiting) = self.contested.get_mut(&pos) {
            waiting.retain(|s| s != shard_id);
            if waiting.is_empty() {
                self.contested.remove(&pos);
            }
        }
    }
}
