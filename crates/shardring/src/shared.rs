//! Thread-safe ring handle.
//!
//! [`SharedRing`] is the shared, read-mostly view of a [`Ring`] that many
//! lookup callers hit concurrently while membership changes arrive rarely.
//! The current ring is published as an immutable `Arc<Ring>` snapshot:
//! lookups only take a read lock, and mutations are applied to a private copy
//! that is swapped in whole once complete, so no reader ever observes a
//! half-applied change.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::RingError;
use crate::ring::Ring;
use crate::types::ShardId;

/// Shared, cloneable handle to a ring.
///
/// Clones share the same underlying ring.
#[derive(Clone)]
pub struct SharedRing {
    current: Arc<RwLock<Arc<Ring>>>,
    /// Serializes writers so concurrent updates cannot drop each other's
    /// changes.
    writer: Arc<Mutex<()>>,
}

impl SharedRing {
    /// Create a handle around a new empty ring.
    pub fn new(replicas: u32) -> Result<Self, RingError> {
        Ok(Self::from_ring(Ring::new(replicas)?))
    }

    /// Wrap an existing ring.
    pub fn from_ring(ring: Ring) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(ring))),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Return the current ring snapshot.
    ///
    /// The snapshot is immutable; later membership changes publish a new
    /// ring and leave this one untouched.
    pub fn snapshot(&self) -> Arc<Ring> {
        Arc::clone(&self.current.read())
    }

    /// Return the shard owning `key`, or `None` if the ring is empty.
    pub fn get_shard(&self, key: impl AsRef<[u8]>) -> Option<ShardId> {
        self.current.read().get_shard(key).cloned()
    }

    /// Return up to `count` distinct shards responsible for `key`.
    pub fn owners(&self, key: impl AsRef<[u8]>, count: usize) -> Vec<ShardId> {
        self.current.read().owners(key, count)
    }

    /// Add a shard. Returns `false` if it was already present.
    pub fn add_shard(&self, shard_id: impl Into<ShardId>) -> bool {
        let shard_id = shard_id.into();
        self.update(|ring| ring.add_shard(shard_id))
    }

    /// Remove a shard. Returns `false` if it was not present.
    pub fn remove_shard(&self, shard_id: &str) -> bool {
        self.update(|ring| ring.remove_shard(shard_id))
    }

    /// Apply a batch of changes and publish them as one new ring.
    ///
    /// `f` works on a copy of the current ring; the copy is published only
    /// after `f` returns. Readers see either the ring before `f` ran or the
    /// ring after it, and a panic inside `f` publishes nothing.
    pub fn update<R>(&self, f: impl FnOnce(&mut Ring) -> R) -> R {
        let _writer = self.writer.lock();
        let mut next = Ring::clone(&self.snapshot());
        let result = f(&mut next);
        *self.current.write() = Arc::new(next);
        result
    }

    /// Return the number of shards in the ring.
    pub fn shard_count(&self) -> usize {
        self.current.read().shard_count()
    }

    /// Return the number of virtual nodes per shard.
    pub fn replicas(&self) -> u32 {
        self.current.read().replicas()
    }
}

impl From<Ring> for SharedRing {
    fn from(ring: Ring) -> Self {
        Self::from_ring(ring)
    }
}

impl std::fmt::Debug for SharedRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.current.read();
        f.debug_struct("SharedRing")
            .field("replicas", &ring.replicas())
            .field("shards", &ring.shard_count())
            .finish_non_exhaustive()
    }
}
