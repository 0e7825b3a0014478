//! Consistent hashing ring for mapping keys to shards.
//!
//! This crate implements a consistent hash ring that maps arbitrary keys to
//! one of a dynamic set of shards (storage nodes, workers, partitions).
//! Adding or removing a shard only remaps the keys adjacent to that shard's
//! positions, roughly `1/N` of the keyspace.
//!
//! The ring uses virtual nodes (vnodes): each shard gets `replicas`
//! positions on a `u128` ring, determined by `blake3("{shard}:{index}")`.
//! More vnodes per shard = more uniform distribution.
//!
//! - [`Ring`] is the plain data structure, with no locking.
//! - [`SharedRing`] wraps it for concurrent use: lookups share a read lock,
//!   mutations publish a new immutable snapshot.
//!
//! ```
//! use shardring::Ring;
//!
//! let mut ring = Ring::new(5)?;
//! ring.add_shard("DB1");
//! ring.add_shard("DB2");
//!
//! let owner = ring.get_shard("alice").expect("ring is not empty");
//! assert!(owner == "DB1" || owner == "DB2");
//! # Ok::<(), shardring::RingError>(())
//! ```

mod config;
mod error;
pub mod hash;
mod ring;
mod shared;
mod types;

pub use config::{DEFAULT_REPLICAS, RingConfig};
pub use error::RingError;
pub use hash::Position;
pub use ring::{Reassignment, Ring};
pub use shared::SharedRing;
pub use types::ShardId;
