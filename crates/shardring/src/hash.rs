//! Hash-space positions.
//!
//! Keys and virtual nodes are placed on a circular `u128` space: the first
//! 16 bytes of their BLAKE3 digest, read big-endian. The encoding is fixed so
//! placement is identical across processes and platforms.

/// A point on the ring.
pub type Position = u128;

/// Position of an arbitrary key.
pub fn key_position(key: &[u8]) -> Position {
    digest_position(&blake3::hash(key))
}

/// Position of a virtual node: `hash("{shard}:{replica}")`.
pub fn vnode_position(shard: &str, replica: u32) -> Position {
    let mut hasher = blake3::Hasher::new();
    hasher.update(shard.as_bytes());
    hasher.update(b":");
    hasher.update(replica.to_string().as_bytes());
    digest_position(&hasher.finalize())
}

fn digest_position(hash: &blake3::Hash) -> Position {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash.as_bytes()[..16]);
    u128::from_be_bytes(bytes)
}
