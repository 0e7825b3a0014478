//! Error types for the ring crate.

/// Errors produced when building a ring.
///
/// Lookups and membership changes never fail: an empty ring yields `None`
/// and removing an unknown shard is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// The ring parameters cannot produce a usable ring.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
