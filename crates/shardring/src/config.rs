//! Ring configuration.

use serde::Deserialize;

use crate::error::RingError;
use crate::ring::Ring;

/// Virtual nodes per shard when not configured.
pub const DEFAULT_REPLICAS: u32 = 3;

/// Ring parameters and initial membership, typically a `[ring]` TOML table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Virtual nodes per shard.
    pub replicas: u32,
    /// Shards added, in order, when the ring is built.
    pub shards: Vec<String>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            shards: Vec::new(),
        }
    }
}

impl RingConfig {
    /// Check the parameters without building a ring.
    pub fn validate(&self) -> Result<(), RingError> {
        if self.replicas == 0 {
            return Err(RingError::InvalidConfiguration(
                "replicas must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a ring holding the configured shards.
    pub fn build(&self) -> Result<Ring, RingError> {
        self.validate()?;
        let mut ring = Ring::new(self.replicas)?;
        for shard in &self.shards {
            ring.add_shard(shard);
        }
        Ok(ring)
    }
}
