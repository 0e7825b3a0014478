//! TOML configuration for the `shardring` CLI.
//!
//! ```toml
//! [ring]
//! replicas = 5
//! shards = ["DB1", "DB2", "DB3"]
//!
//! [log]
//! level = "debug"
//! ```

use std::path::Path;

use serde::Deserialize;
use shardring::RingConfig;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Ring parameters and initial shards.
    pub ring: RingConfig,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the file values.
    ///
    /// Shards given on the command line replace the configured list.
    pub fn apply_overrides(&mut self, replicas: Option<u32>, shards: Vec<String>) {
        if let Some(replicas) = replicas {
            self.ring.replicas = replicas;
        }
        if !shards.is_empty() {
            self.ring.shards = shards;
        }
    }
}
