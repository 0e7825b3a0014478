//! `shardring` — inspect consistent hashing placement from the command line.
//!
//! # Usage
//!
//! ```text
//! shardring map -s DB1 -s DB2 -s DB3 alice bob      # where do these keys go?
//! shardring -c ring.toml map < keys.txt             # keys from stdin
//! shardring -s DB1 -s DB2 -s DB3 churn --add DB4    # how many keys move?
//! shardring -r 128 -s a -s b -s c balance           # load per shard
//! ```

mod config;

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shardring::{Ring, ShardId};
use tracing::{debug, info};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "shardring",
    version,
    about = "Map keys to shards with a consistent hashing ring"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Virtual nodes per shard (overrides `[ring] replicas`).
    #[arg(short, long, global = true)]
    replicas: Option<u32>,

    /// Shard to place on the ring. Can be specified multiple times and
    /// replaces `[ring] shards`.
    #[arg(short, long = "shard", global = true)]
    shards: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the owning shard of each key.
    Map {
        /// Keys to look up. Read one per line from stdin when omitted.
        keys: Vec<String>,
    },

    /// Measure how many keys move after a membership change.
    Churn {
        /// Shard(s) to add.
        #[arg(long)]
        add: Vec<String>,

        /// Shard(s) to remove.
        #[arg(long)]
        remove: Vec<String>,

        /// Number of generated keys to sample.
        #[arg(short = 'n', long, default_value = "10000")]
        sample: usize,
    },

    /// Show key counts and hash-space ownership per shard.
    Balance {
        /// Number of generated keys to sample.
        #[arg(short = 'n', long, default_value = "10000")]
        sample: usize,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;
    config.apply_overrides(cli.replicas, cli.shards);

    setup_tracing(&config.log.level);

    let ring = config.ring.build().context("invalid ring configuration")?;
    info!(
        replicas = ring.replicas(),
        shards = ring.shard_count(),
        vnodes = ring.vnode_count(),
        "ring built"
    );

    match cli.command {
        Commands::Map { keys } => cmd_map(&ring, keys),
        Commands::Churn {
            add,
            remove,
            sample,
        } => {
            cmd_churn(&ring, &add, &remove, sample);
            Ok(())
        }
        Commands::Balance { sample } => {
            cmd_balance(&ring, sample);
            Ok(())
        }
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Keys `key-0`, `key-1`, ... used for sampling.
fn sample_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{i}")).collect()
}

fn owner_label(owner: Option<&ShardId>) -> &str {
    owner.map_or("(none)", ShardId::as_str)
}

// -----------------------------------------------------------------------
// shardring map
// -----------------------------------------------------------------------

fn cmd_map(ring: &Ring, keys: Vec<String>) -> Result<()> {
    let keys = if keys.is_empty() {
        debug!("reading keys from stdin");
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("failed to read keys from stdin")?
    } else {
        keys
    };

    for key in keys.iter().filter(|k| !k.is_empty()) {
        println!("{key} -> {}", owner_label(ring.get_shard(key)));
    }

    Ok(())
}

// -----------------------------------------------------------------------
// shardring churn
// -----------------------------------------------------------------------

fn cmd_churn(ring: &Ring, add: &[String], remove: &[String], sample: usize) {
    let mut next = ring.clone();
    for shard in remove {
        if !next.remove_shard(shard) {
            println!("note: {shard} is not in the ring");
        }
    }
    for shard in add {
        if !next.add_shard(shard) {
            println!("note: {shard} is already in the ring");
        }
    }

    let keys = sample_keys(sample);
    let moved = Ring::diff(ring, &next, &keys);

    let mut flows: BTreeMap<(ShardId, ShardId), usize> = BTreeMap::new();
    for r in &moved {
        *flows.entry((r.from.clone(), r.to.clone())).or_insert(0) += 1;
    }

    let fraction = if sample == 0 {
        0.0
    } else {
        moved.len() as f64 / sample as f64
    };
    let widest = ring.shard_count().max(next.shard_count()).max(1);
    let expected = ((add.len() + remove.len()) as f64 / widest as f64).min(1.0);

    println!("Shards: {} -> {}", ring.shard_count(), next.shard_count());
    println!(
        "Moved: {}/{sample} keys ({:.2}%, ideal ~{:.2}%)",
        moved.len(),
        fraction * 100.0,
        expected * 100.0,
    );
    for ((from, to), count) in &flows {
        println!("  {from} -> {to}: {count}");
    }
}

// -----------------------------------------------------------------------
// shardring balance
// -----------------------------------------------------------------------

fn cmd_balance(ring: &Ring, sample: usize) {
    if ring.is_empty() {
        println!("Ring is empty");
        return;
    }

    let counts = ring.distribution(sample_keys(sample));
    let ownership = ring.ownership();
    let ideal = 100.0 / ring.shard_count() as f64;

    println!(
        "Shards: {}  vnodes: {}  (ideal share {ideal:.2}%)",
        ring.shard_count(),
        ring.vnode_count()
    );
    for (shard, count) in &counts {
        let share = ownership.get(shard).copied().unwrap_or(0.0) * 100.0;
        let keys_pct = if sample == 0 {
            0.0
        } else {
            *count as f64 * 100.0 / sample as f64
        };
        println!("  {shard}: {count} keys ({keys_pct:.2}%), owns {share:.2}% of ring");
    }
}
