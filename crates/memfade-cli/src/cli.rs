// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Command-line surface of `memfade`.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use memfade_core::{ConfigError, ConfigFile, TestConfig};

/// Flags accepted by `memfade`.
///
/// Every test parameter is optional here; unset flags fall back to the
/// config file (if any) and then to the built-in defaults.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "memfade",
    author,
    version,
    about = "Stress-test physical memory with a deterministic fill/fade/verify pattern",
    long_about = "Fills memory blocks with a pseudo-random pattern, optionally waits for \
                  charge-decay effects, then regenerates the pattern and compares every \
                  word. Any mismatch fails the run. Ctrl-C stops after the next comparison; \
                  a second Ctrl-C exits immediately."
)]
pub struct Cli {
    /// Memory blocks per check (1..=65535) [default: 10]
    #[arg(short = 'n', long = "blocks", value_name = "N")]
    pub num_of_blocks: Option<u64>,

    /// Bytes per block, rounded down to a multiple of 4 [default: 1048576]
    #[arg(short = 's', long = "block-size", value_name = "BYTES")]
    pub size_per_block: Option<u64>,

    /// Seconds to wait before each comparison (0..=65535) [default: 0]
    #[arg(short = 'd', long = "fade", value_name = "SECONDS")]
    pub fade_seconds: Option<u64>,

    /// Comparisons per fill [default: 1]
    #[arg(short = 'r', long = "read-iterations", value_name = "N")]
    pub read_iterations: Option<u64>,

    /// Fill/compare cycles; unbounded when omitted
    #[arg(short = 'i', long = "iterations", value_name = "N")]
    pub total_iterations: Option<u64>,

    /// Parallel checks, one thread each (1..=65535) [default: 1]
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub instances: Option<u64>,

    /// More output; repeat for more detail
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// JSON file with default settings; flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Resolves defaults, config file and flags into a validated config.
    pub fn to_config(&self) -> Result<TestConfig, ConfigError> {
        let mut builder = TestConfig::builder();
        if let Some(path) = &self.config {
            builder = ConfigFile::load(path)?.apply(builder);
        }
        if let Some(seconds) = self.fade_seconds {
            builder = builder.fade_seconds(seconds);
        }
        if let Some(count) = self.num_of_blocks {
            builder = builder.num_of_blocks(count);
        }
        if let Some(bytes) = self.size_per_block {
            builder = builder.size_per_block(bytes);
        }
        if let Some(count) = self.total_iterations {
            builder = builder.total_iterations(count);
        }
        if let Some(count) = self.read_iterations {
            builder = builder.read_iterations(count);
        }
        if let Some(count) = self.instances {
            builder = builder.instances(count);
        }
        builder.build()
    }
}
