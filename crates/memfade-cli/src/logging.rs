// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Subscriber setup. Lines go to stderr as bare messages.

use std::env;
use std::io;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Crates whose events follow the `-v` count.
const TOOL_TARGETS: [&str; 3] = ["memfade_core", "memfade_cli", "memfade"];

/// Level name for a `-v` count: 0 is `info`, 1 is `debug`, more is `trace`.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Filter directives for a `-v` count; other crates stay at `warn`.
pub fn directives_for(verbosity: u8) -> String {
    let level = level_for(verbosity);
    let mut directives = String::from("warn");
    for target in TOOL_TARGETS {
        directives.push(',');
        directives.push_str(target);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}

/// Installs the global subscriber. `RUST_LOG`, when set, replaces the
/// verbosity-derived filter.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = if env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::try_from_default_env().context("invalid RUST_LOG")?
    } else {
        EnvFilter::try_new(directives_for(verbosity))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .with_level(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
