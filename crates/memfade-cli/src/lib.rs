// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! memfade-cli: the `memfade` command.
//!
//! Turns flags and an optional JSON config file into a
//! [`TestConfig`](memfade_core::TestConfig), wires Ctrl-C to a
//! [`CancelToken`], runs the engine and maps the aggregate result to an exit
//! status.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn
)]

pub mod cli;
pub mod interrupt;
pub mod logging;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use memfade_core::{CancelToken, InstanceOutcome, RunReport, TestConfig};
use tracing::{debug, error, info};

pub use cli::Cli;

/// Runs `memfade` for parsed flags. Logging must already be initialised.
///
/// Configuration problems are returned as errors before any test runs;
/// test failures become [`ExitCode::FAILURE`].
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.to_config().context("invalid configuration")?;

    if cli.print_config {
        print_config(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancelToken::new();
    interrupt::install(&cancel).context("failed to install the Ctrl-C handler")?;

    debug!(
        "Using a total of {} bytes distributed over {} blocks in {} threads.",
        config.total_bytes(),
        config.num_of_blocks(),
        config.instances()
    );

    let report = match memfade_core::run(&config, &cancel) {
        Ok(report) => report,
        Err(err) => {
            error!("{err}");
            error!("Memory check failed.");
            return Ok(ExitCode::FAILURE);
        }
    };

    summarize(&report);
    if report.is_success() {
        info!("OK.");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Memory check failed.");
        Ok(ExitCode::FAILURE)
    }
}

fn print_config(config: &TestConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    writeln!(io::stdout().lock(), "{json}").context("failed to write to stdout")?;
    Ok(())
}

fn summarize(report: &RunReport) {
    for outcome in report.outcomes() {
        match outcome {
            InstanceOutcome::Completed(r) => debug!(
                "{}{} iterations, {} comparisons, {} mismatching words{}.",
                r.job,
                r.cycles,
                r.verify_passes,
                r.mismatches,
                if r.cancelled { ", interrupted" } else { "" }
            ),
            InstanceOutcome::JoinFailed { job } => debug!("{job}no result."),
        }
    }
}
