// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `memfade`: physical memory stress tester.
#![allow(clippy::print_stderr)]

use std::process::ExitCode;

use clap::Parser;
use memfade_cli::{logging, Cli};
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(cli.verbose) {
        eprintln!("memfade: {err:#}");
        return ExitCode::FAILURE;
    }

    match memfade_cli::run(&cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
