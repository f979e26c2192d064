// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! memfade repository maintenance tasks.
//!
//! Single entrypoint for repo automation via `cargo xtask …` (see
//! `.cargo/config.toml`). Not shipped; outputs are deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use memfade_cli::Cli as MemfadeCli;

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "memfade repo maintenance tasks (cargo xtask …)",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the `memfade.1` man page from the CLI definition.
    Man(ManArgs),
}

#[derive(Args)]
struct ManArgs {
    /// Output directory (created if missing).
    #[arg(long, default_value = "target/man")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Man(args) => run_man(&args.out),
    }
}

fn run_man(out: &Path) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;

    let mut page = Vec::new();
    clap_mangen::Man::new(MemfadeCli::command())
        .render(&mut page)
        .context("failed to render man page")?;

    let path = out.join("memfade.1");
    fs::write(&path, page).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
