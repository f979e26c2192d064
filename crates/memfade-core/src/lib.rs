// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! memfade-core: deterministic physical-memory stress testing.
//!
//! A [`TestInstance`] owns a [`BlockSet`] of equally sized word buffers. Each
//! outer iteration fills every block from an [`Lcg64`] seeded with a fresh
//! [`Seed`], optionally waits for the configured fade delay, then re-seeds the
//! generator with the same seed and compares every stored word against the
//! regenerated pattern. Mismatches are reported per word and never abort the
//! scan.
//!
//! The [`Runner`] executes one instance inline or N instances on scoped worker
//! threads, and folds their results into a [`RunReport`]. A shared
//! [`CancelToken`] stops every instance cooperatively: it is observed at the
//! top of each outer iteration, at the end of each fade wait, and after each
//! comparison pass, never inside one.
//!
//! # Example
//!
//! ```no_run
//! use memfade_core::{CancelToken, Runner, TestConfig};
//!
//! let config = TestConfig::builder()
//!     .num_of_blocks(4)
//!     .size_per_block(64 * 1024)
//!     .total_iterations(2)
//!     .build()?;
//! let cancel = CancelToken::new();
//! let report = Runner::new(&config, &cancel).run()?;
//! assert!(report.is_success());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
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
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

/// Allocation with bounded retry and the allocator port.
pub mod alloc;
/// Blocks, block sets, and the fill/verify scans.
pub mod block;
mod cancel;
/// Validated test configuration and config-file loading.
pub mod config;
mod error;
mod instance;
mod label;
/// Deterministic 64-bit LCG pattern generator.
pub mod prng;
mod runner;
/// Seed acquisition from an entropy device with constant fallback.
pub mod seed;

pub use alloc::{retry_with_backoff, BlockAllocator, RetryPolicy, SystemAllocator};
pub use block::{Block, BlockSet, Mismatch, WORD_BYTES};
pub use cancel::{CancelToken, WaitOutcome};
pub use config::{ConfigFile, Iterations, TestConfig, TestConfigBuilder};
pub use error::{AllocError, ConfigError, RunError, SetupError, StartFailure};
pub use instance::{InstanceReport, InstanceStatus, TestInstance};
pub use label::{job_prefix, JobId};
pub use prng::{Lcg64, Seed};
pub use runner::{run, InstanceOutcome, RunReport, Runner};
pub use seed::{DeviceSeed, FixedSeed, SeedSource, FALLBACK_SEED};
