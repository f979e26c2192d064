// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use std::num::NonZeroU32;
use std::time::Duration;

use tracing::{debug, error, info, trace};

use crate::alloc::{BlockAllocator, RetryPolicy};
use crate::block::BlockSet;
use crate::cancel::{CancelToken, WaitOutcome};
use crate::config::{Iterations, TestConfig};
use crate::error::SetupError;
use crate::label::JobId;
use crate::prng::{Lcg64, Seed};
use crate::seed::SeedSource;

/// Content verdict of one instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstanceStatus {
    /// Every comparison so far matched.
    #[default]
    Passed,
    /// At least one comparison found a mismatch.
    Failed,
}

/// What one instance did, returned when its loop ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceReport {
    /// Instance identity.
    pub job: JobId,
    /// Content verdict.
    pub status: InstanceStatus,
    /// Outer cycles completed.
    pub cycles: u64,
    /// Verify passes performed across all cycles.
    pub verify_passes: u64,
    /// Mismatching words seen across all passes.
    pub mismatches: u64,
    /// The loop ended because cancellation was observed.
    pub cancelled: bool,
    /// Seed of the most recent fill, if any.
    pub last_seed: Option<Seed>,
}

impl InstanceReport {
    /// Returns `true` if no mismatch was ever seen.
    pub fn is_success(&self) -> bool {
        self.status == InstanceStatus::Passed
    }
}

/// One fill/fade/verify loop over an exclusively owned [`BlockSet`].
///
/// [`run`](TestInstance::run) drives the whole loop. The individual phases are
/// public so callers can step through a cycle by hand, for example to disturb
/// memory between [`fill_pass`](TestInstance::fill_pass) and
/// [`verify_pass`](TestInstance::verify_pass).
#[derive(Debug)]
pub struct TestInstance {
    job: JobId,
    blocks: BlockSet,
    generator: Option<Lcg64>,
    remaining: Option<Iterations>,
    fade: Duration,
    read_iterations: NonZeroU32,
    status: InstanceStatus,
    cycles: u64,
    verify_passes: u64,
    mismatches: u64,
    cancelled: bool,
}

impl TestInstance {
    /// Allocates the block set for `job`.
    ///
    /// # Errors
    /// [`SetupError`] when a block or the block table cannot be allocated
    /// within `retry`. Blocks already allocated are released.
    pub fn new(
        config: &TestConfig,
        job: JobId,
        allocator: &dyn BlockAllocator,
        retry: RetryPolicy,
    ) -> Result<Self, SetupError> {
        let blocks = BlockSet::allocate(
            usize::from(config.num_of_blocks()),
            config.words_per_block(),
            allocator,
            retry,
        )
        .map_err(|source| SetupError { job, source })?;

        Ok(Self {
            job,
            blocks,
            generator: None,
            remaining: Some(config.total_iterations()),
            fade: config.fade(),
            read_iterations: config.read_iterations(),
            status: InstanceStatus::Passed,
            cycles: 0,
            verify_passes: 0,
            mismatches: 0,
            cancelled: false,
        })
    }

    /// Instance identity.
    pub fn job(&self) -> JobId {
        self.job
    }

    /// The memory under test.
    pub fn blocks(&self) -> &BlockSet {
        &self.blocks
    }

    /// The memory under test, writable.
    pub fn blocks_mut(&mut self) -> &mut BlockSet {
        &mut self.blocks
    }

    /// Seed of the current fill, `None` before the first one.
    pub fn seed(&self) -> Option<Seed> {
        self.generator.as_ref().map(Lcg64::seed)
    }

    /// Content verdict so far.
    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    /// Outer cycles still to run; `None` once exhausted.
    pub fn remaining(&self) -> Option<Iterations> {
        self.remaining
    }

    /// Draws a fresh seed and overwrites every block with its pattern.
    pub fn fill_pass(&mut self, seeds: &dyn SeedSource) -> Seed {
        trace!(
            "{}Filling {} bytes distributed over {} blocks.",
            self.job,
            self.blocks.total_bytes(),
            self.blocks.len()
        );
        let seed = seeds.acquire();
        let mut generator = Lcg64::seeded(seed);
        self.blocks.fill(&mut generator);
        self.generator = Some(generator);
        seed
    }

    /// Sleeps for the fade delay, cut short by cancellation.
    ///
    /// A zero delay does not sleep; it only reports the token's state.
    pub fn fade_wait(&self, cancel: &CancelToken) -> WaitOutcome {
        if self.fade.is_zero() {
            return if cancel.is_cancelled() {
                WaitOutcome::Cancelled
            } else {
                WaitOutcome::Elapsed
            };
        }
        trace!("{}Waiting to capture possible memory fade effect...", self.job);
        cancel.wait_timeout(self.fade)
    }

    /// Regenerates the current fill's pattern and compares every word.
    ///
    /// Each mismatch is logged; the scan never stops early. Returns the
    /// number of mismatches, or zero if nothing has been filled yet.
    pub fn verify_pass(&mut self) -> u64 {
        let Some(generator) = self.generator.as_mut() else {
            return 0;
        };
        let job = self.job;
        trace!("{job}Comparing {} bytes.", self.blocks.total_bytes());

        generator.restart();
        let found = self.blocks.verify(generator, |mismatch| {
            error!("{job}{mismatch}");
        });

        self.verify_passes += 1;
        self.mismatches += found;
        if found > 0 {
            self.status = InstanceStatus::Failed;
        }
        found
    }

    /// Runs outer cycles until the budget is spent or `cancel` is observed.
    ///
    /// Cancellation is checked before each cycle, after each fade wait and
    /// after each comparison. A comparison already due is always completed.
    pub fn run(&mut self, cancel: &CancelToken, seeds: &dyn SeedSource) -> InstanceReport {
        while let Some(remaining) = self.remaining {
            if cancel.is_cancelled() {
                self.cancelled = true;
                break;
            }
            let cycle = self.cycles + 1;
            if self.job.is_sole() {
                debug!("### Iteration {cycle} ###");
            } else {
                debug!("### Iteration {cycle} in thread {} ###", self.job.get());
            }

            self.fill_pass(seeds);
            for _ in 0..self.read_iterations.get() {
                if self.fade_wait(cancel).is_cancelled() {
                    info!(
                        "{}Interrupted, terminating after next comparison.",
                        self.job
                    );
                }
                self.verify_pass();
                if cancel.is_cancelled() {
                    self.cancelled = true;
                    break;
                }
            }

            self.cycles = cycle;
            self.remaining = remaining.after_cycle();
        }
        self.report()
    }

    /// Snapshot of the counters and verdict.
    pub fn report(&self) -> InstanceReport {
        InstanceReport {
            job: self.job,
            status: self.status,
            cycles: self.cycles,
            verify_passes: self.verify_passes,
            mismatches: self.mismatches,
            cancelled: self.cancelled,
            last_seed: self.seed(),
        }
    }
}
