// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Single-instance and thread-per-instance execution.

use std::fmt;
use std::thread;

use tracing::{debug, error, info};

use crate::alloc::{BlockAllocator, RetryPolicy, SystemAllocator};
use crate::cancel::CancelToken;
use crate::config::TestConfig;
use crate::error::{RunError, StartFailure};
use crate::instance::{InstanceReport, TestInstance};
use crate::label::JobId;
use crate::seed::{DeviceSeed, SeedSource};

/// How one started instance ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstanceOutcome {
    /// The instance's loop returned a report.
    Completed(InstanceReport),
    /// The worker could not be reaped (it panicked); no report exists.
    JoinFailed {
        /// The instance whose worker failed.
        job: JobId,
    },
}

impl InstanceOutcome {
    /// Instance identity.
    pub fn job(&self) -> JobId {
        match self {
            Self::Completed(report) => report.job,
            Self::JoinFailed { job } => *job,
        }
    }

    /// The report, if the worker produced one.
    pub fn report(&self) -> Option<&InstanceReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::JoinFailed { .. } => None,
        }
    }

    /// Returns `true` for a completed instance with no mismatches.
    pub fn is_success(&self) -> bool {
        self.report().is_some_and(InstanceReport::is_success)
    }
}

/// Aggregate of every started instance.
#[derive(Debug)]
pub struct RunReport {
    requested: u16,
    outcomes: Vec<InstanceOutcome>,
    start_failure: Option<StartFailure>,
}

impl RunReport {
    /// Instances the configuration asked for.
    pub fn requested(&self) -> u16 {
        self.requested
    }

    /// Instances that actually ran.
    pub fn started(&self) -> usize {
        self.outcomes.len()
    }

    /// Instances that were requested but never started.
    pub fn shortfall(&self) -> usize {
        usize::from(self.requested).saturating_sub(self.started())
    }

    /// Per-instance outcomes in job order.
    pub fn outcomes(&self) -> &[InstanceOutcome] {
        &self.outcomes
    }

    /// Why starting stopped early, if it did.
    pub fn start_failure(&self) -> Option<&StartFailure> {
        self.start_failure.as_ref()
    }

    /// Mismatching words across all completed instances.
    pub fn mismatches(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(InstanceOutcome::report)
            .map(|report| report.mismatches)
            .sum()
    }

    /// Returns `true` if any instance stopped on cancellation.
    pub fn cancelled(&self) -> bool {
        self.outcomes
            .iter()
            .filter_map(InstanceOutcome::report)
            .any(|report| report.cancelled)
    }

    /// Success iff every started instance completed without a mismatch.
    ///
    /// A start shortfall alone does not fail the run.
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(InstanceOutcome::is_success)
    }
}

/// Executes the configured number of [`TestInstance`]s.
///
/// One instance runs on the calling thread with job id 0. More than one run
/// on scoped worker threads named `memfade-<id>`, ids `1..=N`. Seeds come
/// from `/dev/urandom` and buffers from the heap unless replaced.
pub struct Runner<'a> {
    config: &'a TestConfig,
    cancel: &'a CancelToken,
    seeds: Box<dyn SeedSource + 'a>,
    allocator: Box<dyn BlockAllocator + 'a>,
    retry: RetryPolicy,
}

impl fmt::Debug for Runner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("config", self.config)
            .field("cancel", self.cancel)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<'a> Runner<'a> {
    /// A runner with the system seed device, heap allocator and default retry.
    pub fn new(config: &'a TestConfig, cancel: &'a CancelToken) -> Self {
        Self {
            config,
            cancel,
            seeds: Box::new(DeviceSeed::system()),
            allocator: Box::new(SystemAllocator),
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the seed source shared by every instance.
    pub fn with_seed_source(mut self, seeds: impl SeedSource + 'a) -> Self {
        self.seeds = Box::new(seeds);
        self
    }

    /// Replaces the block allocator.
    pub fn with_allocator(mut self, allocator: impl BlockAllocator + 'a) -> Self {
        self.allocator = Box::new(allocator);
        self
    }

    /// Replaces the allocation retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs every instance to completion and aggregates their outcomes.
    ///
    /// # Errors
    /// [`RunError::Setup`] if the sole instance cannot be set up;
    /// [`RunError::NoInstancesStarted`] if none of several could start.
    pub fn run(&self) -> Result<RunReport, RunError> {
        if self.config.instances() == 1 {
            self.run_single()
        } else {
            self.run_parallel()
        }
    }

    fn run_single(&self) -> Result<RunReport, RunError> {
        let mut instance =
            TestInstance::new(self.config, JobId::SOLE, &*self.allocator, self.retry)?;
        let report = instance.run(self.cancel, &*self.seeds);
        Ok(RunReport {
            requested: 1,
            outcomes: vec![InstanceOutcome::Completed(report)],
            start_failure: None,
        })
    }

    fn run_parallel(&self) -> Result<RunReport, RunError> {
        let requested = self.config.instances();
        let cancel = self.cancel;
        let seeds: &dyn SeedSource = &*self.seeds;

        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(usize::from(requested));
            let mut start_failure = None;

            // Allocation and spawn happen in job order; the first failure
            // stops further starts.
            for id in 1..=requested {
                let job = JobId::new(id);
                let mut instance =
                    match TestInstance::new(self.config, job, &*self.allocator, self.retry) {
                        Ok(instance) => instance,
                        Err(err) => {
                            error!("{err}");
                            start_failure = Some(StartFailure::from(err));
                            break;
                        }
                    };
                let spawned = thread::Builder::new()
                    .name(format!("memfade-{id}"))
                    .spawn_scoped(scope, move || instance.run(cancel, seeds));
                match spawned {
                    Ok(handle) => workers.push((job, handle)),
                    Err(source) => {
                        let failure = StartFailure::Spawn { job, source };
                        error!("{failure}");
                        start_failure = Some(failure);
                        break;
                    }
                }
            }

            let started = workers.len();
            if started == 0 {
                return Err(RunError::NoInstancesStarted {
                    requested,
                    cause: start_failure,
                });
            }
            if started < usize::from(requested) {
                info!("Started {started} of {requested} requested parallel checks.");
            } else {
                debug!("Started {started} parallel checks.");
            }

            let outcomes = workers
                .into_iter()
                .map(|(job, handle)| match handle.join() {
                    Ok(report) => InstanceOutcome::Completed(report),
                    Err(_) => {
                        error!("Failed joining thread {}.", job.get());
                        InstanceOutcome::JoinFailed { job }
                    }
                })
                .collect();

            Ok(RunReport {
                requested,
                outcomes,
                start_failure,
            })
        })
    }
}

/// Runs `config` with the system seed device and heap allocator.
pub fn run(config: &TestConfig, cancel: &CancelToken) -> Result<RunReport, RunError> {
    Runner::new(config, cancel).run()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::instance::InstanceStatus;
    use crate::prng::Seed;
    use crate::seed::FixedSeed;

    fn config(instances: u64) -> TestConfig {
        TestConfig::builder()
            .num_of_blocks(2)
            .size_per_block(128)
            .total_iterations(2)
            .instances(instances)
            .build()
            .expect("config")
    }

    fn report(job: u16, status: InstanceStatus, mismatches: u64) -> InstanceReport {
        InstanceReport {
            job: JobId::new(job),
            status,
            cycles: 1,
            verify_passes: 1,
            mismatches,
            cancelled: false,
            last_seed: Some(Seed(1)),
        }
    }

    #[test]
    fn single_instance_runs_inline_as_job_zero() {
        let config = config(1);
        let cancel = CancelToken::new();
        let report = Runner::new(&config, &cancel)
            .with_seed_source(FixedSeed(Seed(5)))
            .run()
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.started(), 1);
        assert_eq!(report.outcomes()[0].job(), JobId::SOLE);
        assert_eq!(report.outcomes()[0].report().unwrap().cycles, 2);
    }

    #[test]
    fn parallel_instances_get_one_based_ids() {
        let config = config(3);
        let cancel = CancelToken::new();
        let report = Runner::new(&config, &cancel)
            .with_seed_source(FixedSeed(Seed(5)))
            .run()
            .unwrap();
        let jobs: Vec<u16> = report.outcomes().iter().map(|o| o.job().get()).collect();
        assert_eq!(jobs, [1, 2, 3]);
        assert_eq!(report.shortfall(), 0);
        assert!(report.is_success());
    }

    #[test]
    fn aggregate_is_and_of_outcomes() {
        let mut run = RunReport {
            requested: 3,
            outcomes: vec![
                InstanceOutcome::Completed(report(1, InstanceStatus::Passed, 0)),
                InstanceOutcome::Completed(report(2, InstanceStatus::Passed, 0)),
                InstanceOutcome::Completed(report(3, InstanceStatus::Passed, 0)),
            ],
            start_failure: None,
        };
        assert!(run.is_success());

        run.outcomes[1] = InstanceOutcome::Completed(report(2, InstanceStatus::Failed, 4));
        assert!(!run.is_success());
        assert_eq!(run.mismatches(), 4);

        run.outcomes[1] = InstanceOutcome::JoinFailed { job: JobId::new(2) };
        assert!(!run.is_success());
        assert_eq!(run.mismatches(), 0);
    }

    #[test]
    fn empty_report_is_not_success() {
        let run = RunReport {
            requested: 2,
            outcomes: Vec::new(),
            start_failure: None,
        };
        assert!(!run.is_success());
        assert_eq!(run.shortfall(), 2);
    }
}
