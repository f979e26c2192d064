// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use std::thread;
use std::time::Duration;

use tracing::trace;

/// Bounded retry with a fixed backoff between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Attempts made by [`RetryPolicy::default`].
    pub const DEFAULT_ATTEMPTS: u32 = 5;
    /// Backoff used by [`RetryPolicy::default`].
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

    /// `attempts` tries (at least one) separated by `backoff`.
    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        let attempts = if attempts == 0 { 1 } else { attempts };
        Self { attempts, backoff }
    }

    /// A single attempt, no sleeping.
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Maximum number of attempts.
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Sleep between failed attempts.
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_BACKOFF)
    }
}

/// Runs `op` until it succeeds or the policy's attempts are exhausted.
///
/// `op` receives the 1-based attempt number. The error of the last attempt
/// is returned on exhaustion.
pub fn retry_with_backoff<T, E>(
    policy: RetryPolicy,
    mut op: impl FnMut(u32) -> Result<T, E>,
) -> Result<T, E> {
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= policy.attempts => return Err(err),
            Err(_) => {
                trace!(attempt, backoff = ?policy.backoff, "attempt failed; backing off");
                if !policy.backoff.is_zero() {
                    thread::sleep(policy.backoff);
                }
                attempt += 1;
            }
        }
    }
}

/// Port for block buffer allocation.
///
/// `try_allocate` makes a single attempt; retrying is the caller's concern.
pub trait BlockAllocator: Send + Sync {
    /// Returns a zeroed buffer of `words` words, or `None` if the request
    /// cannot be satisfied right now.
    fn try_allocate(&self, words: usize) -> Option<Box<[u32]>>;
}

impl<T: BlockAllocator + ?Sized> BlockAllocator for &T {
    fn try_allocate(&self, words: usize) -> Option<Box<[u32]>> {
        (**self).try_allocate(words)
    }
}

/// Heap allocation that reports exhaustion instead of aborting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemAllocator;

impl BlockAllocator for SystemAllocator {
    fn try_allocate(&self, words: usize) -> Option<Box<[u32]>> {
        let mut buf: Vec<u32> = Vec::new();
        buf.try_reserve_exact(words).ok()?;
        buf.resize(words, 0);
        Some(buf.into_boxed_slice())
    }
}
