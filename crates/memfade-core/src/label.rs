// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use std::fmt;

/// Identifies an instance in log lines.
///
/// Job 0 is the sole instance of a single-instance run and renders as an
/// empty prefix; parallel instances are numbered from 1 and render as
/// `"[n] "`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u16);

impl JobId {
    /// The sole instance of a single-instance run.
    pub const SOLE: Self = Self(0);

    /// Wraps a raw job number.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// The raw job number.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Returns `true` for the single-instance job.
    pub const fn is_sole(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sole() {
            Ok(())
        } else {
            write!(f, "[{}] ", self.0)
        }
    }
}

/// Log-line prefix for `job`.
pub fn job_prefix(job: JobId) -> String {
    job.to_string()
}
