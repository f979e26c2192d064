// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::label::JobId;

/// A configuration value is out of range or a config file is unreadable.
///
/// Surfaced before any test runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Fade delay above 65535 seconds.
    #[error("the memory fade delay must not exceed 65535 seconds (got {fade:?})")]
    FadeOutOfRange {
        /// Rejected delay.
        fade: Duration,
    },
    /// Block count of zero or above 65535.
    #[error("the number of blocks must be a positive value not exceeding 65535 (got {value})")]
    BlockCountOutOfRange {
        /// Rejected count.
        value: u64,
    },
    /// Block size below one word.
    #[error("the memory block size must be at least 4 bytes (got {value})")]
    BlockSizeTooSmall {
        /// Rejected size in bytes.
        value: u64,
    },
    /// Block size not addressable on this platform.
    #[error("the memory block size {value} exceeds the address space")]
    BlockSizeTooLarge {
        /// Rejected size in bytes.
        value: u64,
    },
    /// Finite iteration count of zero or at/above `u32::MAX`.
    #[error(
        "the number of iterations must be a positive value smaller than 4294967295 (got {value})"
    )]
    IterationsOutOfRange {
        /// Rejected count.
        value: u64,
    },
    /// Read iteration count of zero or above `u32::MAX`.
    #[error(
        "the number of read iterations must be a positive value not exceeding 4294967295 (got {value})"
    )]
    ReadIterationsOutOfRange {
        /// Rejected count.
        value: u64,
    },
    /// Instance count of zero or above 65535.
    #[error(
        "the number of parallel checks must be a positive value not exceeding 65535 (got {value})"
    )]
    InstancesOutOfRange {
        /// Rejected count.
        value: u64,
    },
    /// Config file could not be read.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Config file is not valid JSON for [`ConfigFile`](crate::ConfigFile).
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An allocation could not be satisfied within the retry budget.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The table holding the block handles.
    #[error("failed to allocate {bytes} bytes for the block table after {attempts} attempts")]
    Table {
        /// Requested size.
        bytes: usize,
        /// Attempts made before giving up.
        attempts: u32,
    },
    /// One block buffer.
    #[error("failed to allocate {bytes} bytes for block {block} after {attempts} attempts")]
    Block {
        /// Index of the block that failed.
        block: usize,
        /// Requested size.
        bytes: usize,
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// An instance could not be set up; no testing was attempted for it.
///
/// Distinct from a content failure: the memory was never examined.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{job}instance setup failed: {source}")]
pub struct SetupError {
    /// The instance that failed.
    pub job: JobId,
    /// The allocation that could not be satisfied.
    #[source]
    pub source: AllocError,
}

/// Why a parallel instance did not start.
#[derive(Debug, Error)]
pub enum StartFailure {
    /// Its block set could not be allocated.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Its worker thread could not be spawned.
    #[error("{job}failed to spawn worker thread: {source}")]
    Spawn {
        /// The instance that failed.
        job: JobId,
        /// OS error from the thread builder.
        #[source]
        source: io::Error,
    },
}

/// Run-level failures that prevent any aggregate result.
#[derive(Debug, Error)]
pub enum RunError {
    /// The single instance could not be set up.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// None of the requested parallel instances started.
    #[error("couldn't start any of the {requested} requested instances")]
    NoInstancesStarted {
        /// Instances requested by the configuration.
        requested: u16,
        /// The failure that stopped the first start, when one occurred.
        cause: Option<StartFailure>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_carries_job_prefix() {
        let err = SetupError {
            job: JobId::new(2),
            source: AllocError::Block {
                block: 3,
                bytes: 4096,
                attempts: 5,
            },
        };
        assert_eq!(
            err.to_string(),
            "[2] instance setup failed: failed to allocate 4096 bytes for block 3 after 5 attempts"
        );
    }

    #[test]
    fn sole_setup_error_has_no_prefix() {
        let err = SetupError {
            job: JobId::SOLE,
            source: AllocError::Table {
                bytes: 80,
                attempts: 1,
            },
        };
        assert!(err.to_string().starts_with("instance setup failed"));
    }

    #[test]
    fn config_error_names_the_limit() {
        let err = ConfigError::BlockCountOutOfRange { value: 0 };
        assert!(err.to_string().contains("not exceeding 65535"));
    }
}
