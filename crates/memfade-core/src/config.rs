// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use std::fs;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::block::WORD_BYTES;
use crate::error::ConfigError;

/// Longest accepted fade delay.
pub const MAX_FADE: Duration = Duration::from_secs(65_535);

/// Outer fill/verify cycle budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Iterations {
    /// Stop after this many cycles.
    Finite(NonZeroU32),
    /// Run until cancelled.
    Unbounded,
}

impl Iterations {
    /// A finite budget. Rejects zero and `u32::MAX`.
    pub fn finite(value: u64) -> Result<Self, ConfigError> {
        u32::try_from(value)
            .ok()
            .filter(|&n| n != u32::MAX)
            .and_then(NonZeroU32::new)
            .map(Self::Finite)
            .ok_or(ConfigError::IterationsOutOfRange { value })
    }

    /// The budget left after one more cycle, or `None` when exhausted.
    pub fn after_cycle(self) -> Option<Self> {
        match self {
            Self::Unbounded => Some(Self::Unbounded),
            Self::Finite(n) => NonZeroU32::new(n.get() - 1).map(Self::Finite),
        }
    }
}

/// Validated, immutable test parameters shared by every instance.
///
/// Build one with [`TestConfig::builder`]. Every field satisfies its range
/// constraint; `size_per_block` is a whole number of words.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestConfig {
    #[serde(rename = "fade_seconds", serialize_with = "serialize_secs")]
    fade: Duration,
    num_of_blocks: u16,
    size_per_block: usize,
    total_iterations: Iterations,
    read_iterations: NonZeroU32,
    instances: u16,
}

fn serialize_secs<S>(fade: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(fade.as_secs_f64())
}

impl TestConfig {
    /// A builder holding the tool defaults.
    pub fn builder() -> TestConfigBuilder {
        TestConfigBuilder::default()
    }

    /// Delay before each verify pass.
    pub fn fade(&self) -> Duration {
        self.fade
    }

    /// Blocks per instance.
    pub fn num_of_blocks(&self) -> u16 {
        self.num_of_blocks
    }

    /// Bytes per block, a multiple of [`WORD_BYTES`].
    pub fn size_per_block(&self) -> usize {
        self.size_per_block
    }

    /// Words per block.
    pub fn words_per_block(&self) -> usize {
        self.size_per_block / WORD_BYTES
    }

    /// Outer cycle budget.
    pub fn total_iterations(&self) -> Iterations {
        self.total_iterations
    }

    /// Verify passes per outer cycle.
    pub fn read_iterations(&self) -> NonZeroU32 {
        self.read_iterations
    }

    /// Concurrent instances.
    pub fn instances(&self) -> u16 {
        self.instances
    }

    /// Bytes tested by one instance.
    pub fn bytes_per_instance(&self) -> u64 {
        (self.size_per_block as u64).saturating_mul(u64::from(self.num_of_blocks))
    }

    /// Bytes tested across all instances.
    pub fn total_bytes(&self) -> u64 {
        self.bytes_per_instance()
            .saturating_mul(u64::from(self.instances))
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            fade: Duration::ZERO,
            num_of_blocks: 10,
            size_per_block: 1024 * 1024,
            total_iterations: Iterations::Unbounded,
            read_iterations: NonZeroU32::MIN,
            instances: 1,
        }
    }
}

/// Unvalidated [`TestConfig`] under construction.
///
/// Setters accept wide integers so out-of-range input reaches
/// [`build`](TestConfigBuilder::build) and is reported there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestConfigBuilder {
    fade: Duration,
    num_of_blocks: u64,
    size_per_block: u64,
    total_iterations: Option<u64>,
    read_iterations: u64,
    instances: u64,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self {
            fade: Duration::ZERO,
            num_of_blocks: 10,
            size_per_block: 1024 * 1024,
            total_iterations: None,
            read_iterations: 1,
            instances: 1,
        }
    }
}

impl TestConfigBuilder {
    /// Delay before each verify pass (at most 65535 s).
    pub fn fade(mut self, fade: Duration) -> Self {
        self.fade = fade;
        self
    }

    /// Delay before each verify pass, in whole seconds.
    pub fn fade_seconds(self, seconds: u64) -> Self {
        self.fade(Duration::from_secs(seconds))
    }

    /// Blocks per instance (1..=65535).
    pub fn num_of_blocks(mut self, count: u64) -> Self {
        self.num_of_blocks = count;
        self
    }

    /// Bytes per block (at least 4, rounded down to whole words).
    pub fn size_per_block(mut self, bytes: u64) -> Self {
        self.size_per_block = bytes;
        self
    }

    /// Outer cycles (1..u32::MAX).
    pub fn total_iterations(mut self, count: u64) -> Self {
        self.total_iterations = Some(count);
        self
    }

    /// Run outer cycles until cancelled.
    pub fn unbounded(mut self) -> Self {
        self.total_iterations = None;
        self
    }

    /// Verify passes per outer cycle (1..=u32::MAX).
    pub fn read_iterations(mut self, count: u64) -> Self {
        self.read_iterations = count;
        self
    }

    /// Concurrent instances (1..=65535).
    pub fn instances(mut self, count: u64) -> Self {
        self.instances = count;
        self
    }

    /// Validates every field.
    pub fn build(&self) -> Result<TestConfig, ConfigError> {
        if self.fade > MAX_FADE {
            return Err(ConfigError::FadeOutOfRange { fade: self.fade });
        }
        let num_of_blocks = u16::try_from(self.num_of_blocks)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(ConfigError::BlockCountOutOfRange {
                value: self.num_of_blocks,
            })?;
        if self.size_per_block < WORD_BYTES as u64 {
            return Err(ConfigError::BlockSizeTooSmall {
                value: self.size_per_block,
            });
        }
        let size_per_block = usize::try_from(self.size_per_block)
            .map_err(|_| ConfigError::BlockSizeTooLarge {
                value: self.size_per_block,
            })?
            & !(WORD_BYTES - 1);
        let total_iterations = match self.total_iterations {
            Some(count) => Iterations::finite(count)?,
            None => Iterations::Unbounded,
        };
        let read_iterations = u32::try_from(self.read_iterations)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(ConfigError::ReadIterationsOutOfRange {
                value: self.read_iterations,
            })?;
        let instances = u16::try_from(self.instances)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(ConfigError::InstancesOutOfRange {
                value: self.instances,
            })?;

        Ok(TestConfig {
            fade: self.fade,
            num_of_blocks,
            size_per_block,
            total_iterations,
            read_iterations,
            instances,
        })
    }
}

/// Optional settings loaded from a JSON file.
///
/// Missing fields leave the builder's value untouched; command-line flags are
/// applied afterwards and win.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Delay before each verify pass, seconds.
    pub fade_seconds: Option<u64>,
    /// Blocks per instance.
    pub num_of_blocks: Option<u64>,
    /// Bytes per block.
    pub size_per_block: Option<u64>,
    /// Outer cycles; absent means unbounded.
    pub total_iterations: Option<u64>,
    /// Verify passes per outer cycle.
    pub read_iterations: Option<u64>,
    /// Concurrent instances.
    pub instances: Option<u64>,
}

impl ConfigFile {
    /// Reads and parses `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Layers the present fields onto `builder`.
    pub fn apply(&self, mut builder: TestConfigBuilder) -> TestConfigBuilder {
        if let Some(seconds) = self.fade_seconds {
            builder = builder.fade_seconds(seconds);
        }
        if let Some(count) = self.num_of_blocks {
            builder = builder.num_of_blocks(count);
        }
        if let Some(bytes) = self.size_per_block {
            builder = builder.size_per_block(bytes);
        }
        if let Some(count) = self.total_iterations {
            builder = builder.total_iterations(count);
        }
        if let Some(count) = self.read_iterations {
            builder = builder.read_iterations(count);
        }
        if let Some(count) = self.instances {
            builder = builder.instances(count);
        }
        builder
    }
}
