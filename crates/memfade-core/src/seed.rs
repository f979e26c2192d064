// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::prng::Seed;

/// Seed used whenever the entropy device cannot supply four bytes.
pub const FALLBACK_SEED: Seed = Seed(0x0230_0420);

/// Default entropy device.
pub const SYSTEM_SEED_DEVICE: &str = "/dev/urandom";

/// Port for per-fill seed acquisition.
///
/// Acquisition never fails: a source that cannot produce entropy degrades to a
/// constant seed. Sources are shared by reference across instance threads.
pub trait SeedSource: Send + Sync {
    /// Returns the seed for the next fill pass.
    fn acquire(&self) -> Seed;
}

impl<T: SeedSource + ?Sized> SeedSource for &T {
    fn acquire(&self) -> Seed {
        (**self).acquire()
    }
}

/// Reads four bytes from a device or file per acquisition.
///
/// A missing device or a short read falls back to [`FALLBACK_SEED`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSeed {
    path: PathBuf,
}

impl DeviceSeed {
    /// Reads seeds from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads seeds from the system entropy device.
    pub fn system() -> Self {
        Self::new(SYSTEM_SEED_DEVICE)
    }

    /// The device path this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> io::Result<Seed> {
        let mut buf = [0u8; 4];
        File::open(&self.path)?.read_exact(&mut buf)?;
        Ok(Seed(u32::from_le_bytes(buf)))
    }
}

impl Default for DeviceSeed {
    fn default() -> Self {
        Self::system()
    }
}

impl SeedSource for DeviceSeed {
    fn acquire(&self) -> Seed {
        match self.read() {
            Ok(seed) => seed,
            Err(err) => {
                debug!(
                    path = %self.path.display(),
                    %err,
                    "seed device unavailable; using fallback seed {FALLBACK_SEED}"
                );
                FALLBACK_SEED
            }
        }
    }
}

/// Returns the same seed for every acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSeed(pub Seed);

impl SeedSource for FixedSeed {
    fn acquire(&self) -> Seed {
        self.0
    }
}
