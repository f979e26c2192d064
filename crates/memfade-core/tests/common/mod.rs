// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, missing_docs, clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use memfade_core::{BlockAllocator, Seed, SeedSource, SystemAllocator, TestConfig, TestConfigBuilder};

/// Small geometry so tests stay fast.
pub fn small() -> TestConfigBuilder {
    TestConfig::builder().num_of_blocks(4).size_per_block(1024)
}

/// Hands out seeds in order, repeating the last one when exhausted.
#[derive(Debug)]
pub struct ScriptedSeeds {
    seeds: Vec<Seed>,
    next: AtomicUsize,
    handed_out: Mutex<Vec<Seed>>,
}

impl ScriptedSeeds {
    pub fn new(seeds: impl IntoIterator<Item = u32>) -> Self {
        Self {
            seeds: seeds.into_iter().map(Seed).collect(),
            next: AtomicUsize::new(0),
            handed_out: Mutex::new(Vec::new()),
        }
    }

    pub fn handed_out(&self) -> Vec<Seed> {
        self.handed_out.lock().unwrap().clone()
    }
}

impl SeedSource for ScriptedSeeds {
    fn acquire(&self) -> Seed {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let seed = self.seeds[index.min(self.seeds.len() - 1)];
        self.handed_out.lock().unwrap().push(seed);
        seed
    }
}

/// Panics on its first acquisition, then behaves like a fixed seed.
#[derive(Debug, Default)]
pub struct PanicOnce {
    fired: AtomicBool,
}

impl SeedSource for PanicOnce {
    #[allow(clippy::panic)]
    fn acquire(&self) -> Seed {
        if !self.fired.swap(true, Ordering::SeqCst) {
            panic!("seed source failure");
        }
        Seed(0x5eed)
    }
}

/// Succeeds for the first `budget` block allocations, then refuses.
#[derive(Debug)]
pub struct BudgetAllocator {
    remaining: AtomicUsize,
    attempts: AtomicUsize,
}

impl BudgetAllocator {
    pub fn new(budget: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(budget),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl BlockAllocator for BudgetAllocator {
    fn try_allocate(&self, words: usize) -> Option<Box<[u32]>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()?;
        SystemAllocator.try_allocate(words)
    }
}
