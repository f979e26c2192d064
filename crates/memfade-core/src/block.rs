// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use std::fmt;
use std::hint::black_box;
use std::mem::size_of;

use crate::alloc::{retry_with_backoff, BlockAllocator, RetryPolicy};
use crate::error::AllocError;
use crate::prng::Lcg64;

/// Bytes per pattern word.
pub const WORD_BYTES: usize = size_of::<u32>();

/// A stored word that differs from the regenerated pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// Index of the block within its set.
    pub block: usize,
    /// Word index within the block.
    pub word: usize,
    /// Virtual address of the word.
    pub address: usize,
    /// Value read back from memory.
    pub actual: u32,
    /// Value the generator produced for this position.
    pub expected: u32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected memory content 0x{:08x} at {:#x}, expected 0x{:08x}.",
            self.actual, self.address, self.expected
        )
    }
}

/// One owned buffer of pattern words.
#[derive(Debug)]
pub struct Block {
    words: Box<[u32]>,
}

impl Block {
    /// Wraps an allocated buffer.
    pub fn new(words: Box<[u32]>) -> Self {
        Self { words }
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` for a zero-word block.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Stored words.
    pub fn as_slice(&self) -> &[u32] {
        &self.words
    }

    /// Stored words, writable.
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Overwrites every word with successive generator output.
    pub fn fill(&mut self, generator: &mut Lcg64) {
        for (slot, word) in self.words.iter_mut().zip(generator) {
            *slot = word;
        }
    }

    /// Compares every word against successive generator output.
    ///
    /// Does not stop at the first mismatch. Returns the number found.
    pub fn verify(
        &self,
        index: usize,
        generator: &mut Lcg64,
        on_mismatch: &mut impl FnMut(Mismatch),
    ) -> u64 {
        // Opaque to the optimizer: the stored words must really be read back.
        let words: &[u32] = black_box(&*self.words);
        let mut found = 0;
        for (word, (stored, expected)) in words.iter().zip(generator).enumerate() {
            let actual = *stored;
            if actual != expected {
                found += 1;
                on_mismatch(Mismatch {
                    block: index,
                    word,
                    address: std::ptr::from_ref(stored).addr(),
                    actual,
                    expected,
                });
            }
        }
        found
    }
}

/// An ordered, fixed collection of equally sized blocks.
///
/// Fill and verify walk the blocks in the same order, so one generator
/// session spans the whole set.
#[derive(Debug)]
pub struct BlockSet {
    blocks: Vec<Block>,
    words_per_block: usize,
}

impl BlockSet {
    /// Allocates `count` blocks of `words_per_block` words each.
    ///
    /// Every allocation goes through `retry` against `allocator`. On failure
    /// the blocks already allocated are released before returning.
    pub fn allocate(
        count: usize,
        words_per_block: usize,
        allocator: &dyn BlockAllocator,
        retry: RetryPolicy,
    ) -> Result<Self, AllocError> {
        let mut blocks: Vec<Block> = retry_with_backoff(retry, |_| {
            let mut table = Vec::new();
            table.try_reserve_exact(count).map(|()| table)
        })
        .map_err(|_| AllocError::Table {
            bytes: count.saturating_mul(size_of::<Block>()),
            attempts: retry.attempts(),
        })?;

        for index in 0..count {
            let words = retry_with_backoff(retry, |_| {
                allocator.try_allocate(words_per_block).ok_or(())
            })
            .map_err(|()| AllocError::Block {
                block: index,
                bytes: words_per_block.saturating_mul(WORD_BYTES),
                attempts: retry.attempts(),
            })?;
            blocks.push(Block::new(words));
        }

        Ok(Self {
            blocks,
            words_per_block,
        })
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` when the set holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Words in each block.
    pub fn words_per_block(&self) -> usize {
        self.words_per_block
    }

    /// Words across all blocks; one generator session draws this many.
    pub fn total_words(&self) -> usize {
        self.blocks.len().saturating_mul(self.words_per_block)
    }

    /// Bytes across all blocks.
    pub fn total_bytes(&self) -> usize {
        self.total_words().saturating_mul(WORD_BYTES)
    }

    /// Blocks in fill/verify order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Words of block `index`, writable.
    pub fn words_mut(&mut self, index: usize) -> Option<&mut [u32]> {
        self.blocks.get_mut(index).map(Block::as_mut_slice)
    }

    /// Fills every block in order from `generator`.
    pub fn fill(&mut self, generator: &mut Lcg64) {
        for block in &mut self.blocks {
            block.fill(generator);
        }
    }

    /// Verifies every block in order against `generator`.
    ///
    /// `on_mismatch` sees every differing word; the scan always covers the
    /// whole set. Returns the number of mismatches.
    pub fn verify(&self, generator: &mut Lcg64, mut on_mismatch: impl FnMut(Mismatch)) -> u64 {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| block.verify(index, generator, &mut on_mismatch))
            .sum()
    }
}
