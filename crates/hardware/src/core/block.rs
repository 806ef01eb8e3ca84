//! Variable-size cache blocks.
//!
//! A `CacheBlock` covers a contiguous, word-aligned address range and keeps
//! one access counter per word. Blocks are created on misses and collations,
//! updated on hits, and turned into eviction records when they leave a set.

use crate::common::{WORD_SIZE, word_align};

/// A resident, word-granular memory range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheBlock {
    /// Word-aligned start address.
    pub start: u64,
    /// Word-aligned end address (inclusive).
    ///
    /// A block at 0x0 of 8 words ends at 0x38.
    pub end: u64,
    /// Instruction count at which the block was inserted.
    pub ins_insert: u64,
    /// Per-word access counters.
    utilization: Vec<u32>,
}

impl CacheBlock {
    /// Creates a block over `[start, end]` with all counters at zero.
    pub fn new(start: u64, end: u64, ins_insert: u64) -> Self {
        assert!(
            start <= end && start % WORD_SIZE == 0 && end % WORD_SIZE == 0,
            "block bounds must be word aligned and ordered: {:#x}..={:#x}",
            start,
            end
        );
        let words = ((end - start) / WORD_SIZE + 1) as usize;
        Self {
            start,
            end,
            ins_insert,
            utilization: vec![0; words],
        }
    }

    /// Creates a block from an explicit counter array.
    pub fn with_counters(start: u64, ins_insert: u64, counters: Vec<u32>) -> Self {
        assert!(!counters.is_empty(), "a block holds at least one word");
        let end = start + (counters.len() as u64 - 1) * WORD_SIZE;
        let mut block = Self::new(start, end, ins_insert);
        block.utilization = counters;
        block
    }

    /// Size of the block in words.
    #[inline]
    pub fn words(&self) -> u64 {
        self.utilization.len() as u64
    }

    /// Per-word access counters in address order.
    pub fn counters(&self) -> &[u32] {
        &self.utilization
    }

    /// Mutable access to the counters, used when absorbing other blocks.
    pub(crate) fn counters_mut(&mut self) -> &mut [u32] {
        &mut self.utilization
    }

    /// Returns `true` if `addr` falls inside the block.
    #[inline]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Returns `true` if `[start, end]` overlaps the block.
    #[inline]
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        start <= self.end && end >= self.start
    }

    /// Number of words touched at least once.
    pub fn touched_words(&self) -> u32 {
        self.utilization.iter().filter(|&&c| c > 0).count() as u32
    }

    /// Marks the words of a fresh load: words covered by the access become 1,
    /// every other word 0.
    pub fn set_access_pattern(&mut self, effective_address: u64, access_size: u32) {
        let (first, last) = access_span(effective_address, access_size);
        let start = self.start;
        for (i, counter) in self.utilization.iter_mut().enumerate() {
            let addr = start + i as u64 * WORD_SIZE;
            *counter = u32::from(addr >= first && addr <= last);
        }
    }

    /// Increments the counters of the words covered by the access.
    pub fn update_access_pattern(&mut self, effective_address: u64, access_size: u32) {
        let (first, last) = access_span(effective_address, access_size);
        let start = self.start;
        for (i, counter) in self.utilization.iter_mut().enumerate() {
            let addr = start + i as u64 * WORD_SIZE;
            if addr >= first && addr <= last {
                *counter += 1;
            }
        }
    }
}

/// Word-aligned first and last word touched by an access of `size` bytes.
fn access_span(effective_address: u64, size: u32) -> (u64, u64) {
    let size = u64::from(size.max(1));
    (
        word_align(effective_address),
        word_align(effective_address + size - 1),
    )
}
