//! Ideal fully associative set with variable-size blocks.
//!
//! An `IdealCache` is one set of the simulated cache. It stores blocks of any
//! word-granular size up to `max_gran` bytes, keyed by start address in an
//! ordered index and threaded through a recency list for LRU replacement.
//!
//! An access resolves, in order, to:
//! 1. **Collated hit**: every word is resident but spread over several
//!    blocks. The blocks are merged into one and re-split.
//! 2. **Full hit**: the range lies inside one block.
//! 3. **Miss**: no word of the range is resident. A fresh block is loaded.
//! 4. **Partial miss**: some words are resident. The resident blocks are
//!    merged with the missing words into one block and re-split.
//!
//! Capacity is accounted in words, charging `tag_overhead` extra words per
//! resident block. Eviction is left to the caller, which drains the LRU tail
//! while the set is over capacity.
//!
//! # Performance
//!
//! - **Time Complexity:** `floor()` is O(log n); an access is
//!   O(w log n) for a range of w words; `evict_victim()` is O(log n)
//! - **Space Complexity:** O(resident words)

use std::collections::BTreeMap;

use self::recency::{BlockHandle, RecencyList};
use super::block::CacheBlock;
use super::memblock::MemBlock;
use super::record::EvictionRecord;
use crate::common::{
    SET_COLLATED_HIT_ACCESS_LATENCY, SET_HIT_ACCESS_LATENCY, SET_MISS_ACCESS_LATENCY, WORD_SIZE,
};
use crate::stats::SetStats;

/// Arena-backed recency list.
pub mod recency;

/// How a set resolved an access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    CollatedHit,
    FullHit,
    Miss,
    PartialMiss,
}

impl AccessKind {
    /// Latency charged for the access, in cycles.
    pub fn latency(self) -> u32 {
        match self {
            AccessKind::CollatedHit => SET_COLLATED_HIT_ACCESS_LATENCY,
            AccessKind::FullHit => SET_HIT_ACCESS_LATENCY,
            AccessKind::Miss | AccessKind::PartialMiss => SET_MISS_ACCESS_LATENCY,
        }
    }

    pub fn is_hit(self) -> bool {
        matches!(self, AccessKind::CollatedHit | AccessKind::FullHit)
    }
}

/// Ownership change caused by an access.
///
/// Handles name the most recently used block of the set after the access.
/// That is the chunk holding the accessed address. When the address lies
/// outside the block, as for the far half of a range split between sets, it
/// is the lowest-addressed chunk instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// An existing block was touched in place.
    Hit(BlockHandle),
    /// A fresh block was loaded from the next level.
    Loaded(BlockHandle),
    /// Resident blocks were merged into a new one. `consumed` holds the
    /// absorbed blocks as they were before the merge.
    Collated {
        block: BlockHandle,
        consumed: Vec<CacheBlock>,
    },
}

/// Result of [`IdealCache::access`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessOutcome {
    pub kind: AccessKind,
    pub transition: Transition,
}

/// One set of the flexible cache.
pub struct IdealCache {
    /// Capacity in words.
    capacity: u64,
    words_in_cache: u64,
    /// Largest block size in bytes.
    max_gran: u64,
    /// Words charged per resident block for its tag.
    tag_overhead: u64,
    index: BTreeMap<u64, BlockHandle>,
    lru: RecencyList<CacheBlock>,
    stats: SetStats,
}

impl IdealCache {
    /// Creates an empty set of `capacity` words holding blocks of at most
    /// `max_gran` bytes.
    pub fn new(capacity: u64, max_gran: u64, tag_overhead: u64) -> Self {
        assert!(
            max_gran >= WORD_SIZE && max_gran % WORD_SIZE == 0,
            "max granularity {} is not a positive multiple of the word size",
            max_gran
        );
        Self {
            capacity,
            words_in_cache: 0,
            max_gran,
            tag_overhead,
            index: BTreeMap::new(),
            lru: RecencyList::new(),
            stats: SetStats::with_hints(),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Occupied words, tags included.
    pub fn words_in_cache(&self) -> u64 {
        self.words_in_cache
    }

    pub fn max_gran(&self) -> u64 {
        self.max_gran
    }

    pub fn tag_overhead(&self) -> u64 {
        self.tag_overhead
    }

    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn is_over_capacity(&self) -> bool {
        self.words_in_cache > self.capacity
    }

    pub fn stats(&self) -> &SetStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut SetStats {
        &mut self.stats
    }

    /// Resident block with the greatest start address `<= addr`.
    #[inline]
    pub fn floor(&self, addr: u64) -> Option<BlockHandle> {
        self.index.range(..=addr).next_back().map(|(_, &h)| h)
    }

    /// Block behind a handle returned by this set.
    pub fn block(&self, handle: BlockHandle) -> Option<&CacheBlock> {
        self.lru.get(handle)
    }

    /// Resident block containing `addr`.
    pub fn block_at(&self, addr: u64) -> Option<&CacheBlock> {
        self.floor(addr)
            .map(|h| self.resident(h))
            .filter(|b| b.contains(addr))
    }

    /// Resident blocks from most to least recently used.
    pub fn blocks(&self) -> impl Iterator<Item = &CacheBlock> {
        self.lru.iter().map(|(_, b)| b)
    }

    /// Resident blocks in address order.
    pub fn blocks_by_address(&self) -> impl Iterator<Item = &CacheBlock> {
        self.index.values().map(|&h| self.resident(h))
    }

    /// The block the next eviction would remove.
    pub fn victim(&self) -> Option<&CacheBlock> {
        self.lru.back().map(|h| self.resident(h))
    }

    /// Returns `true` if the `size` bytes at `addr` lie inside one block.
    pub fn is_full_hit(&self, addr: u64, size: u64) -> bool {
        let last = addr + size.max(WORD_SIZE) - WORD_SIZE;
        match self.floor(addr) {
            Some(h) => {
                let block = self.resident(h);
                self.floor(last) == Some(h) && addr >= block.start && last <= block.end
            }
            None => false,
        }
    }

    /// Returns `true` if no resident word overlaps `mb`.
    pub fn is_full_miss(&self, mb: &MemBlock) -> bool {
        match (self.floor(mb.start), self.floor(mb.end)) {
            (None, None) => true,
            (Some(lo), Some(hi)) if lo == hi => mb.start > self.resident(lo).end,
            _ => false,
        }
    }

    /// Returns `true` if every word of `mb` is resident but not all in the
    /// same block.
    pub fn is_collated_hit(&self, mb: &MemBlock) -> bool {
        self.floor(mb.start) != self.floor(mb.end)
            && mb.word_addresses().all(|a| self.is_full_hit(a, WORD_SIZE))
    }

    /// Looks up the range `mb` on behalf of an access of `size` bytes at `ea`
    /// and updates the set. Does not evict.
    pub fn access(&mut self, mb: &MemBlock, ea: u64, size: u32) -> AccessOutcome {
        self.stats.access();

        if self.is_collated_hit(mb) {
            let (mut block, consumed) = self.collate_partial(mb);
            block.update_access_pattern(ea, size);
            let handle = self.insert_block(block);
            let block = self.split(handle, ea);
            self.stats.hit();
            return AccessOutcome {
                kind: AccessKind::CollatedHit,
                transition: Transition::Collated { block, consumed },
            };
        }

        if self.is_full_hit(mb.start, mb.size()) {
            if let Some(handle) = self.floor(mb.start) {
                self.lru.move_to_front(handle);
                self.resident_mut(handle).update_access_pattern(ea, size);
                self.stats.hit();
                return AccessOutcome {
                    kind: AccessKind::FullHit,
                    transition: Transition::Hit(handle),
                };
            }
        }

        self.load(mb, ea, size)
    }

    /// Removes the least recently used block, logging it as a capacity
    /// eviction at instruction `ins`.
    pub fn evict_victim(&mut self, ins: u64) -> Option<EvictionRecord> {
        let handle = self.lru.back()?;
        let block = self.remove_block(handle);
        Some(self.stats.evict(&block, ins, false))
    }

    /// Drains the set tail first at the end of a run.
    pub fn purge(&mut self, ins: u64) {
        while let Some(handle) = self.lru.back() {
            let block = self.remove_block(handle);
            self.stats.evict(&block, ins, true);
        }
        assert_eq!(self.words_in_cache, 0, "purged set still accounts words");
    }

    /// Words of `[start, end]` that are not resident.
    pub fn miss_bandwidth(&self, start: u64, end: u64) -> u64 {
        (start..=end)
            .step_by(WORD_SIZE as usize)
            .filter(|&a| !self.is_full_hit(a, WORD_SIZE))
            .count() as u64
    }

    /// Checks the structural invariants of the set.
    pub fn verify(&self) -> Result<(), String> {
        if self.index.len() != self.lru.len() {
            return Err(format!(
                "index holds {} blocks, recency list {}",
                self.index.len(),
                self.lru.len()
            ));
        }
        let chunk_words = self.max_gran / WORD_SIZE;
        let mut accounted = 0;
        let mut prev_end: Option<u64> = None;
        for (&start, &h) in &self.index {
            let block = self
                .lru
                .get(h)
                .ok_or_else(|| format!("index entry {:#x} points at a free slot", start))?;
            if block.start != start {
                return Err(format!("block {:#x} indexed at {:#x}", block.start, start));
            }
            if block.words() > chunk_words {
                return Err(format!(
                    "block {:#x} holds {} words, limit {}",
                    start,
                    block.words(),
                    chunk_words
                ));
            }
            if let Some(end) = prev_end {
                if end >= start {
                    return Err(format!("block {:#x} overlaps its predecessor", start));
                }
            }
            prev_end = Some(block.end);
            accounted += block.words() + self.tag_overhead;
        }
        if accounted != self.words_in_cache {
            return Err(format!(
                "{} words accounted, {} resident",
                self.words_in_cache, accounted
            ));
        }
        Ok(())
    }

    fn load(&mut self, mb: &MemBlock, ea: u64, size: u32) -> AccessOutcome {
        if self.is_full_miss(mb) {
            let mut block = CacheBlock::new(mb.start, mb.end, mb.ins_count);
            let bandwidth = self.miss_bandwidth(mb.start, mb.end);
            self.stats.miss(bandwidth);
            block.set_access_pattern(ea, size);
            let handle = self.insert_block(block);
            AccessOutcome {
                kind: AccessKind::Miss,
                transition: Transition::Loaded(self.split(handle, ea)),
            }
        } else {
            let (mut block, consumed) = self.collate_partial(mb);
            block.update_access_pattern(ea, size);
            let handle = self.insert_block(block);
            AccessOutcome {
                kind: AccessKind::PartialMiss,
                transition: Transition::Collated {
                    block: self.split(handle, ea),
                    consumed,
                },
            }
        }
    }

    /// Builds the union of `mb` and every resident block it touches, logs the
    /// missing words and absorbs the touched blocks. The returned block is not
    /// yet resident.
    fn collate_partial(&mut self, mb: &MemBlock) -> (CacheBlock, Vec<CacheBlock>) {
        let start = match self.floor(mb.start).map(|h| self.resident(h)) {
            Some(b) if b.end >= mb.start => b.start,
            _ => mb.start,
        };
        let end = match self.floor(mb.end).map(|h| self.resident(h)) {
            Some(b) => b.end.max(mb.end),
            None => mb.end,
        };

        let mut block = CacheBlock::new(start, end, mb.ins_count);
        let bandwidth = self.miss_bandwidth(start, end);
        self.stats.miss(bandwidth);
        let consumed = self.absorb(&mut block);
        (block, consumed)
    }

    /// Moves the counters of every resident block starting inside `block`
    /// into it and removes those blocks.
    fn absorb(&mut self, block: &mut CacheBlock) -> Vec<CacheBlock> {
        let handles: Vec<BlockHandle> = self
            .index
            .range(block.start..=block.end)
            .map(|(_, &h)| h)
            .collect();

        let mut consumed = Vec::with_capacity(handles.len());
        for handle in handles {
            let old = self.remove_block(handle);
            debug_assert!(old.end <= block.end, "absorbed block sticks out of the union");
            let offset = ((old.start - block.start) / WORD_SIZE) as usize;
            let dst = block.counters_mut();
            for (i, &c) in old.counters().iter().enumerate() {
                if let Some(slot) = dst.get_mut(offset + i) {
                    *slot = c;
                }
            }
            consumed.push(old);
        }
        consumed
    }

    /// Cuts a resident block into `max_gran` chunks. The chunk holding `ea`
    /// ends up most recently used; the other chunks sit right behind it in
    /// address order. Without such a chunk the lowest one is most recently
    /// used. Returns the handle of the most recently used chunk.
    fn split(&mut self, handle: BlockHandle, ea: u64) -> BlockHandle {
        let chunk_words = self.max_gran / WORD_SIZE;
        let words = self.resident(handle).words();
        if words <= chunk_words {
            return handle;
        }

        let original = self.remove_block(handle);
        let count = words.div_ceil(chunk_words);
        assert!(count > 0, "split of {:#x} produced no chunks", original.start);

        let mut others = Vec::with_capacity(count as usize);
        let mut touched = None;
        for i in 0..count {
            let start = original.start + i * self.max_gran;
            let first = (i * chunk_words) as usize;
            let last = ((i + 1) * chunk_words).min(words) as usize;
            let chunk = CacheBlock::with_counters(
                start,
                original.ins_insert,
                original.counters()[first..last].to_vec(),
            );
            if ea >= start && ea < start + self.max_gran {
                touched = Some(chunk);
            } else {
                others.push(chunk);
            }
        }

        let mut mru = None;
        for chunk in others.into_iter().rev().chain(touched) {
            mru = Some(self.insert_block(chunk));
        }
        mru.expect("split installs at least one chunk")
    }

    /// Makes `block` resident at the MRU position.
    fn insert_block(&mut self, block: CacheBlock) -> BlockHandle {
        let start = block.start;
        self.words_in_cache += block.words() + self.tag_overhead;
        let handle = self.lru.push_front(block);
        let prev = self.index.insert(start, handle);
        assert!(prev.is_none(), "two resident blocks start at {:#x}", start);
        handle
    }

    fn remove_block(&mut self, handle: BlockHandle) -> CacheBlock {
        let block = self
            .lru
            .remove(handle)
            .expect("index entry points at a live block");
        let removed = self.index.remove(&block.start);
        assert_eq!(
            removed,
            Some(handle),
            "index and recency list disagree at {:#x}",
            block.start
        );
        self.words_in_cache -= block.words() + self.tag_overhead;
        block
    }

    fn resident(&self, handle: BlockHandle) -> &CacheBlock {
        self.lru
            .get(handle)
            .expect("index entry points at a live block")
    }

    fn resident_mut(&mut self, handle: BlockHandle) -> &mut CacheBlock {
        self.lru
            .get_mut(handle)
            .expect("index entry points at a live block")
    }
}
