//! Cache controller.
//!
//! The controller owns the sets of the simulated cache and routes every
//! predicted range to the set(s) owning it. It:
//! 1. **Indexes:** maps an address to a set by its `max_gran` region.
//! 2. **Splits:** cuts ranges that cross a set boundary and accesses each part
//!    in its own set.
//! 3. **Evicts:** drains the LRU tail of every touched set until it fits.
//! 4. **Warms up:** zeroes the statistics once, after the warm-up window.

use log::debug;

use super::cache::IdealCache;
use super::memblock::MemBlock;
use super::record::EvictionRecord;
use crate::common::WORD_SIZE;
use crate::config::SimConfig;
use crate::stats::Report;

/// Set-associative front of the flexible cache.
pub struct CacheController {
    sets: Vec<IdealCache>,
    set_mask: u64,
    gran_shift: u32,
    warmup: u64,
    first_ins: Option<u64>,
    last_ins: u64,
    warmed_up: bool,
}

impl CacheController {
    /// Builds `config.set_count` empty sets. The configuration must have
    /// passed [`SimConfig::validate`].
    pub fn new(config: &SimConfig) -> Self {
        let keep_hints = config.dumps_hints();
        let sets = (0..config.set_count)
            .map(|_| {
                let mut set = IdealCache::new(
                    config.set_size_words(),
                    config.max_gran_bytes,
                    config.tag_overhead(),
                );
                set.stats_mut().set_keep_hints(keep_hints);
                set
            })
            .collect();
        Self {
            sets,
            set_mask: u64::from(config.set_count) - 1,
            gran_shift: config.max_gran_bytes.trailing_zeros(),
            warmup: config.warmup_instructions,
            first_ins: None,
            last_ins: 0,
            warmed_up: false,
        }
    }

    /// Set owning `addr`.
    #[inline]
    pub fn get_index(&self, addr: u64) -> usize {
        ((addr >> self.gran_shift) & self.set_mask) as usize
    }

    /// Returns `true` if the ends of `mb` map to different sets.
    pub fn is_set_spanning_block(&self, mb: &MemBlock) -> bool {
        self.get_index(mb.start) != self.get_index(mb.end)
    }

    /// Accesses the range `mb` on behalf of an access of `size` bytes at `ea`
    /// and returns its latency. A range split over several sets costs the sum
    /// of its parts.
    pub fn access(&mut self, mb: &MemBlock, ea: u64, size: u32) -> u32 {
        let first = *self.first_ins.get_or_insert(mb.ins_count);
        self.last_ins = mb.ins_count;

        let mut touched = Vec::with_capacity(2);
        let latency = self.route(mb, ea, size, &mut touched);

        for idx in touched {
            let set = &mut self.sets[idx];
            while set.is_over_capacity() {
                if set.evict_victim(mb.ins_count).is_none() {
                    break;
                }
            }
            debug_assert!(
                set.words_in_cache() <= set.capacity(),
                "set {} over capacity after eviction",
                idx
            );
            debug_assert_eq!(set.verify(), Ok(()), "set {} is inconsistent", idx);
        }

        if !self.warmed_up && first.saturating_add(self.warmup) < mb.ins_count {
            debug!(
                "warm-up over at instruction {}, resetting statistics",
                mb.ins_count
            );
            for set in &mut self.sets {
                set.stats_mut().reset();
            }
            self.warmed_up = true;
        }

        latency
    }

    /// Returns `true` if `mb` has to be cut before it reaches a set: its ends
    /// map to different sets, or it covers enough regions to wrap around to
    /// its own set.
    fn needs_split(&self, mb: &MemBlock) -> bool {
        let regions = (mb.end >> self.gran_shift) - (mb.start >> self.gran_shift);
        self.is_set_spanning_block(mb) || (self.set_mask != 0 && regions > self.set_mask)
    }

    fn route(&mut self, mb: &MemBlock, ea: u64, size: u32, touched: &mut Vec<usize>) -> u32 {
        if self.needs_split(mb) {
            let boundary = ((mb.start >> self.gran_shift) + 1) << self.gran_shift;
            let lo = MemBlock::new(mb.start, boundary - WORD_SIZE, mb.ins_count, mb.mod_count);
            let hi = MemBlock::new(boundary, mb.end, mb.ins_count, mb.mod_count);
            return self.route(&lo, ea, size, touched) + self.route(&hi, ea, size, touched);
        }

        let idx = self.get_index(mb.start);
        if !touched.contains(&idx) {
            touched.push(idx);
        }
        self.sets[idx].access(mb, ea, size).kind.latency()
    }

    /// Drains every set at the end of a run.
    pub fn purge(&mut self, ins: u64) {
        for set in &mut self.sets {
            set.purge(ins);
        }
    }

    /// Instructions between the first and the last access.
    pub fn sim_instructions(&self) -> u64 {
        self.first_ins
            .map_or(0, |first| self.last_ins.saturating_sub(first))
    }

    pub fn first_ins(&self) -> Option<u64> {
        self.first_ins
    }

    pub fn last_ins(&self) -> u64 {
        self.last_ins
    }

    /// Returns `true` once the warm-up reset has happened.
    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up
    }

    pub fn sets(&self) -> &[IdealCache] {
        &self.sets
    }

    /// Statistics of the whole cache.
    pub fn report(&self) -> Report {
        Report::aggregate(self.sets.iter().map(IdealCache::stats), self.sim_instructions())
    }

    /// Statistics of each set, in set order.
    pub fn report_per_set(&self) -> Vec<Report> {
        self.sets
            .iter()
            .map(|set| Report::aggregate([set.stats()], self.sim_instructions()))
            .collect()
    }

    /// Every eviction record collected so far, ordered by block address.
    /// Records are only collected for runs that dump hints.
    pub fn hint_records(&self) -> Vec<EvictionRecord> {
        let mut records: Vec<EvictionRecord> = self
            .sets
            .iter()
            .flat_map(|set| set.stats().hints.iter().copied())
            .collect();
        records.sort_by_key(EvictionRecord::block_address);
        records
    }
}
