//! Simulation statistics.
//!
//! Every set owns a [`SetStats`] logger that reacts to cache events (access,
//! hit, miss, eviction). At the end of a run the loggers are folded into a
//! [`Report`], which is printed as text, CSV or JSON.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::block::CacheBlock;
use crate::core::record::EvictionRecord;

/// Aggregated report and its formatting.
pub mod report;

pub use self::report::{Average, Report};

/// Event counters of one set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub access: u64,
    pub hit: u64,
    pub miss: u64,
    pub eviction: u64,
    /// Words touched at least once, summed over evicted blocks.
    pub word_utilization: u64,
    /// Words never touched, summed over evicted blocks.
    pub word_waste: u64,
    /// Instructions between insertion and eviction, summed over evicted blocks.
    pub life_span: u64,
    /// Instructions between consecutive evictions, summed.
    pub eviction_latency: u64,
}

impl Counters {
    /// Adds `other` into `self`.
    pub fn accumulate(&mut self, other: &Counters) {
        self.access += other.access;
        self.hit += other.hit;
        self.miss += other.miss;
        self.eviction += other.eviction;
        self.word_utilization += other.word_utilization;
        self.word_waste += other.word_waste;
        self.life_span += other.life_span;
        self.eviction_latency += other.eviction_latency;
    }
}

/// Per-set statistics logger.
#[derive(Clone, Debug, Default)]
pub struct SetStats {
    /// Event counters.
    pub counters: Counters,
    /// Instruction count of the last capacity eviction.
    pub eviction_timer: u64,
    /// Miss bandwidth in words -> number of misses with that bandwidth.
    pub bandwidth: BTreeMap<u64, u64>,
    /// Touched words at eviction -> number of evicted blocks.
    pub access_pattern: BTreeMap<u32, u64>,
    /// Records of every block that left the set, in eviction order. Empty
    /// unless hint collection is on.
    pub hints: Vec<EvictionRecord>,
    keep_hints: bool,
}

impl SetStats {
    /// Logger that does not keep eviction records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger that keeps a record of every evicted block.
    pub fn with_hints() -> Self {
        Self {
            keep_hints: true,
            ..Self::default()
        }
    }

    pub fn keeps_hints(&self) -> bool {
        self.keep_hints
    }

    pub fn set_keep_hints(&mut self, keep: bool) {
        self.keep_hints = keep;
    }

    #[inline]
    pub fn access(&mut self) {
        self.counters.access += 1;
    }

    #[inline]
    pub fn hit(&mut self) {
        self.counters.hit += 1;
    }

    /// Records a load that needed `bandwidth` words from the next level.
    ///
    /// A bandwidth of zero is a same-level collation where every word was
    /// already resident; it is not a miss.
    pub fn miss(&mut self, bandwidth: u64) {
        if bandwidth != 0 {
            self.counters.miss += 1;
            *self.bandwidth.entry(bandwidth).or_insert(0) += 1;
        }
    }

    /// Records `block` leaving the set at instruction `ins_count`.
    ///
    /// Purges at the end of a run do not move the eviction timer. Returns the
    /// record of the block; it is kept as a hint only when collection is on.
    pub fn evict(&mut self, block: &CacheBlock, ins_count: u64, is_purge: bool) -> EvictionRecord {
        let c = &mut self.counters;
        c.eviction += 1;
        c.eviction_latency += ins_count.saturating_sub(self.eviction_timer);
        c.life_span += ins_count.saturating_sub(block.ins_insert);

        let touched = block.touched_words();
        c.word_utilization += u64::from(touched);
        c.word_waste += block.words() - u64::from(touched);
        *self.access_pattern.entry(touched).or_insert(0) += 1;

        if !is_purge {
            self.eviction_timer = ins_count;
        }
        let record = EvictionRecord::from_block(block, ins_count);
        if self.keep_hints {
            self.hints.push(record);
        }
        record
    }

    /// Zeroes the counters and distributions after warm-up.
    ///
    /// The eviction timer and the collected hints survive the reset.
    pub fn reset(&mut self) {
        self.counters = Counters::default();
        self.bandwidth.clear();
        self.access_pattern.clear();
    }
}
