//! # Controller Tests
//!
//! Routing of ranges to sets, spanning ranges, capacity eviction, warm-up
//! and report aggregation.

use flexcache::config::{AccessMode, SimConfig};
use flexcache::core::controller::CacheController;
use flexcache::core::memblock::MemBlock;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rstest::rstest;

fn config(set_count: u32, warmup_instructions: u64) -> SimConfig {
    SimConfig {
        set_count,
        set_size_bytes: 256,
        max_gran_bytes: 64,
        mode: AccessMode::Aligned,
        warmup_instructions,
        sim_instructions: 0,
        ..SimConfig::default()
    }
}

fn line(addr: u64, ins: u64) -> MemBlock {
    MemBlock::new(addr, addr + 56, ins, 1)
}

#[rstest]
#[case(0x0, 0)]
#[case(0x40, 1)]
#[case(0x80, 2)]
#[case(0xc0, 3)]
#[case(0x100, 0)]
#[case(0x1_0000_0048, 1)]
fn test_get_index(#[case] addr: u64, #[case] expected: usize) {
    let cc = CacheController::new(&config(4, 0));
    assert_eq!(cc.get_index(addr), expected);
}

#[test]
fn test_capacity_eviction_per_set() {
    // Four 8-word lines fill a 32-word set.
    let mut cc = CacheController::new(&config(1, 1_000_000));
    for i in 0..4 {
        assert_eq!(cc.access(&line(i * 64, i + 1), i * 64, 8), 200);
    }
    assert_eq!(cc.report().counters.eviction, 0);

    cc.access(&line(0x100, 5), 0x100, 8);
    let set = &cc.sets()[0];
    assert_eq!(set.words_in_cache(), 32);
    assert!(set.block_at(0x0).is_none());
    assert_eq!(cc.report().counters.eviction, 1);

    assert_eq!(cc.access(&line(0x100, 6), 0x108, 8), 50);
}

#[test]
fn test_evictions_stay_in_their_set() {
    let mut cc = CacheController::new(&config(2, 1_000_000));
    // Set 0 gets five lines, set 1 one line.
    cc.access(&line(0x40, 1), 0x40, 8);
    for i in 0..5 {
        cc.access(&line(i * 128, i + 2), i * 128, 8);
    }
    assert_eq!(cc.sets()[0].block_count(), 4);
    assert_eq!(cc.sets()[1].block_count(), 1);
    assert_eq!(cc.sets()[0].stats().counters.eviction, 1);
    assert_eq!(cc.sets()[1].stats().counters.eviction, 0);
}

#[test]
fn test_warmup_reset_happens_once() {
    let mut cc = CacheController::new(&config(1, 10));
    cc.access(&line(0x0, 1), 0x0, 8);
    cc.access(&line(0x40, 5), 0x40, 8);
    assert!(!cc.is_warmed_up());
    assert_eq!(cc.report().counters.access, 2);

    // 1 + 10 < 12
    cc.access(&line(0x80, 12), 0x80, 8);
    assert!(cc.is_warmed_up());
    assert_eq!(cc.report().counters.access, 0);
    assert_eq!(cc.report().counters.miss, 0);
    assert_eq!(cc.sets()[0].block_count(), 3);

    cc.access(&line(0x0, 13), 0x0, 8);
    cc.access(&line(0xc0, 30), 0xc0, 8);
    let report = cc.report();
    assert_eq!(report.counters.access, 2);
    assert_eq!(report.counters.hit, 1);
    assert_eq!(report.counters.miss, 1);
    assert_eq!(cc.first_ins(), Some(1));
    assert_eq!(report.sim_instructions, 29);
}

#[test]
fn test_hint_records_sorted_by_address() {
    let dumping = SimConfig {
        hint_dir: Some(PathBuf::from("hints")),
        ..config(2, 1_000_000)
    };
    let mut cc = CacheController::new(&dumping);
    for (i, addr) in [0x1c0u64, 0x40, 0x100, 0x0].into_iter().enumerate() {
        cc.access(&line(addr, i as u64 + 1), addr, 8);
    }
    cc.purge(10);
    let addrs: Vec<u64> = cc.hint_records().iter().map(|r| r.block_address()).collect();
    assert_eq!(addrs, vec![0x0, 0x40, 0x100, 0x1c0]);
    assert!(cc.sets().iter().all(|s| s.is_empty()));
}

#[test]
fn test_per_set_reports_add_up() {
    let mut cc = CacheController::new(&config(4, 1_000_000));
    for i in 0..16u64 {
        cc.access(&line(i * 64, i + 1), i * 64, 8);
    }
    let per_set = cc.report_per_set();
    assert_eq!(per_set.len(), 4);
    assert!(per_set.iter().all(|r| r.counters.access == 4));
    let total: u64 = per_set.iter().map(|r| r.counters.miss).sum();
    assert_eq!(total, cc.report().counters.miss);
}

#[test]
fn test_no_hints_without_dump() {
    let mut cc = CacheController::new(&config(1, 1_000_000));
    for i in 0..6u64 {
        cc.access(&line(i * 64, i + 1), i * 64, 8);
    }
    cc.purge(10);
    assert_eq!(cc.report().counters.eviction, 6);
    assert!(cc.hint_records().is_empty());
}

#[test]
fn test_unbounded_warmup_never_resets() {
    let mut cc = CacheController::new(&config(1, u64::MAX));
    cc.access(&line(0x0, 5), 0x0, 8);
    cc.access(&line(0x40, u64::MAX), 0x40, 8);
    assert!(!cc.is_warmed_up());
    assert_eq!(cc.report().counters.access, 2);
}

// ══════════════════════════════════════════════════════════
// Spanning ranges
// ══════════════════════════════════════════════════════════

#[test]
fn test_range_wrapping_to_its_own_set_is_split() {
    let mut cc = CacheController::new(&config(2, 1_000_000));
    // 0x38..=0xb8 starts and ends in set 0 but crosses set 1.
    let mb = MemBlock::new(0x38, 0xb8, 1, 1);
    assert!(!cc.is_set_spanning_block(&mb));
    assert_eq!(cc.access(&mb, 0x38, 136), 600);

    let set0: Vec<(u64, u64)> = cc.sets()[0]
        .blocks_by_address()
        .map(|b| (b.start, b.end))
        .collect();
    let set1: Vec<(u64, u64)> = cc.sets()[1]
        .blocks_by_address()
        .map(|b| (b.start, b.end))
        .collect();
    assert_eq!(set0, vec![(0x38, 0x38), (0x80, 0xb8)]);
    assert_eq!(set1, vec![(0x40, 0x78)]);

    assert_eq!(cc.access(&MemBlock::new(0x40, 0x40, 2, 1), 0x40, 8), 50);
}
