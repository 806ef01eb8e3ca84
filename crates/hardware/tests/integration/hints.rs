//! # Hint Round-Trip Tests
//!
//! An aligned run dumps its eviction records; a flexible run with the tag
//! allowance on top of the same geometry finds and replays them.

use std::fs;
use std::path::Path;

use flexcache::core::record::RECORD_SIZE;
use flexcache::sim::loader::read_hints;
use flexcache::{AccessMode, SimConfig, Simulator};
use pretty_assertions::assert_eq;

fn aligned_config(dir: &Path) -> SimConfig {
    SimConfig {
        set_count: 4,
        set_size_bytes: 4096,
        max_gran_bytes: 64,
        mode: AccessMode::Aligned,
        hint_dir: Some(dir.to_path_buf()),
        ..SimConfig::default()
    }
}

/// Reads the first two words of every line of the first 4 KiB.
fn run_aligned(dir: &Path) -> SimConfig {
    crate::init_logging();
    let config = aligned_config(dir);
    let mut sim = Simulator::new(config.clone()).unwrap();
    for i in 0..64u64 {
        sim.access(i * 64, 16, i + 1);
    }
    sim.finish().unwrap();
    config
}

#[test]
fn test_aligned_run_dumps_every_block() {
    let dir = tempfile::tempdir().unwrap();
    let config = run_aligned(dir.path());

    let path = config.hint_dump_path(dir.path());
    assert_eq!(path.file_name().unwrap(), "hint_4_16.bin");
    assert_eq!(fs::metadata(&path).unwrap().len(), (64 * RECORD_SIZE) as u64);

    let records = read_hints(&path).unwrap();
    assert_eq!(records.len(), 64);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.block_address(), i as u64 * 64);
        assert_eq!(record.counters(), &[1, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(record.ins_insert(), i as u64 + 1);
        assert_eq!(record.ins_evict(), 64);
        assert_eq!(record.occupied_runs(), vec![(0, 1)]);
    }
}

#[test]
fn test_flexible_run_replays_hints() {
    let dir = tempfile::tempdir().unwrap();
    run_aligned(dir.path());

    let flexible = SimConfig {
        set_size_bytes: 4096 + 256,
        mode: AccessMode::Flexible,
        ..aligned_config(dir.path())
    };
    let mut sim = Simulator::new(flexible).unwrap();
    assert_eq!(sim.predictor_name(), "region");

    // A one-word read in a region whose dominant run is two words fetches two.
    assert_eq!(sim.access(0x100, 8, 1), 200);
    let controller = sim.controller();
    let set = &controller.sets()[controller.get_index(0x100)];
    let block = set.block_at(0x100).unwrap();
    assert_eq!((block.start, block.end), (0x100, 0x108));
    assert_eq!(block.counters(), &[1, 0]);
    assert_eq!(sim.access(0x100, 8, 2), 50);

    // Region 1 has no samples and falls back to aligned chunks.
    sim.access(0x1008, 8, 4);
    let controller = sim.controller();
    let set = &controller.sets()[controller.get_index(0x1000)];
    let block = set.block_at(0x1008).unwrap();
    assert_eq!((block.start, block.end), (0x1000, 0x1038));
}

#[test]
fn test_flexible_run_does_not_dump() {
    let dir = tempfile::tempdir().unwrap();
    run_aligned(dir.path());
    let before = fs::read_dir(dir.path()).unwrap().count();

    let flexible = SimConfig {
        set_size_bytes: 4096 + 256,
        mode: AccessMode::Flexible,
        ..aligned_config(dir.path())
    };
    let mut sim = Simulator::new(flexible).unwrap();
    sim.access(0x0, 8, 1);
    sim.finish().unwrap();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), before);
}

#[test]
fn test_missing_hint_file_falls_back_to_exact() {
    crate::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let flexible = SimConfig {
        set_size_bytes: 4096 + 256,
        mode: AccessMode::Flexible,
        ..aligned_config(dir.path())
    };
    let sim = Simulator::new(flexible).unwrap();
    assert_eq!(sim.predictor_name(), "exact");
}
