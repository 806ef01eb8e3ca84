//! # Scenario Tests
//!
//! Small traces whose statistics can be worked out by hand.

use flexcache::sim::TraceRecord;
use flexcache::{AccessMode, SimConfig, Simulator};
use pretty_assertions::assert_eq;

fn record(ins_count: u64, ea: u64, size: u32) -> flexcache::Result<TraceRecord> {
    Ok(TraceRecord {
        ins_count,
        op: 'R',
        ip: 0x400000,
        ea,
        size,
    })
}

// ══════════════════════════════════════════════════════════
// Aligned streaming
// ══════════════════════════════════════════════════════════

/// One set of eight 64-byte lines streaming over twenty lines.
fn streaming_config() -> SimConfig {
    SimConfig {
        set_count: 1,
        set_size_bytes: 512,
        max_gran_bytes: 64,
        mode: AccessMode::Aligned,
        warmup_instructions: 1_000_000_000,
        sim_instructions: 0,
        ..SimConfig::default()
    }
}

#[test]
fn test_aligned_stream_evicts_in_order() {
    crate::init_logging();
    let mut sim = Simulator::new(streaming_config()).unwrap();
    for i in 0..20u64 {
        assert_eq!(sim.access(i * 64, 64, i + 1), 200);
    }
    assert_eq!(sim.predictor_name(), "aligned");
    assert_eq!(sim.total_latency(), 20 * 200);

    let before = sim.controller().report();
    assert_eq!(before.counters.access, 20);
    assert_eq!(before.counters.miss, 20);
    assert_eq!(before.counters.hit, 0);
    assert_eq!(before.counters.eviction, 12);

    let set = &sim.controller().sets()[0];
    assert_eq!(set.words_in_cache(), 64);
    let resident: Vec<u64> = set.blocks_by_address().map(|b| b.start).collect();
    let expected: Vec<u64> = (12..20).map(|i| i * 64).collect();
    assert_eq!(resident, expected);

    let report = sim.finish().unwrap();
    assert_eq!(report.counters.eviction, 20);
    assert_eq!(report.sim_instructions, 19);
    assert_eq!(report.utilization.value, Some(1.0));
    assert_eq!(report.avg_eviction_latency.value, Some(1.0));
    assert_eq!(report.avg_life_span.value, Some(6.2));
    assert_eq!(report.miss_bandwidth_words, 160);
    assert_eq!(report.bandwidth_distribution.get(&8), Some(&20));
    assert_eq!(report.access_pattern.get(&8), Some(&20));
    assert!(sim.controller().sets()[0].is_empty());
}

#[test]
fn test_rereading_resident_lines_hits() {
    let mut sim = Simulator::new(streaming_config()).unwrap();
    sim.access(0x0, 8, 1);
    sim.access(0x40, 8, 2);
    assert_eq!(sim.access(0x8, 8, 3), 50);
    assert_eq!(sim.access(0x78, 8, 4), 50);

    let report = sim.controller().report();
    assert_eq!(report.counters.hit, 2);
    assert_eq!(report.counters.miss, 2);
}

// ══════════════════════════════════════════════════════════
// Run loop
// ══════════════════════════════════════════════════════════

#[test]
fn test_budget_stops_after_crossing_record() {
    let config = SimConfig {
        sim_instructions: 5,
        ..SimConfig::default()
    };
    let mut sim = Simulator::new(config).unwrap();
    let trace = (10..=20).map(|ins| record(ins, ins * 0x100, 8));

    let consumed = sim.run(trace).unwrap();
    assert_eq!(consumed, 7);
    assert_eq!(sim.records(), 7);
    assert_eq!(sim.controller().last_ins(), 16);
}

#[test]
fn test_unbounded_budget_runs_whole_trace() {
    crate::init_logging();
    let config = SimConfig {
        sim_instructions: u64::MAX,
        warmup_instructions: u64::MAX,
        ..SimConfig::default()
    };
    let mut sim = Simulator::new(config).unwrap();
    let trace = (10..=20).map(|ins| record(ins, ins * 0x100, 8));
    assert_eq!(sim.run(trace).unwrap(), 11);
    assert!(!sim.controller().is_warmed_up());
    assert_eq!(sim.controller().report().counters.access, 11);
}

#[test]
fn test_zero_budget_runs_whole_trace() {
    let config = SimConfig {
        sim_instructions: 0,
        ..SimConfig::default()
    };
    let mut sim = Simulator::new(config).unwrap();
    let consumed = sim.run((1..=50).map(|ins| record(ins, ins * 8, 8))).unwrap();
    assert_eq!(consumed, 50);
}

#[test]
fn test_trace_error_stops_the_run() {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    let trace = vec![
        record(1, 0x0, 8),
        Err(flexcache::SimError::Trace {
            line: 2,
            reason: "bad".into(),
        }),
        record(3, 0x40, 8),
    ];
    let err = sim.run(trace).unwrap_err();
    assert!(matches!(err, flexcache::SimError::Trace { line: 2, .. }));
    assert_eq!(sim.records(), 1);
}

#[test]
fn test_run_trace_from_file() {
    crate::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.txt");
    std::fs::write(&path, "1 R 0x400000 0x0 8\n2 R 0x400004 0x0 8\n3 W 0x400008 0x8 8\n").unwrap();

    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    assert_eq!(sim.run_trace(&path).unwrap(), 3);
    let report = sim.finish().unwrap();
    assert_eq!(report.counters.access, 3);
    assert_eq!(report.counters.hit, 1);
    assert_eq!(report.counters.miss, 2);
}

// ══════════════════════════════════════════════════════════
// Edge cases
// ══════════════════════════════════════════════════════════

#[test]
fn test_zero_size_access_is_one_byte() {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    assert_eq!(sim.access(0x40, 0, 1), 200);
    assert_eq!(sim.predictor_name(), "exact");

    let report = sim.controller().report();
    assert_eq!(report.counters.miss, 1);
    assert_eq!(report.bandwidth_distribution.get(&1), Some(&1));

    let set = &sim.controller().sets()[sim.controller().get_index(0x40)];
    let block = set.block_at(0x40).unwrap();
    assert_eq!((block.start, block.end), (0x40, 0x40));
    assert_eq!(block.counters(), &[1]);

    assert_eq!(sim.access(0x40, 0, 2), 50);
}

#[test]
fn test_access_across_sets_costs_both_halves() {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    // 0x38..0x48 touches the last word of set 0 and the first of set 1.
    assert_eq!(sim.access(0x38, 16, 1), 400);
    let controller = sim.controller();
    assert_eq!(controller.sets()[0].block_count(), 1);
    assert_eq!(controller.sets()[1].block_count(), 1);
    assert_eq!(controller.report().counters.access, 2);
}

#[test]
fn test_warmup_resets_statistics_once() {
    let config = SimConfig {
        warmup_instructions: 10,
        ..SimConfig::default()
    };
    let mut sim = Simulator::new(config).unwrap();
    sim.access(0x0, 8, 1);
    sim.access(0x1000, 8, 5);
    assert!(!sim.controller().is_warmed_up());

    sim.access(0x2000, 8, 12);
    assert!(sim.controller().is_warmed_up());
    assert_eq!(sim.controller().report().counters.access, 0);

    assert_eq!(sim.access(0x0, 8, 13), 50);
    let report = sim.controller().report();
    assert_eq!(report.counters.access, 1);
    assert_eq!(report.counters.hit, 1);

    sim.access(0x3000, 8, 100);
    assert_eq!(sim.controller().report().counters.access, 2);
}
