//! # Report Tests
//!
//! Aggregation, undefined averages and the three output formats.

use flexcache::ReportFormat;
use flexcache::core::block::CacheBlock;
use flexcache::stats::{Report, SetStats};
use pretty_assertions::assert_eq;

fn logged() -> SetStats {
    let mut stats = SetStats::new();
    for _ in 0..4 {
        stats.access();
    }
    stats.hit();
    stats.miss(8);
    stats.miss(8);
    stats.miss(2);
    stats.evict(&CacheBlock::with_counters(0x0, 10, vec![1, 1, 1, 1]), 40, false);
    stats.evict(&CacheBlock::with_counters(0x40, 20, vec![1, 0, 0, 0]), 60, false);
    stats
}

#[test]
fn test_verbose_report() {
    let report = Report::aggregate([&logged()], 1024);
    let text = report.to_string();
    let expected = "\
Accesses: 4
Hits: 1
Hits/1kIns: 0.9765625
Misses: 3
Misses/1kIns: 2.9296875
Evictions: 2
Average Eviction Latency: 30
Average LifeSpan: 35
Percent Utilization: 62.5
Miss Bandwidth: 18 words
1 Word Accessed: 50 %
4 Word Accessed: 50 %
2 Word loads occurred 1 times
8 Word loads occurred 2 times
";
    assert_eq!(text, expected);
}

#[test]
fn test_csv_report() {
    let report = Report::aggregate([&logged()], 1024);
    assert_eq!(
        report.to_csv(),
        "4,1,0.9765625,3,2.9296875,2,30,35,0.625,18,1,50,4,50,2,1,8,2"
    );
}

#[test]
fn test_json_report_has_null_for_undefined() {
    let report = Report::aggregate([&SetStats::new()], 0);
    let mut out = Vec::new();
    report.write(ReportFormat::Json, &mut out).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["avg_life_span"]["value"], serde_json::Value::Null);
    assert_eq!(value["avg_life_span"]["samples"], 0);
    assert_eq!(value["counters"]["access"], 0);
}

#[test]
fn test_empty_csv_fields_for_undefined() {
    let report = Report::aggregate([&SetStats::new()], 0);
    assert_eq!(report.to_csv(), "0,0,,0,,0,,,,0");
}
