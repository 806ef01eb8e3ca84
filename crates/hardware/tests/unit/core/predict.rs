//! # Predictor Tests
//!
//! Aligned chunking, exact fallback and the region-histogram predictor.

use flexcache::core::memblock::MemBlock;
use flexcache::core::predict::{
    AlignedPredictor, ExactPredictor, FetchPredictor, RegionHistogram, RegionPredictor,
};
use flexcache::core::record::EvictionRecord;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn ranges(blocks: &[MemBlock]) -> Vec<(u64, u64)> {
    blocks.iter().map(|b| (b.start, b.end)).collect()
}

#[rstest]
#[case::contained(0x48, 8, vec![(0x40, 0x78)])]
#[case::whole_line(0x40, 64, vec![(0x40, 0x78)])]
#[case::crosses_one_boundary(0x38, 16, vec![(0x0, 0x38), (0x40, 0x78)])]
#[case::crosses_two_boundaries(0x38, 80, vec![(0x0, 0x38), (0x40, 0x78), (0x80, 0xb8)])]
fn test_aligned_chunks(#[case] ea: u64, #[case] size: u64, #[case] expected: Vec<(u64, u64)>) {
    let p = AlignedPredictor::new(64);
    assert_eq!(ranges(&p.predict(ea, size, 1)), expected);
}

#[test]
fn test_exact_fetches_the_access() {
    let blocks = ExactPredictor.predict(0x1008, 24, 42);
    assert_eq!(ranges(&blocks), vec![(0x1008, 0x1018)]);
    assert_eq!(blocks[0].ins_count, 42);
    assert_eq!(ExactPredictor.name(), "exact");
}

fn trained(records: &[EvictionRecord]) -> RegionPredictor {
    RegionPredictor::new(RegionHistogram::from_records(records, 4096), 64)
}

#[test]
fn test_region_without_samples_falls_back_to_aligned() {
    let p = trained(&[EvictionRecord::new(0x0, &[1, 1, 1], 0, 1)]);
    assert_eq!(ranges(&p.predict(0x2008, 8, 1)), vec![(0x2000, 0x2038)]);
    assert_eq!(ranges(&p.predict(0x2038, 16, 1)), vec![(0x2000, 0x2038), (0x2040, 0x2078)]);
}

#[test]
fn test_region_fetches_dominant_run() {
    let p = trained(&[
        EvictionRecord::new(0x0, &[1, 1, 1, 0, 0, 0, 0, 0], 0, 1),
        EvictionRecord::new(0x40, &[0, 1, 1, 1, 0, 0, 0, 0], 0, 1),
        EvictionRecord::new(0x80, &[1, 0, 0, 0, 0, 0, 0, 0], 0, 1),
    ]);
    assert_eq!(p.histogram().dominant_run(0), Some(3));
    // Three words from the access.
    assert_eq!(ranges(&p.predict(0x208, 8, 1)), vec![(0x208, 0x218)]);
    // The access is longer than the run.
    assert_eq!(ranges(&p.predict(0x200, 32, 1)), vec![(0x200, 0x218)]);
    // Three words would cross the line: stop at its end.
    assert_eq!(ranges(&p.predict(0x230, 8, 1)), vec![(0x230, 0x238)]);
    // The access itself crosses the line.
    assert_eq!(ranges(&p.predict(0x238, 16, 1)), vec![(0x238, 0x240)]);
}

#[test]
fn test_threshold_gates_the_histogram() {
    let p = trained(&[EvictionRecord::new(0x0, &[1, 1], 0, 1)]).with_threshold(2);
    assert_eq!(ranges(&p.predict(0x8, 8, 1)), vec![(0x0, 0x38)]);
}

#[test]
fn test_histogram_counts_every_run() {
    let h = RegionHistogram::from_records(
        &[
            EvictionRecord::new(0x1000, &[1, 0, 1, 1, 0, 2, 2, 2], 0, 1),
            EvictionRecord::new(0x1ff8, &[1], 0, 1),
            EvictionRecord::new(0x2000, &[0, 0], 0, 1),
        ],
        4096,
    );
    assert_eq!(h.region_samples(1), 4);
    let bins: Vec<(u32, u64)> = h
        .region_histogram(1)
        .unwrap()
        .iter()
        .map(|(&k, &v)| (k, v))
        .collect();
    assert_eq!(bins, vec![(1, 2), (2, 1), (3, 1)]);
    assert_eq!(h.region_samples(2), 0);
    assert_eq!(h.region_count(), 1);
}

#[test]
fn test_top_regions_caps_by_percentage_and_count() {
    let mut records = Vec::new();
    for region in 0..20u64 {
        for _ in 0..=region {
            records.push(EvictionRecord::new(region << 12, &[1], 0, 1));
        }
    }
    let h = RegionHistogram::from_records(&records, 4096);
    assert_eq!(h.top_regions(10), vec![18, 19]);
    assert_eq!(h.top_regions(100), (0..20).collect::<Vec<u64>>());
    assert!(h.top_regions(0).is_empty());
}
