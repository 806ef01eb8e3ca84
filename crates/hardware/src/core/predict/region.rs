//! Region-histogram predictor.
//!
//! Hints from an aligned run record which words of every evicted block were
//! touched. Each maximal run of touched words is one sample of "how much of
//! a fetch gets used" in the region holding the block. A flexible run
//! replays those samples and fetches, per region, the most frequent run
//! length.
//!
//! # Performance
//!
//! - **Time Complexity:** `predict()` is O(log r + k) for r regions and k
//!   distinct run lengths (k <= 16)
//! - **Space Complexity:** O(r * k)

use std::collections::BTreeMap;

use super::{AlignedPredictor, FetchPredictor, gran_align, is_spanning_access};
use crate::common::{REGION_THRESHOLD, WORD_SIZE};
use crate::core::memblock::MemBlock;
use crate::core::record::EvictionRecord;

/// Run-length histogram per region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionHistogram {
    bin_shift: u32,
    /// Region -> run length in words -> samples.
    bins: BTreeMap<u64, BTreeMap<u32, u64>>,
    samples: BTreeMap<u64, u64>,
}

/// Descriptive statistics of one region's run lengths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunLengthSummary {
    pub samples: u64,
    pub mean: f64,
    /// Sample variance; `None` with fewer than two samples.
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
}

impl RegionHistogram {
    /// Empty histogram over regions of `bin_size` bytes (a power of two).
    pub fn new(bin_size: u64) -> Self {
        Self {
            bin_shift: bin_size.trailing_zeros(),
            ..Self::default()
        }
    }

    /// Histogram of every run in `records`.
    pub fn from_records<'a, I>(records: I, bin_size: u64) -> Self
    where
        I: IntoIterator<Item = &'a EvictionRecord>,
    {
        let mut histogram = Self::new(bin_size);
        for record in records {
            histogram.add_record(record);
        }
        histogram
    }

    /// Adds one sample per run of touched words in `record`.
    pub fn add_record(&mut self, record: &EvictionRecord) {
        let region = self.region_of(record.block_address());
        for (first, last) in record.occupied_runs() {
            let len = record.isolate_run(first, last).word_count();
            *self
                .bins
                .entry(region)
                .or_default()
                .entry(len)
                .or_insert(0) += 1;
            *self.samples.entry(region).or_insert(0) += 1;
        }
    }

    #[inline]
    pub fn region_of(&self, addr: u64) -> u64 {
        addr >> self.bin_shift
    }

    /// Run length -> samples for `region`.
    pub fn region_histogram(&self, region: u64) -> Option<&BTreeMap<u32, u64>> {
        self.bins.get(&region)
    }

    pub fn region_samples(&self, region: u64) -> u64 {
        self.samples.get(&region).copied().unwrap_or(0)
    }

    pub fn region_count(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Most frequent run length of `region`; ties go to the shorter run.
    pub fn dominant_run(&self, region: u64) -> Option<u32> {
        let mut best: Option<(u32, u64)> = None;
        for (&len, &n) in self.bins.get(&region)? {
            if best.is_none_or(|(_, max)| n > max) {
                best = Some((len, n));
            }
        }
        best.map(|(len, _)| len)
    }

    /// Mean and spread of the run lengths of `region`.
    pub fn summary(&self, region: u64) -> Option<RunLengthSummary> {
        let bins = self.bins.get(&region)?;
        let (mut n, mut sum, mut sum_sq) = (0u64, 0f64, 0f64);
        for (&len, &count) in bins {
            let len = f64::from(len);
            n += count;
            sum += len * count as f64;
            sum_sq += len * len * count as f64;
        }
        if n == 0 {
            return None;
        }
        let mean = sum / n as f64;
        let variance = (n > 1).then(|| (sum_sq - sum * sum / n as f64) / (n - 1) as f64);
        Some(RunLengthSummary {
            samples: n,
            mean,
            variance,
            std_dev: variance.map(f64::sqrt),
        })
    }

    /// The most sampled regions, in region order.
    ///
    /// `top` is both a percentage of all regions and an absolute cap: at most
    /// `min(regions * top / 100, top)` regions are returned. Ties go to the
    /// lower region.
    pub fn top_regions(&self, top: usize) -> Vec<u64> {
        let keep = (self.samples.len() * top / 100).min(top);
        let mut ranked: Vec<(u64, u64)> = self.samples.iter().map(|(&r, &n)| (r, n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut regions: Vec<u64> = ranked.into_iter().take(keep).map(|(r, _)| r).collect();
        regions.sort_unstable();
        regions
    }
}

/// Sizes fetches from the run-length histogram of the accessed region and
/// falls back to aligned chunks in regions without samples.
#[derive(Clone, Debug)]
pub struct RegionPredictor {
    histogram: RegionHistogram,
    max_gran: u64,
    threshold: u64,
    fallback: AlignedPredictor,
}

impl RegionPredictor {
    pub fn new(histogram: RegionHistogram, max_gran: u64) -> Self {
        Self {
            histogram,
            max_gran,
            threshold: REGION_THRESHOLD,
            fallback: AlignedPredictor::new(max_gran),
        }
    }

    /// Minimum samples a region needs before its histogram is trusted.
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn histogram(&self) -> &RegionHistogram {
        &self.histogram
    }
}

impl FetchPredictor for RegionPredictor {
    fn predict(&self, ea: u64, size: u64, ins_count: u64) -> Vec<MemBlock> {
        let region = self.histogram.region_of(ea);
        if self.histogram.region_samples(region) < self.threshold {
            return self.fallback.chunks(ea, size, ins_count);
        }

        let gran = u64::from(self.histogram.dominant_run(region).unwrap_or(1));
        let words = size.div_ceil(WORD_SIZE).max(1);
        let end = if is_spanning_access(ea, size, self.max_gran) {
            ea + (words - 1) * WORD_SIZE
        } else if is_spanning_access(ea, gran * WORD_SIZE, self.max_gran) {
            gran_align(ea, self.max_gran) + self.max_gran - WORD_SIZE
        } else {
            ea + (gran.max(words) - 1) * WORD_SIZE
        };
        vec![MemBlock::new(ea, end, ins_count, 1)]
    }

    fn name(&self) -> &'static str {
        "region"
    }
}
