//! Aggregated statistics report.
//!
//! A `Report` folds the per-set loggers of a controller into one set of
//! counters and distributions and derives the rates and averages. Ratios
//! whose denominator is zero are [`Average`]s without a value rather than
//! NaN, and print as `undefined (0 samples)`.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use super::{Counters, SetStats};
use crate::config::ReportFormat;

/// A ratio together with the number of samples behind it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Average {
    /// `None` when there were no samples.
    pub value: Option<f64>,
    pub samples: u64,
}

impl Average {
    pub fn of(total: u64, samples: u64) -> Self {
        Self {
            value: (samples != 0).then(|| total as f64 / samples as f64),
            samples,
        }
    }

    /// Same ratio scaled by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            value: self.value.map(|v| v * factor),
            samples: self.samples,
        }
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "undefined ({} samples)", self.samples),
        }
    }
}

/// Final statistics of a run (or of one set).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// Instructions between the first and last access seen.
    pub sim_instructions: u64,
    pub counters: Counters,
    pub hits_per_kilo_ins: Average,
    pub misses_per_kilo_ins: Average,
    pub avg_eviction_latency: Average,
    pub avg_life_span: Average,
    /// Fraction of evicted words touched at least once.
    pub utilization: Average,
    /// Total words fetched from the next level.
    pub miss_bandwidth_words: u64,
    /// Touched words per evicted block -> number of blocks.
    pub access_pattern: BTreeMap<u32, u64>,
    /// Words fetched per miss -> number of misses.
    pub bandwidth_distribution: BTreeMap<u64, u64>,
}

impl Report {
    /// Aggregates the loggers of every set.
    pub fn aggregate<'a, I>(sets: I, sim_instructions: u64) -> Self
    where
        I: IntoIterator<Item = &'a SetStats>,
    {
        let mut counters = Counters::default();
        let mut access_pattern = BTreeMap::new();
        let mut bandwidth_distribution = BTreeMap::new();

        for stats in sets {
            counters.accumulate(&stats.counters);
            for (&words, &n) in &stats.access_pattern {
                *access_pattern.entry(words).or_insert(0) += n;
            }
            for (&bw, &n) in &stats.bandwidth {
                *bandwidth_distribution.entry(bw).or_insert(0) += n;
            }
        }

        let miss_bandwidth_words = bandwidth_distribution.iter().map(|(bw, n)| bw * n).sum();

        Self {
            sim_instructions,
            counters,
            hits_per_kilo_ins: Average::of(counters.hit, sim_instructions).scaled(1000.0),
            misses_per_kilo_ins: Average::of(counters.miss, sim_instructions).scaled(1000.0),
            avg_eviction_latency: Average::of(counters.eviction_latency, counters.eviction),
            avg_life_span: Average::of(counters.life_span, counters.eviction),
            utilization: Average::of(
                counters.word_utilization,
                counters.word_utilization + counters.word_waste,
            ),
            miss_bandwidth_words,
            access_pattern,
            bandwidth_distribution,
        }
    }

    /// Share of evicted blocks per touched-word count, in percent.
    pub fn access_pattern_percent(&self) -> Vec<(u32, f64)> {
        let total: u64 = self.access_pattern.values().sum();
        self.access_pattern
            .iter()
            .map(|(&words, &n)| (words, n as f64 / total as f64 * 100.0))
            .collect()
    }

    /// Writes the report in `format`.
    pub fn write<W: Write>(&self, format: ReportFormat, w: &mut W) -> io::Result<()> {
        match format {
            ReportFormat::Verbose => write!(w, "{}", self),
            ReportFormat::Csv => writeln!(w, "{}", self.to_csv()),
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, self)?;
                writeln!(w)
            }
        }
    }

    /// One comma-separated line: counters and rates, then the access-pattern
    /// and bandwidth distributions as `key,value` pairs. Undefined averages
    /// are empty fields.
    pub fn to_csv(&self) -> String {
        let opt = |a: Average| a.value.map(|v| v.to_string()).unwrap_or_default();
        let c = &self.counters;
        let mut fields = vec![
            c.access.to_string(),
            c.hit.to_string(),
            opt(self.hits_per_kilo_ins),
            c.miss.to_string(),
            opt(self.misses_per_kilo_ins),
            c.eviction.to_string(),
            opt(self.avg_eviction_latency),
            opt(self.avg_life_span),
            opt(self.utilization),
            self.miss_bandwidth_words.to_string(),
        ];
        for (words, pct) in self.access_pattern_percent() {
            fields.push(words.to_string());
            fields.push(pct.to_string());
        }
        for (bw, n) in &self.bandwidth_distribution {
            fields.push(bw.to_string());
            fields.push(n.to_string());
        }
        fields.join(",")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        writeln!(f, "Accesses: {}", c.access)?;
        writeln!(f, "Hits: {}", c.hit)?;
        writeln!(f, "Hits/1kIns: {}", self.hits_per_kilo_ins)?;
        writeln!(f, "Misses: {}", c.miss)?;
        writeln!(f, "Misses/1kIns: {}", self.misses_per_kilo_ins)?;
        writeln!(f, "Evictions: {}", c.eviction)?;
        writeln!(f, "Average Eviction Latency: {}", self.avg_eviction_latency)?;
        writeln!(f, "Average LifeSpan: {}", self.avg_life_span)?;
        writeln!(
            f,
            "Percent Utilization: {}",
            self.utilization.scaled(100.0)
        )?;
        writeln!(f, "Miss Bandwidth: {} words", self.miss_bandwidth_words)?;
        for (words, pct) in self.access_pattern_percent() {
            writeln!(f, "{} Word Accessed: {} %", words, pct)?;
        }
        for (bw, n) in &self.bandwidth_distribution {
            writeln!(f, "{} Word loads occurred {} times", bw, n)?;
        }
        Ok(())
    }
}
