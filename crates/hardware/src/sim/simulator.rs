//! Trace-driven simulation loop.

use std::path::Path;

use log::{debug, info};

use super::loader;
use super::trace::{self, TraceRecord};
use crate::common::{PROGRESS_INTERVAL, Result, WORD_SIZE, word_align};
use crate::config::SimConfig;
use crate::core::controller::CacheController;
use crate::core::predict::FetchPredictor;
use crate::stats::Report;

/// Drives one cache through a stream of accesses.
///
/// Each access is turned into fetch ranges by the predictor and handed to the
/// controller. [`Simulator::finish`] drains the cache, produces the report and
/// writes the hints of aligned runs.
pub struct Simulator {
    config: SimConfig,
    controller: CacheController,
    predictor: Box<dyn FetchPredictor>,
    first_ins: Option<u64>,
    records: u64,
    latency: u64,
}

impl Simulator {
    /// Validates `config` and picks the predictor it asks for.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let predictor = loader::build_predictor(&config);
        Self::with_predictor(config, predictor)
    }

    /// Simulator with an explicit predictor.
    pub fn with_predictor(config: SimConfig, predictor: Box<dyn FetchPredictor>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            controller: CacheController::new(&config),
            config,
            predictor,
            first_ins: None,
            records: 0,
            latency: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    pub fn predictor_name(&self) -> &'static str {
        self.predictor.name()
    }

    /// Accesses simulated so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Sum of the latencies of every access.
    pub fn total_latency(&self) -> u64 {
        self.latency
    }

    /// Simulates an access of `size` bytes at `ea` and returns its latency.
    /// A zero-size access counts as one byte.
    pub fn access(&mut self, ea: u64, size: u32, ins_count: u64) -> u32 {
        let size = size.max(1);
        let start = word_align(ea);
        let end = ea + u64::from(size);
        let fetch = if end % WORD_SIZE == 0 {
            end - start
        } else {
            word_align(end) - start + WORD_SIZE
        };

        let mut latency = 0;
        for mb in self.predictor.predict(start, fetch, ins_count) {
            latency += self.controller.access(&mb, ea, size);
        }

        self.records += 1;
        self.latency += u64::from(latency);
        if self.records % PROGRESS_INTERVAL == 0 {
            debug!(
                "{} accesses simulated, at instruction {}",
                self.records, ins_count
            );
        }
        latency
    }

    /// Simulates one trace record. Returns `false` once the instruction
    /// budget is used up; the record crossing the budget is still simulated.
    pub fn step(&mut self, record: &TraceRecord) -> bool {
        self.access(record.ea, record.size, record.ins_count);
        let first = *self.first_ins.get_or_insert(record.ins_count);
        let budget = self.config.sim_instructions;
        budget == 0 || first.saturating_add(budget) >= record.ins_count
    }

    /// Simulates `records` until they run out or the budget is used up.
    /// Returns the number of records consumed.
    pub fn run<I>(&mut self, records: I) -> Result<u64>
    where
        I: IntoIterator<Item = Result<TraceRecord>>,
    {
        let mut consumed = 0;
        for record in records {
            let record = record?;
            consumed += 1;
            if !self.step(&record) {
                debug!(
                    "Instruction budget of {} reached at {}",
                    self.config.sim_instructions, record.ins_count
                );
                break;
            }
        }
        Ok(consumed)
    }

    /// Simulates the trace file at `path`.
    pub fn run_trace(&mut self, path: &Path) -> Result<u64> {
        info!("Processing {}", path.display());
        let reader = trace::open_trace(path)?;
        self.run(reader)
    }

    /// Drains the cache and returns the statistics of the run. Aligned runs
    /// with a hint directory also write their eviction records.
    pub fn finish(&mut self) -> Result<Report> {
        let last = self.controller.last_ins();
        self.controller.purge(last);
        let report = self.controller.report();

        if let Some(dir) = self.config.hint_dir.as_deref().filter(|_| self.config.dumps_hints()) {
            let path = self.config.hint_dump_path(dir);
            let records = self.controller.hint_records();
            loader::dump_hints(&path, &records)?;
            info!("Wrote {} hints to {}", records.len(), path.display());
        }
        Ok(report)
    }
}
