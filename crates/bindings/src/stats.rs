//! Report and hint Python bindings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::conversion::sim_error_to_py;
use flexcache::Report;
use flexcache::core::EvictionRecord;
use flexcache::sim::loader;

/// Statistics of a finished run.
#[pyclass]
pub struct PyReport {
    pub inner: Report,
}

#[pymethods]
impl PyReport {
    #[getter]
    fn sim_instructions(&self) -> u64 {
        self.inner.sim_instructions
    }

    #[getter]
    fn accesses(&self) -> u64 {
        self.inner.counters.access
    }

    #[getter]
    fn hits(&self) -> u64 {
        self.inner.counters.hit
    }

    #[getter]
    fn misses(&self) -> u64 {
        self.inner.counters.miss
    }

    #[getter]
    fn evictions(&self) -> u64 {
        self.inner.counters.eviction
    }

    /// `None` when no instructions were simulated.
    #[getter]
    fn hits_per_kilo_ins(&self) -> Option<f64> {
        self.inner.hits_per_kilo_ins.value
    }

    #[getter]
    fn misses_per_kilo_ins(&self) -> Option<f64> {
        self.inner.misses_per_kilo_ins.value
    }

    /// `None` when nothing was evicted.
    #[getter]
    fn avg_eviction_latency(&self) -> Option<f64> {
        self.inner.avg_eviction_latency.value
    }

    #[getter]
    fn avg_life_span(&self) -> Option<f64> {
        self.inner.avg_life_span.value
    }

    /// Fraction of evicted words that were touched.
    #[getter]
    fn utilization(&self) -> Option<f64> {
        self.inner.utilization.value
    }

    #[getter]
    fn miss_bandwidth_words(&self) -> u64 {
        self.inner.miss_bandwidth_words
    }

    #[getter]
    fn access_pattern(&self) -> BTreeMap<u32, u64> {
        self.inner.access_pattern.clone()
    }

    #[getter]
    fn bandwidth_distribution(&self) -> BTreeMap<u64, u64> {
        self.inner.bandwidth_distribution.clone()
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn to_csv(&self) -> String {
        self.inner.to_csv()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "PyReport(accesses={}, hits={}, misses={}, evictions={})",
            self.inner.counters.access,
            self.inner.counters.hit,
            self.inner.counters.miss,
            self.inner.counters.eviction
        )
    }
}

/// One eviction record of a hint file.
#[pyclass]
pub struct PyHint {
    pub inner: EvictionRecord,
}

#[pymethods]
impl PyHint {
    #[getter]
    fn address(&self) -> u64 {
        self.inner.block_address()
    }

    /// Recorded words (at most 16).
    #[getter]
    fn size(&self) -> u32 {
        self.inner.block_size()
    }

    #[getter]
    fn counters(&self) -> Vec<u32> {
        self.inner.counters().to_vec()
    }

    #[getter]
    fn ins_insert(&self) -> u64 {
        self.inner.ins_insert()
    }

    #[getter]
    fn ins_evict(&self) -> u64 {
        self.inner.ins_evict()
    }

    /// Runs of touched words as inclusive `(first, last)` offsets.
    fn runs(&self) -> Vec<(usize, usize)> {
        self.inner.occupied_runs()
    }

    fn __repr__(&self) -> String {
        format!(
            "PyHint(address={:#x}, counters={:?}, ins_insert={}, ins_evict={})",
            self.inner.block_address(),
            self.inner.counters(),
            self.inner.ins_insert(),
            self.inner.ins_evict()
        )
    }
}

/// Reads every record of the hint file at `path`.
#[pyfunction]
pub fn read_hints(path: PathBuf) -> PyResult<Vec<PyHint>> {
    let records = loader::read_hints(&path).map_err(sim_error_to_py)?;
    Ok(records.into_iter().map(|inner| PyHint { inner }).collect())
}
