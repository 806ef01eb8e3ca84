//! Simulator Python binding.
//!
//! Wraps a [`Simulator`]: build it from a config dict, feed it single accesses
//! or whole trace files, then finish the run to get its report.

use std::path::PathBuf;

use pyo3::prelude::*;

use crate::conversion::{py_dict_to_config, sim_error_to_py};
use crate::stats::{PyHint, PyReport};
use flexcache::{SimConfig, Simulator};

/// Python-exposed simulator.
#[pyclass]
pub struct PySimulator {
    pub inner: Simulator,
}

#[pymethods]
impl PySimulator {
    /// Creates a simulator from a configuration dictionary. Missing keys take
    /// their defaults.
    ///
    /// # Errors
    /// Raises `ValueError` for unknown values or an invalid geometry.
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(py: Python, config: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => py_dict_to_config(py, dict)?,
            None => SimConfig::default(),
        };
        let inner = Simulator::new(config).map_err(sim_error_to_py)?;
        Ok(Self { inner })
    }

    /// Simulates one access of `size` bytes at `ea` and returns its latency.
    fn access(&mut self, ea: u64, size: u32, ins: u64) -> u32 {
        self.inner.access(ea, size, ins)
    }

    /// Simulates a trace file and returns the number of records consumed.
    /// The GIL is released while the trace runs.
    fn run_trace(&mut self, py: Python, path: PathBuf) -> PyResult<u64> {
        let inner = &mut self.inner;
        py.allow_threads(|| inner.run_trace(&path))
            .map_err(sim_error_to_py)
    }

    /// Drains the cache and returns the report of the run.
    fn finish(&mut self) -> PyResult<PyReport> {
        self.inner
            .finish()
            .map(|inner| PyReport { inner })
            .map_err(sim_error_to_py)
    }

    /// Reports of every set, in set order.
    fn per_set_reports(&self) -> Vec<PyReport> {
        self.inner
            .controller()
            .report_per_set()
            .into_iter()
            .map(|inner| PyReport { inner })
            .collect()
    }

    /// Eviction records collected so far, ordered by address. Only aligned
    /// runs with a hint directory collect them.
    fn hints(&self) -> Vec<PyHint> {
        self.inner
            .controller()
            .hint_records()
            .into_iter()
            .map(|inner| PyHint { inner })
            .collect()
    }

    #[getter]
    fn records(&self) -> u64 {
        self.inner.records()
    }

    #[getter]
    fn total_latency(&self) -> u64 {
        self.inner.total_latency()
    }

    #[getter]
    fn predictor(&self) -> &'static str {
        self.inner.predictor_name()
    }

    fn __repr__(&self) -> String {
        let c = self.inner.config();
        format!(
            "PySimulator(sets={}, set_size={}, max_gran={}, mode={:?}, predictor={})",
            c.set_count,
            c.set_size_bytes,
            c.max_gran_bytes,
            c.mode,
            self.inner.predictor_name()
        )
    }
}
