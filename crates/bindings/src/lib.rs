//! Python bindings for the flexible cache simulator.
//!
//! Exposes the `_core` extension module with the simulator, its report and
//! a hint file reader.

use pyo3::prelude::*;

pub mod conversion;
pub mod simulator;
pub mod stats;

use crate::simulator::PySimulator;
use crate::stats::{PyHint, PyReport, read_hints};

/// Registers the classes and functions of the extension on `m`.
pub fn register_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySimulator>()?;
    m.add_class::<PyReport>()?;
    m.add_class::<PyHint>()?;
    m.add_function(wrap_pyfunction!(read_hints, m)?)?;
    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    register_module(m)
}
