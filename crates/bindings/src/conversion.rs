//! Conversion between Python objects and simulator types.
//!
//! Dictionaries are serialized with Python's `json` module and parsed with
//! `serde_json`, so they accept exactly the keys of the JSON configuration.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use serde::de::DeserializeOwned;

use flexcache::{SimConfig, SimError};

/// Deserializes a JSON-compatible Python object into `T`.
pub fn from_py_json<T: DeserializeOwned>(py: Python, obj: &Bound<'_, PyAny>) -> PyResult<T> {
    let json = py.import("json")?;
    let text: String = json.call_method1("dumps", (obj,))?.extract()?;
    serde_json::from_str(&text).map_err(|e| PyValueError::new_err(format!("invalid value: {}", e)))
}

/// Builds a validated configuration from a Python dictionary.
pub fn py_dict_to_config(py: Python, dict: &Bound<'_, PyAny>) -> PyResult<SimConfig> {
    let config: SimConfig = from_py_json(py, dict)?;
    config.validate().map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(config)
}

/// Maps a simulator error onto the closest Python exception.
pub fn sim_error_to_py(e: SimError) -> PyErr {
    match e {
        SimError::Io(_) | SimError::HintDump { .. } => PyIOError::new_err(e.to_string()),
        SimError::Config(_) | SimError::Trace { .. } | SimError::Parse(_) => {
            PyValueError::new_err(e.to_string())
        }
    }
}
