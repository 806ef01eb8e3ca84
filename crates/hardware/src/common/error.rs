//! Error types for configuration, trace input and hint output.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("set count must be a non-zero power of two, got {0}")]
    SetCount(u32),

    #[error("max granularity must be a power of two of at least {min} bytes, got {got}")]
    Granularity { got: u64, min: u64 },

    #[error("set size must be a multiple of the word size and hold one max-granularity block, got {got} bytes (max granularity {gran})")]
    SetSize { got: u64, gran: u64 },

    #[error("region bin size must be a power of two of at least one word, got {0}")]
    BinSize(u64),
}

/// Errors surfaced by a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("malformed trace record at line {line}: {reason}")]
    Trace { line: u64, reason: String },

    #[error("could not write hint file {}: {source}", path.display())]
    HintDump {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for simulator operations.
pub type Result<T> = std::result::Result<T, SimError>;
