//! Shared constants, address helpers and error types.

/// Word size, latencies and record capacities.
pub mod constants;

/// Configuration and runtime errors.
pub mod error;

pub use self::constants::*;
pub use self::error::{ConfigError, Result, SimError};
