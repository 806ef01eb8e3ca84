//! Flexible-granularity cache simulator.
//!
//! This crate models a set-associative cache whose sets hold blocks of any
//! word-granular size instead of fixed lines. It provides:
//! 1. **Core:** blocks, sets, the cache controller and fetch predictors.
//! 2. **Stats:** per-set logging and the aggregated report.
//! 3. **Simulation:** the trace reader, hint files and the run loop.
//! 4. **Config:** the simulation parameters.

/// Constants and error types.
pub mod common;

/// Simulation parameters.
pub mod config;

/// Cache model.
pub mod core;

/// Trace-driven simulation.
pub mod sim;

/// Statistics collection and reporting.
pub mod stats;

pub use crate::common::{ConfigError, Result, SimError};
pub use crate::config::{AccessMode, ReportFormat, SimConfig};
pub use crate::sim::Simulator;
pub use crate::stats::Report;
