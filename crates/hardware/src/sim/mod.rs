//! Simulation driver: trace input, hint files and the run loop.

/// Hint files and predictor selection.
pub mod loader;

/// Run loop.
pub mod simulator;

/// Trace reader.
pub mod trace;

pub use self::simulator::Simulator;
pub use self::trace::{TraceReader, TraceRecord, open_trace};
