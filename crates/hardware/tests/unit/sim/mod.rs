//! # Simulation Unit Tests
//!
//! Trace parsing and hint file input/output.
