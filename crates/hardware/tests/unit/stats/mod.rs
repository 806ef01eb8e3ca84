//! # Statistics Unit Tests

/// Report aggregation and formatting.
pub mod report;
