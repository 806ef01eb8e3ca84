//! # Core Unit Tests
//!
//! Tests for the set store, the controller and the predictors.


/// Controller: routing, spanning ranges and warm-up.
pub mod controller;

/// Aligned, exact and region predictors.
pub mod predict;
