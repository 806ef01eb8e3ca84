//! Common component tests.
//!
//! Configuration parsing, validation and the hint file naming scheme.
