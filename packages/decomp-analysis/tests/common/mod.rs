//! Common test utilities for decomp-analysis
//!
//! Module builders for the scenarios the integration and property tests
//! share, plus assertions over analysis results.

#![allow(dead_code)]

mod assertions;
mod builders;

// Re-export all utilities
pub use assertions::*;
pub use builders::*;
