//! Usecase Layer - end-to-end operations over a lifted module
//!
//! Used by the `decomp-analyze` binary and by embedders that want both
//! passes with one configuration.

pub mod analysis_service;

pub use analysis_service::{AnalysisInput, AnalysisOutcome, AnalysisReport, AnalysisService};
