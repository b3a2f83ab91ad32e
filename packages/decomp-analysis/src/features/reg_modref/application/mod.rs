pub mod analyzer;

pub use analyzer::{ModRefStats, RegisterModRefAnalysis};
