//! Analysis configuration
//!
//! Two tiers:
//! - Preset: one-liner defaults (`AnalysisConfig::preset(Preset::Fast)`)
//! - YAML: `version: 1` file with a preset plus per-pass overrides
//!
//! # Examples
//!
//! ```rust,ignore
//! use decomp_analysis::config::{AnalysisConfig, Preset, RecursionPolicy};
//!
//! let config = AnalysisConfig::preset(Preset::Balanced)
//!     .modref(|c| c.recursion(RecursionPolicy::SinglePass))
//!     .build()?;
//!
//! let config = AnalysisConfig::from_yaml_file("analysis.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod stage_configs;

// Re-exports
pub use analysis_config::AnalysisConfig;
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigFileV1, ConfigOverrides};
pub use preset::Preset;
pub use stage_configs::{
    Architecture, DiscoveryConfig, ModRefConfig, RecursionPolicy, MAX_STRIDE_LIMIT,
};
