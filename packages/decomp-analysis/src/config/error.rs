//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Numeric setting outside its accepted range
    #[error("'{field}' = {value} is outside {min}..={max}. {hint}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
        hint: &'static str,
    },

    #[error("Configuration version {found} is not supported (expected one of {supported:?})")]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("Unknown preset '{0}'. Valid presets: fast, balanced, thorough")]
    UnknownPreset(String),

    /// A register list names something the selected register file lacks
    #[error("Register '{register}' does not exist on {architecture}")]
    UnknownRegister {
        register: String,
        architecture: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn out_of_range(
        field: &'static str,
        value: u64,
        (min, max): (u64, u64),
        hint: &'static str,
    ) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
            hint,
        }
    }
}
