//! Error types for decomp-analysis
//!
//! The analyses themselves are total: missing information resolves to a
//! conservative default instead of an error. Errors only come from building
//! or loading inputs (modules, configuration files).

use crate::config::ConfigError;
use crate::shared::models::{CallSiteId, FunctionId, ValueId};
use thiserror::Error;

/// Main error type for decomp-analysis operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A function id that is not part of the module
    #[error("Unknown function {0}")]
    UnknownFunction(FunctionId),

    /// A value id that is not part of the module
    #[error("Unknown value {0}")]
    UnknownValue(ValueId),

    /// A call site id that is not part of the module
    #[error("Unknown call site {0}")]
    UnknownCallSite(CallSiteId),

    /// Structurally invalid module (e.g. cross-function operands)
    #[error("Malformed module: {0}")]
    MalformedModule(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Create a malformed-module error
    pub fn malformed(msg: impl Into<String>) -> Self {
        AnalysisError::MalformedModule(msg.into())
    }
}

/// Result type alias for decomp-analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
