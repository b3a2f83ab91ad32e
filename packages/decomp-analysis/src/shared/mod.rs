//! Shared module - Common types and utilities
//!
//! The IR model the analyses run over. In a full decompiler this is supplied
//! by the lifting stage; here it is a small serde-friendly stand-in.

#[macro_use]
pub mod macros;
pub mod models;

// Re-exports for convenience
pub use models::*;
