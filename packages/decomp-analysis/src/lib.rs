/*
 * Decomp Analysis - whole-program passes over lifted machine code
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : IR model (module, values, call sites), ids, macros
 * - features/    : reg_modref (register ModRef), pointer_discovery
 * - config/      : presets, per-pass configuration, YAML I/O
 * - usecases/    : both passes end to end (used by the CLI)
 */

// Crate-level lint configuration
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::should_implement_trait)] // from_str naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and macros (declared first so the macros are in scope)
#[macro_use]
pub mod shared;

/// Analysis features
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

/// Usecase layer (AnalysisService)
pub mod usecases;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalysisConfig, Architecture, Preset, RecursionPolicy};
pub use errors::{AnalysisError, Result};
pub use features::pointer_discovery::{
    AddressId, AddressKind, EquivalenceClass, ExecutableInfo, MappedRange, MappedRanges,
    NoExecutable, ObjectAddress, PointerDiscovery, RootOrigin, UnificationSetId,
};
pub use features::reg_modref::{
    CallModRef, ConservativeModRef, ModRefEffect, RegisterFile, RegisterModRefAnalysis,
    RegisterNaming,
};
pub use shared::models::{CandidatePointers, MemoryLocation, Module, ModuleBuilder};
pub use usecases::{AnalysisInput, AnalysisService};
