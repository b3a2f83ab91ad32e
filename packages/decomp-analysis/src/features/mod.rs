//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Pure analysis types (no external dependencies)
//! - ports/      - Interface definitions (traits)
//! - application/ - Analysis drivers
//! - infrastructure/ - Data structures and graph algorithms

// Register-level ModRef over the call graph
pub mod reg_modref;

// Object address hierarchy and unification sets
pub mod pointer_discovery;
