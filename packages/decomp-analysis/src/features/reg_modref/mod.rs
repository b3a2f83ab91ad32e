//! Register ModRef analysis
//!
//! Which registers may a call write or read? Answers are built bottom-up over
//! the call graph and exposed through the [`ports::CallModRef`] query so they
//! can be chained in front of a generic memory analysis.
//!
//! Layout:
//! - `domain`: effect lattice and per-function tables
//! - `infrastructure`: register files, call graph
//! - `ports`: register naming and ModRef query traits
//! - `application`: the analysis driver

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{ModRefStats, RegisterModRefAnalysis};
pub use domain::{ModRefEffect, ModRefTable, RegisterId};
pub use infrastructure::{CallGraph, CallGraphScc, RegisterFile};
pub use ports::{CallModRef, ConservativeModRef, RegisterNaming};
