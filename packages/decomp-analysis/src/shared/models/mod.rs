//! Shared models

mod builder;
mod candidates;
mod ids;
mod ir;

pub use builder::ModuleBuilder;
pub use candidates::CandidatePointers;
pub use ids::{CallSiteId, FunctionId, ValueId};
pub use ir::{
    BinaryOp, CallSite, CallTarget, Function, Instruction, MemoryLocation, Module, Value,
    ValueDef,
};
