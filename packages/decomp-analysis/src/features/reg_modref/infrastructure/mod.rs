pub mod call_graph;
pub mod register_file;

pub use call_graph::{CallGraph, CallGraphScc, SccStats};
pub use register_file::RegisterFile;
