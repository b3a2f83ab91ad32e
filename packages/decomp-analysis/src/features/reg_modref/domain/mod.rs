//! Register ModRef domain types

pub mod effect;
pub mod modref_table;

pub use effect::ModRefEffect;
pub use modref_table::{ModRefTable, RegisterId};
