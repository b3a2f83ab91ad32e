//! Deterministic ordering of address nodes
//!
//! A key is the derivation path from the root to the node. Each step is
//! `(offset, rank, value)`: constant steps carry their offset, variable steps
//! offset 0 and a higher rank, and `value` is the ordinal of the program value
//! the step's node stands for. Nothing in the key depends on the order in
//! which nodes were discovered.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct KeyStep {
    pub offset: i64,
    pub rank: u8,
    pub value: u32,
}

/// Root-to-node path; a prefix sorts before its extensions, so parents
/// precede their children
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderingKey(Vec<KeyStep>);

impl OrderingKey {
    pub fn from_steps(steps: Vec<KeyStep>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[KeyStep] {
        &self.0
    }

    /// Number of derivation steps below the root
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}:{}:{}", step.offset, step.rank, step.value)?;
        }
        Ok(())
    }
}
