//! ModRef effect lattice
//!
//! ```text
//!              ModRef
//!             /      \
//!           Mod      Ref
//!            |        |
//!            |   IncompleteRef
//!             \      /
//!               None
//! ```
//!
//! `IncompleteRef` is a read observed through an unresolved recursive call:
//! the register may be read, but the callee's table was still being built.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModRefEffect {
    #[default]
    None,
    Mod,
    Ref,
    ModRef,
    IncompleteRef,
}

impl ModRefEffect {
    /// The register may be written
    #[inline]
    pub fn is_mod(self) -> bool {
        matches!(self, Self::Mod | Self::ModRef)
    }

    /// The register may be read (including incomplete reads)
    #[inline]
    pub fn is_ref(self) -> bool {
        matches!(self, Self::Ref | Self::ModRef | Self::IncompleteRef)
    }

    #[inline]
    pub fn is_incomplete(self) -> bool {
        self == Self::IncompleteRef
    }

    /// 0 = no read, 1 = incomplete read, 2 = proven read
    #[inline]
    fn ref_strength(self) -> u8 {
        match self {
            Self::None | Self::Mod => 0,
            Self::IncompleteRef => 1,
            Self::Ref | Self::ModRef => 2,
        }
    }

    /// Least upper bound
    pub fn merge(self, other: Self) -> Self {
        let modifies = self.is_mod() || other.is_mod();
        match (modifies, self.ref_strength().max(other.ref_strength())) {
            (false, 0) => Self::None,
            (false, 1) => Self::IncompleteRef,
            (false, _) => Self::Ref,
            (true, 0) => Self::Mod,
            (true, _) => Self::ModRef,
        }
    }

    /// How a callee entry reads from a caller in the same call-graph cycle.
    ///
    /// Writes are kept. Anything short of a write, including a missing
    /// entry, is an incomplete read: the callee may not be finished.
    pub fn through_recursive_call(self) -> Self {
        match self {
            Self::Mod | Self::ModRef => self,
            Self::None | Self::Ref | Self::IncompleteRef => Self::IncompleteRef,
        }
    }

    /// Incomplete reads become proven reads once the cycle is closed
    pub fn promoted(self) -> Self {
        match self {
            Self::IncompleteRef => Self::Ref,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::Mod => "mod",
            Self::Ref => "ref",
            Self::ModRef => "modref",
            Self::IncompleteRef => "(incomplete) ref",
        }
    }
}

impl fmt::Display for ModRefEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
