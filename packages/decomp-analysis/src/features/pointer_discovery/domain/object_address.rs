//! Object address nodes
//!
//! One node per analyzed pointer value. A node is either a root or one
//! derivation step (constant or scaled variable offset) from its parent.

use crate::shared::models::{FunctionId, ValueId};
use serde::Serialize;

define_id!(
    /// Arena handle of an [`ObjectAddress`]
    AddressId,
    "addr#"
);

define_id!(
    /// Identity of a unification set: the address id of its representative
    UnificationSetId,
    "set#"
);

/// Where a root address comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum RootOrigin {
    Argument { index: usize },
    Global { name: String },
    /// Constant pointing into the mapped executable image
    MappedConstant { address: u64 },
    /// Anything else: load results, non-candidate values, unmapped constants
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressKind {
    Root {
        #[serde(flatten)]
        origin: RootOrigin,
    },
    /// `parent + offset`
    ConstantOffset { parent: AddressId, offset: i64 },
    /// `parent + index * stride`
    VariableOffset {
        parent: AddressId,
        index: ValueId,
        stride: u64,
    },
}

impl AddressKind {
    pub fn parent(&self) -> Option<AddressId> {
        match self {
            AddressKind::Root { .. } => None,
            AddressKind::ConstantOffset { parent, .. }
            | AddressKind::VariableOffset { parent, .. } => Some(*parent),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, AddressKind::Root { .. })
    }

    /// Rank used by ordering keys: roots, then constant, then variable steps
    pub(crate) fn rank(&self) -> u8 {
        match self {
            AddressKind::Root { .. } => 0,
            AddressKind::ConstantOffset { .. } => 1,
            AddressKind::VariableOffset { .. } => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AddressKind::Root { .. } => "root",
            AddressKind::ConstantOffset { .. } => "constant_offset",
            AddressKind::VariableOffset { .. } => "variable_offset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectAddress {
    pub id: AddressId,

    /// The program value this node stands for
    pub value: ValueId,

    /// Function being analyzed when the node was created (`None` for nodes
    /// created outside any function scope)
    pub function: Option<FunctionId>,

    /// Position in the owning function's address list
    pub sequence: u32,

    pub kind: AddressKind,
}

impl ObjectAddress {
    #[inline]
    pub fn parent(&self) -> Option<AddressId> {
        self.kind.parent()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.kind.is_root()
    }
}
