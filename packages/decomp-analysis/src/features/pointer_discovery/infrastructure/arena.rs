//! Address arena
//!
//! Owns every [`ObjectAddress`] of one discovery run. Nodes are never freed
//! individually; parent links are arena ids.
//!
//! A child is always allocated after its parent, so `parent < child` holds
//! for every link and parent chains strictly decrease. That is what makes
//! cycles unrepresentable and root walks terminate.

use crate::features::pointer_discovery::domain::{AddressId, AddressKind, ObjectAddress};
use crate::shared::models::{FunctionId, ValueId};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct AddressArena {
    nodes: Vec<ObjectAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArenaStats {
    pub total: usize,
    pub roots: usize,
    pub constant_offsets: usize,
    pub variable_offsets: usize,
    pub max_depth: usize,
}

impl AddressArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node.
    ///
    /// # Panics
    /// If `kind` names a parent that is not already in the arena.
    pub fn alloc(
        &mut self,
        value: ValueId,
        function: Option<FunctionId>,
        sequence: u32,
        kind: AddressKind,
    ) -> AddressId {
        let id = AddressId::new(self.nodes.len());
        if let Some(parent) = kind.parent() {
            assert!(
                parent < id,
                "address {} derived from unallocated parent {}",
                id,
                parent
            );
        }
        self.nodes.push(ObjectAddress {
            id,
            value,
            function,
            sequence,
            kind,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: AddressId) -> &ObjectAddress {
        &self.nodes[id.index()]
    }

    /// Follow parent links to the root
    pub fn root_of(&self, id: AddressId) -> AddressId {
        let mut current = id;
        while let Some(parent) = self.get(current).parent() {
            current = parent;
        }
        current
    }

    /// Path from the root down to `id` (root first)
    pub fn chain(&self, id: AddressId) -> Vec<AddressId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.get(current).parent() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Derivation steps between `id` and its root
    pub fn depth(&self, id: AddressId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.get(current).parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectAddress> {
        self.nodes.iter()
    }

    pub fn stats(&self) -> ArenaStats {
        // parents precede children, so one forward pass computes every depth
        let mut depths = vec![0usize; self.nodes.len()];
        let mut stats = ArenaStats {
            total: self.nodes.len(),
            ..ArenaStats::default()
        };
        for node in &self.nodes {
            match node.kind {
                AddressKind::Root { .. } => stats.roots += 1,
                AddressKind::ConstantOffset { parent, .. } => {
                    stats.constant_offsets += 1;
                    depths[node.id.index()] = depths[parent.index()] + 1;
                }
                AddressKind::VariableOffset { parent, .. } => {
                    stats.variable_offsets += 1;
                    depths[node.id.index()] = depths[parent.index()] + 1;
                }
            }
        }
        stats.max_depth = depths.into_iter().max().unwrap_or(0);
        stats
    }
}
