//! Unification index over address nodes
//!
//! Union-find with:
//! - Path compression (iterative, so long parent chains cannot overflow)
//! - Union by size
//! - A registry `representative → members` so the final sets can be listed
//!   without scanning every element
//!
//! A set is identified by its representative; after `union` only the
//! survivor's id stays valid as a registry key.

use crate::features::pointer_discovery::domain::{AddressId, UnificationSetId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct UnificationIndex {
    /// Parent pointers (self-loop = representative)
    parent: Vec<u32>,

    /// Size of each set (only valid for representatives)
    size: Vec<u32>,

    /// Representative → members, in insertion order
    registry: FxHashMap<u32, Vec<AddressId>>,
}

impl UnificationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a freshly allocated address in its own set.
    ///
    /// Addresses are dense arena ids and must be added in allocation order.
    pub fn make_set(&mut self, id: AddressId) -> UnificationSetId {
        self.push(id);
        self.registry.insert(id.0, vec![id]);
        UnificationSetId(id.0)
    }

    /// Put a freshly allocated address into an existing set
    pub fn add_to_set(&mut self, id: AddressId, set: UnificationSetId) -> UnificationSetId {
        let rep = self.find_rep(set.0);
        self.push(id);
        self.parent[id.index()] = rep;
        self.size[rep as usize] += 1;
        self.registry.entry(rep).or_default().push(id);
        UnificationSetId(rep)
    }

    fn push(&mut self, id: AddressId) {
        assert_eq!(
            id.index(),
            self.parent.len(),
            "addresses must join the index in allocation order"
        );
        self.parent.push(id.0);
        self.size.push(1);
    }

    /// Set containing `id`, compressing the path
    #[inline]
    pub fn find(&mut self, id: AddressId) -> UnificationSetId {
        UnificationSetId(self.find_rep(id.0))
    }

    fn find_rep(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut current = x;
        while self.parent[current as usize] != root {
            let next = self.parent[current as usize];
            self.parent[current as usize] = root;
            current = next;
        }
        root
    }

    /// Find without path compression (for read-only queries)
    #[inline]
    pub fn find_readonly(&self, id: AddressId) -> UnificationSetId {
        let mut current = id.0;
        while self.parent[current as usize] != current {
            current = self.parent[current as usize];
        }
        UnificationSetId(current)
    }

    /// Merge two sets; the larger one survives (the first on a tie).
    ///
    /// Members of the absorbed set move to the survivor and its registry
    /// entry is removed. Stale set ids are resolved first.
    pub fn union(&mut self, a: UnificationSetId, b: UnificationSetId) -> UnificationSetId {
        let ra = self.find_rep(a.0);
        let rb = self.find_rep(b.0);
        if ra == rb {
            return UnificationSetId(ra);
        }

        let (survivor, absorbed) = if self.size[ra as usize] >= self.size[rb as usize] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[absorbed as usize] = survivor;
        self.size[survivor as usize] += self.size[absorbed as usize];

        let moved = self.registry.remove(&absorbed).unwrap_or_default();
        self.registry.entry(survivor).or_default().extend(moved);

        UnificationSetId(survivor)
    }

    #[inline]
    pub fn same_set(&self, a: AddressId, b: AddressId) -> bool {
        self.find_readonly(a) == self.find_readonly(b)
    }

    /// Members of a live set (empty for ids that are no longer representatives)
    pub fn members(&self, set: UnificationSetId) -> &[AddressId] {
        self.registry.get(&set.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_size(&self, id: AddressId) -> usize {
        self.size[self.find_readonly(id).index()] as usize
    }

    /// Live sets, in no particular order
    pub fn sets(&self) -> impl Iterator<Item = (UnificationSetId, &[AddressId])> {
        self.registry
            .iter()
            .map(|(&rep, members)| (UnificationSetId(rep), members.as_slice()))
    }

    /// Number of disjoint sets
    #[inline]
    pub fn count(&self) -> usize {
        self.registry.len()
    }

    /// Total number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
