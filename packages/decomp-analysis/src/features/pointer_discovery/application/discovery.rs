//! Pointer discovery driver
//!
//! Walks the candidate pointers of every function through the hierarchy
//! builder and exposes the resulting address lists and unification sets.
//!
//! # Usage
//! ```text
//! let mut discovery = PointerDiscovery::new(DiscoveryConfig::default());
//! discovery.analyze_module(&NoExecutable, &module, &candidates);
//! for class in discovery.equivalence_classes() { ... }
//! ```

use crate::config::{AnalysisConfig, DiscoveryConfig};
use crate::features::pointer_discovery::domain::{
    AddressId, EquivalenceClass, ObjectAddress, OrderingKey, UnificationSetId,
};
use crate::features::pointer_discovery::infrastructure::{
    DiscoveryScope, ObjectAddressHierarchy,
};
use crate::features::pointer_discovery::ports::ExecutableInfo;
use crate::shared::models::{CandidatePointers, FunctionId, Module, ValueDef, ValueId};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryStats {
    pub functions: usize,
    /// Candidate values handed to the builder
    pub values_visited: usize,
    pub roots: usize,
    pub constant_offsets: usize,
    pub variable_offsets: usize,
    pub max_depth: usize,
    /// Unions that merged two distinct sets
    pub unions: usize,
    pub classes: usize,
    pub duration_ms: f64,
}

pub struct PointerDiscovery {
    hierarchy: ObjectAddressHierarchy,
    values_visited: usize,
    functions: usize,
    unions: usize,
    duration_ms: f64,
}

impl PointerDiscovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            hierarchy: ObjectAddressHierarchy::new(config),
            values_visited: 0,
            functions: 0,
            unions: 0,
            duration_ms: 0.0,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.discovery.clone())
    }

    pub fn hierarchy(&self) -> &ObjectAddressHierarchy {
        &self.hierarchy
    }

    /// Discover addresses for every candidate of every function
    pub fn analyze_module(
        &mut self,
        executable: &dyn ExecutableInfo,
        module: &Module,
        candidates: &CandidatePointers,
    ) -> DiscoveryStats {
        let start = Instant::now();
        for function in module.function_ids() {
            self.visit_function(executable, module, candidates, function);
        }
        self.duration_ms += start.elapsed().as_secs_f64() * 1000.0;

        let stats = self.stats();
        info!(
            "Pointer discovery for '{}': {} values, {} roots, {} constant / {} variable offsets, {} classes",
            module.name,
            stats.values_visited,
            stats.roots,
            stats.constant_offsets,
            stats.variable_offsets,
            stats.classes
        );
        stats
    }

    /// Discover addresses for the candidates local to one function
    pub fn analyze_function(
        &mut self,
        executable: &dyn ExecutableInfo,
        module: &Module,
        candidates: &CandidatePointers,
        function: FunctionId,
    ) {
        let start = Instant::now();
        self.visit_function(executable, module, candidates, function);
        self.duration_ms += start.elapsed().as_secs_f64() * 1000.0;
    }

    fn visit_function(
        &mut self,
        executable: &dyn ExecutableInfo,
        module: &Module,
        candidates: &CandidatePointers,
        function: FunctionId,
    ) {
        let scope = DiscoveryScope::new(module, candidates, executable).in_function(function);
        let before = self.hierarchy.addresses_in_function(function).len();
        let mut visited = 0;
        for value in candidates.in_function(module, function) {
            self.hierarchy.address_of(&scope, value);
            visited += 1;
        }
        self.values_visited += visited;
        self.functions += 1;
        debug!(
            "Discovered {} addresses from {} candidates in '{}'",
            self.hierarchy.addresses_in_function(function).len() - before,
            visited,
            module.function_name(function)
        );
    }

    /// Node of one value, creating it if needed. Nodes created here are
    /// listed under the value's own function (module level for globals).
    pub fn address_of(
        &mut self,
        executable: &dyn ExecutableInfo,
        module: &Module,
        candidates: &CandidatePointers,
        value: ValueId,
    ) -> AddressId {
        let mut scope = DiscoveryScope::new(module, candidates, executable);
        scope.function = module.owning_function(value);
        self.hierarchy.address_of(&scope, value)
    }

    #[inline]
    pub fn address(&self, id: AddressId) -> &ObjectAddress {
        self.hierarchy.get(id)
    }

    /// Existing node of `value`
    pub fn lookup(&self, value: ValueId) -> Option<AddressId> {
        self.hierarchy.lookup(value)
    }

    /// Node of a formal parameter, if it was discovered
    pub fn address_of_argument(&self, module: &Module, argument: ValueId) -> Option<AddressId> {
        match module.value_def(argument) {
            Some(ValueDef::Argument { .. }) => self.hierarchy.lookup(argument),
            _ => None,
        }
    }

    /// Addresses created while analyzing `function`, in discovery order
    pub fn addresses_in_function(&self, function: FunctionId) -> &[AddressId] {
        self.hierarchy.addresses_in_function(function)
    }

    /// Addresses of module-level values (globals, constants) created
    /// through [`Self::address_of`] outside any function
    pub fn module_addresses(&self) -> &[AddressId] {
        self.hierarchy.unscoped_addresses()
    }

    pub fn get_root(&self, id: AddressId) -> AddressId {
        self.hierarchy.get_root(id)
    }

    pub fn ordering_key(&self, id: AddressId) -> OrderingKey {
        self.hierarchy.ordering_key(id)
    }

    pub fn set_of(&self, id: AddressId) -> UnificationSetId {
        self.hierarchy.sets().find_readonly(id)
    }

    pub fn same_set(&self, a: AddressId, b: AddressId) -> bool {
        self.hierarchy.sets().same_set(a, b)
    }

    /// Merge two unification sets on external aliasing evidence
    pub fn union(&mut self, a: UnificationSetId, b: UnificationSetId) -> UnificationSetId {
        let sets = self.hierarchy.sets_mut();
        let (ra, rb) = (sets.find(AddressId(a.0)), sets.find(AddressId(b.0)));
        let merged = sets.union(ra, rb);
        if ra != rb {
            self.unions += 1;
            node_trace!("union {} {} -> {}", ra, rb, merged);
        }
        merged
    }

    /// [`Self::union`] on the sets of two already discovered values;
    /// `None` if either has no node
    pub fn union_values(&mut self, a: ValueId, b: ValueId) -> Option<UnificationSetId> {
        let a = self.hierarchy.lookup(a)?;
        let b = self.hierarchy.lookup(b)?;
        let (sa, sb) = (self.set_of(a), self.set_of(b));
        Some(self.union(sa, sb))
    }

    /// Final unification sets. Members are sorted by ordering key and the
    /// classes by their first member, so the result does not depend on
    /// discovery order.
    pub fn equivalence_classes(&self) -> Vec<EquivalenceClass> {
        let mut classes: Vec<(Vec<OrderingKey>, EquivalenceClass)> = self
            .hierarchy
            .sets()
            .sets()
            .map(|(set, members)| {
                let mut keyed: Vec<(OrderingKey, AddressId)> = members
                    .iter()
                    .map(|&m| (self.ordering_key(m), m))
                    .collect();
                keyed.sort();
                let (keys, members): (Vec<_>, Vec<_>) = keyed.into_iter().unzip();
                (keys, EquivalenceClass { set, members })
            })
            .collect();
        classes.sort_by(|a, b| a.0.first().cmp(&b.0.first()));
        classes.into_iter().map(|(_, class)| class).collect()
    }

    pub fn display_address(&self, module: &Module, id: AddressId) -> String {
        self.hierarchy.display_address(module, id)
    }

    /// Debug block: function name, one line per address in discovery order,
    /// then a blank line
    pub fn render_function_addresses(&self, module: &Module, function: FunctionId) -> String {
        self.render_block(
            module,
            &module.function_name(function),
            self.addresses_in_function(function),
        )
    }

    /// Same layout as a function block under `@<module name>`; empty when
    /// there are no module-level addresses
    pub fn render_module_addresses(&self, module: &Module) -> String {
        let ids = self.module_addresses();
        if ids.is_empty() {
            return String::new();
        }
        self.render_block(module, &format!("@{}", module.name), ids)
    }

    fn render_block(&self, module: &Module, title: &str, ids: &[AddressId]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", title);
        for &id in ids {
            let node = self.address(id);
            let _ = writeln!(
                out,
                "{}: {} [{}]",
                node.sequence,
                self.display_address(module, id),
                node.kind.label()
            );
        }
        let _ = writeln!(out);
        out
    }

    pub fn stats(&self) -> DiscoveryStats {
        let arena = self.hierarchy.arena().stats();
        DiscoveryStats {
            functions: self.functions,
            values_visited: self.values_visited,
            roots: arena.roots,
            constant_offsets: arena.constant_offsets,
            variable_offsets: arena.variable_offsets,
            max_depth: arena.max_depth,
            unions: self.unions,
            classes: self.hierarchy.sets().count(),
            duration_ms: self.duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pointer_discovery::ports::NoExecutable;
    use crate::shared::models::ModuleBuilder;

    #[test]
    fn test_argument_lookup() {
        let mut b = ModuleBuilder::new("m");
        let f = b.function("f");
        let p = b.argument(f);
        let unused = b.argument(f);
        let four = b.constant(4);
        let field = b.add(f, p, four);
        let module = b.build().unwrap();
        let candidates: CandidatePointers = [p, field].into_iter().collect();

        let mut discovery = PointerDiscovery::new(DiscoveryConfig::default());
        discovery.analyze_module(&NoExecutable, &module, &candidates);

        let root = discovery.address_of_argument(&module, p).unwrap();
        assert!(discovery.address(root).is_root());
        assert!(discovery.address_of_argument(&module, unused).is_none());
        assert!(discovery.address_of_argument(&module, field).is_none());
    }

    #[test]
    fn test_union_values() {
        let mut b = ModuleBuilder::new("m");
        let f = b.function("f");
        let p = b.argument(f);
        let q = b.argument(f);
        let module = b.build().unwrap();
        let candidates = CandidatePointers::heuristic(&module);

        let mut discovery = PointerDiscovery::new(DiscoveryConfig::default());
        discovery.analyze_module(&NoExecutable, &module, &candidates);
        let (pa, qa) = (discovery.lookup(p).unwrap(), discovery.lookup(q).unwrap());
        assert!(!discovery.same_set(pa, qa));

        discovery.union_values(p, q).unwrap();
        assert!(discovery.same_set(pa, qa));
        assert_eq!(discovery.stats().unions, 1);
        assert_eq!(discovery.stats().classes, 1);

        // already merged
        discovery.union_values(q, p).unwrap();
        assert_eq!(discovery.stats().unions, 1);
    }

    #[test]
    fn test_render_function_addresses() {
        let mut b = ModuleBuilder::new("m");
        let f = b.function("walk");
        let p = b.argument(f);
        let eight = b.constant(8);
        b.add(f, p, eight);
        let module = b.build().unwrap();
        let candidates = CandidatePointers::heuristic(&module);

        let mut discovery = PointerDiscovery::new(DiscoveryConfig::default());
        discovery.analyze_module(&NoExecutable, &module, &candidates);
        assert_eq!(
            discovery.render_function_addresses(&module, f),
            "walk\n0: %arg0 [root]\n1: (%arg0 + 8) [constant_offset]\n\n"
        );
    }
}
