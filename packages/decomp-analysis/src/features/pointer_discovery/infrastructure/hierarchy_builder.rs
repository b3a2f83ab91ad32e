//! Object address hierarchy builder
//!
//! Maps program values to address nodes, lazily and memoized. A candidate
//! value computed as `base ± operand` from another candidate becomes a child
//! of the base's node; everything else becomes a root.
//!
//! # Addition rule
//! - constant operand: `ConstantOffset` with `+c` / `-c`
//! - other operand: `VariableOffset` over the unscaled index, with the stride
//!   taken from an `i * k`, `k * i` or `i << s` operand (1 otherwise)
//!
//! A new child joins its parent's unification set. Merging two distinct sets
//! only happens through explicit unions by the caller.

use crate::config::DiscoveryConfig;
use crate::features::pointer_discovery::domain::{
    AddressId, AddressKind, KeyStep, ObjectAddress, OrderingKey, RootOrigin, UnificationSetId,
};
use crate::features::pointer_discovery::infrastructure::arena::AddressArena;
use crate::features::pointer_discovery::infrastructure::union_find::UnificationIndex;
use crate::features::pointer_discovery::ports::ExecutableInfo;
use crate::shared::models::{BinaryOp, CandidatePointers, FunctionId, Module, ValueDef, ValueId};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Inputs of one discovery step
#[derive(Clone, Copy)]
pub struct DiscoveryScope<'a> {
    pub module: &'a Module,
    pub candidates: &'a CandidatePointers,
    pub executable: &'a dyn ExecutableInfo,

    /// Function whose address list receives new nodes
    pub function: Option<FunctionId>,
}

impl<'a> DiscoveryScope<'a> {
    pub fn new(
        module: &'a Module,
        candidates: &'a CandidatePointers,
        executable: &'a dyn ExecutableInfo,
    ) -> Self {
        Self {
            module,
            candidates,
            executable,
            function: None,
        }
    }

    pub fn in_function(self, function: FunctionId) -> Self {
        Self {
            function: Some(function),
            ..self
        }
    }
}

/// `value = base ± operand`
#[derive(Debug, Clone, Copy)]
struct Derivation {
    base: ValueId,
    operand: ValueId,
    is_add: bool,
}

pub struct ObjectAddressHierarchy {
    config: DiscoveryConfig,
    arena: AddressArena,
    sets: UnificationIndex,
    by_value: FxHashMap<ValueId, AddressId>,
    per_function: FxHashMap<FunctionId, Vec<AddressId>>,
    /// Nodes created outside any function scope
    unscoped: Vec<AddressId>,
}

impl ObjectAddressHierarchy {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            arena: AddressArena::new(),
            sets: UnificationIndex::new(),
            by_value: FxHashMap::default(),
            per_function: FxHashMap::default(),
            unscoped: Vec::new(),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn arena(&self) -> &AddressArena {
        &self.arena
    }

    pub fn sets(&self) -> &UnificationIndex {
        &self.sets
    }

    pub fn sets_mut(&mut self) -> &mut UnificationIndex {
        &mut self.sets
    }

    #[inline]
    pub fn get(&self, id: AddressId) -> &ObjectAddress {
        self.arena.get(id)
    }

    /// Existing node of `value`, without creating one
    pub fn lookup(&self, value: ValueId) -> Option<AddressId> {
        self.by_value.get(&value).copied()
    }

    pub fn addresses_in_function(&self, function: FunctionId) -> &[AddressId] {
        self.per_function
            .get(&function)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn unscoped_addresses(&self) -> &[AddressId] {
        &self.unscoped
    }

    /// Node of `value`, creating it (and any missing ancestors) on first use
    pub fn address_of(&mut self, scope: &DiscoveryScope<'_>, value: ValueId) -> AddressId {
        if let Some(id) = self.lookup(value) {
            return id;
        }

        // Walk down to the nearest memoized ancestor or a root, then build
        // the chain back up. In a validated module operands precede their
        // uses; a longer walk than there are values means a derivation
        // cycle, and `value` becomes a root instead.
        let mut pending: Vec<(ValueId, Derivation)> = Vec::new();
        let mut current = value;
        let mut node = loop {
            if let Some(id) = self.lookup(current) {
                break id;
            }
            if pending.len() > scope.module.values.len() {
                warn!(
                    "Derivation cycle through {}, treating it as a root",
                    scope.module.display_value(value)
                );
                pending.clear();
                break self.create_root(scope, value);
            }
            match self.derivation(scope, current) {
                Some(derivation) => {
                    pending.push((current, derivation));
                    current = derivation.base;
                }
                None => break self.create_root(scope, current),
            }
        };

        while let Some((derived, derivation)) = pending.pop() {
            node = self.combine(scope, node, derived, derivation);
        }
        node
    }

    /// How a candidate value derives from another candidate, if it does
    fn derivation(&self, scope: &DiscoveryScope<'_>, value: ValueId) -> Option<Derivation> {
        if !scope.candidates.contains(value) {
            return None;
        }
        let ValueDef::Binary { op, lhs, rhs, .. } = scope.module.value_def(value)? else {
            return None;
        };
        let is_candidate = |v: ValueId| scope.candidates.contains(v);
        match op {
            BinaryOp::Add if is_candidate(*lhs) => Some(Derivation {
                base: *lhs,
                operand: *rhs,
                is_add: true,
            }),
            BinaryOp::Add if is_candidate(*rhs) => Some(Derivation {
                base: *rhs,
                operand: *lhs,
                is_add: true,
            }),
            // pointer - pointer is a distance, not an address
            BinaryOp::Sub if is_candidate(*lhs) && !is_candidate(*rhs) => Some(Derivation {
                base: *lhs,
                operand: *rhs,
                is_add: false,
            }),
            _ => None,
        }
    }

    fn create_root(&mut self, scope: &DiscoveryScope<'_>, value: ValueId) -> AddressId {
        let origin = match scope.module.value_def(value) {
            Some(ValueDef::Argument { index, .. }) => RootOrigin::Argument { index: *index },
            Some(ValueDef::Global { name }) => RootOrigin::Global { name: name.clone() },
            Some(ValueDef::Constant { value: constant }) => self.constant_origin(scope, *constant),
            _ => RootOrigin::Opaque,
        };
        self.push_node(scope, value, AddressKind::Root { origin }, None)
    }

    fn constant_origin(&self, scope: &DiscoveryScope<'_>, constant: i64) -> RootOrigin {
        if !self.config.mapped_constant_roots {
            return RootOrigin::Opaque;
        }
        match u64::try_from(constant) {
            Ok(address) if scope.executable.is_mapped_address(address) => {
                RootOrigin::MappedConstant { address }
            }
            _ => RootOrigin::Opaque,
        }
    }

    /// Apply the addition rule to `parent` for `value = base ± operand`
    fn combine(
        &mut self,
        scope: &DiscoveryScope<'_>,
        parent: AddressId,
        value: ValueId,
        derivation: Derivation,
    ) -> AddressId {
        let constant = scope
            .module
            .value_def(derivation.operand)
            .and_then(ValueDef::as_constant);
        let offset = constant.and_then(|c| if derivation.is_add { Some(c) } else { c.checked_neg() });

        let kind = match offset {
            Some(offset) => AddressKind::ConstantOffset { parent, offset },
            None if constant.is_some() => AddressKind::VariableOffset {
                parent,
                index: derivation.operand,
                stride: 1,
            },
            None => {
                let (index, stride) = self.scaled_index(scope.module, derivation.operand);
                AddressKind::VariableOffset {
                    parent,
                    index,
                    stride,
                }
            }
        };

        let set = self.sets.find(parent);
        self.push_node(scope, value, kind, Some(set))
    }

    /// Unscaled index and element stride of a variable operand
    fn scaled_index(&self, module: &Module, operand: ValueId) -> (ValueId, u64) {
        if !self.config.scaled_index_detection {
            return (operand, 1);
        }
        let positive = |v: ValueId| {
            module
                .value_def(v)
                .and_then(ValueDef::as_constant)
                .filter(|&k| k > 0)
        };

        let scaled = match module.value_def(operand) {
            Some(ValueDef::Binary {
                op: BinaryOp::Mul,
                lhs,
                rhs,
                ..
            }) => match (positive(*lhs), positive(*rhs)) {
                (_, Some(k)) => Some((*lhs, k as u64)),
                (Some(k), None) => Some((*rhs, k as u64)),
                (None, None) => None,
            },
            Some(ValueDef::Binary {
                op: BinaryOp::Shl,
                lhs,
                rhs,
                ..
            }) => module
                .value_def(*rhs)
                .and_then(ValueDef::as_constant)
                .filter(|s| (0..63).contains(s))
                .map(|s| (*lhs, 1u64 << s)),
            _ => None,
        };

        match scaled {
            Some((index, stride)) if stride <= self.config.max_stride => (index, stride),
            _ => (operand, 1),
        }
    }

    fn push_node(
        &mut self,
        scope: &DiscoveryScope<'_>,
        value: ValueId,
        kind: AddressKind,
        set: Option<UnificationSetId>,
    ) -> AddressId {
        let list = match scope.function {
            Some(function) => self.per_function.entry(function).or_default(),
            None => &mut self.unscoped,
        };
        let sequence = list.len() as u32;
        let id = self.arena.alloc(value, scope.function, sequence, kind);
        list.push(id);

        match set {
            Some(set) => self.sets.add_to_set(id, set),
            None => self.sets.make_set(id),
        };
        self.by_value.insert(value, id);

        node_trace!(
            "{} = {} for {}",
            id,
            self.arena.get(id).kind.label(),
            scope.module.display_value(value)
        );
        id
    }

    /// The root `id` derives from
    pub fn get_root(&self, id: AddressId) -> AddressId {
        self.arena.root_of(id)
    }

    pub fn ordering_key(&self, id: AddressId) -> OrderingKey {
        let steps = self
            .arena
            .chain(id)
            .into_iter()
            .map(|step| {
                let node = self.arena.get(step);
                let offset = match node.kind {
                    AddressKind::ConstantOffset { offset, .. } => offset,
                    _ => 0,
                };
                KeyStep {
                    offset,
                    rank: node.kind.rank(),
                    value: node.value.0,
                }
            })
            .collect();
        OrderingKey::from_steps(steps)
    }

    /// Textual form: `%arg0`, `(%arg0 + 8)`, `((%arg0 + 8) + %i*4)`
    pub fn display_address(&self, module: &Module, id: AddressId) -> String {
        let chain = self.arena.chain(id);
        let mut text = module.display_value(self.arena.get(chain[0]).value);
        for &step in &chain[1..] {
            text = match self.arena.get(step).kind {
                AddressKind::ConstantOffset { offset, .. } if offset < 0 => {
                    format!("({} - {})", text, offset.unsigned_abs())
                }
                AddressKind::ConstantOffset { offset, .. } => format!("({} + {})", text, offset),
                AddressKind::VariableOffset { index, stride, .. } if stride == 1 => {
                    format!("({} + {})", text, module.display_value(index))
                }
                AddressKind::VariableOffset { index, stride, .. } => {
                    format!("({} + {}*{})", text, module.display_value(index), stride)
                }
                AddressKind::Root { .. } => unreachable!("root below the top of a chain"),
            };
        }
        text
    }
}
