//! Per-function register ModRef table

use super::effect::ModRefEffect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

define_id!(
    /// Index into a register file. Full-width registers come first, so id
    /// order is the canonical register order.
    RegisterId,
    "r#"
);

/// Canonical register → effect. Registers without an entry are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRefTable {
    entries: BTreeMap<RegisterId, ModRefEffect>,
}

impl ModRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, register: RegisterId) -> ModRefEffect {
        self.entries.get(&register).copied().unwrap_or_default()
    }

    /// Join `effect` into the entry for `register`; returns whether it changed
    pub fn record(&mut self, register: RegisterId, effect: ModRefEffect) -> bool {
        if effect == ModRefEffect::None {
            return false;
        }
        let slot = self.entries.entry(register).or_default();
        let merged = slot.merge(effect);
        if merged == *slot {
            return false;
        }
        *slot = merged;
        true
    }

    /// Entries in canonical register order
    pub fn iter(&self) -> impl Iterator<Item = (RegisterId, ModRefEffect)> + '_ {
        self.entries.iter().map(|(r, e)| (*r, *e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
