//! Register ModRef ports
//!
//! - [`RegisterNaming`]: maps raw operand names to canonical registers
//! - [`CallModRef`]: answers "does this call touch that location"; the
//!   register analysis implements it and chains to another implementation
//!   for everything it cannot decide

use crate::features::reg_modref::domain::{ModRefEffect, RegisterId};
use crate::shared::models::{CallSiteId, MemoryLocation, Module};

/// Register naming for one architecture
pub trait RegisterNaming: Send + Sync {
    /// Canonical id of a raw operand name (`eax`, `X0`, ...), `None` if unknown
    fn canonicalize(&self, raw: &str) -> Option<RegisterId>;

    /// The widest register overlapping `register` (`eax` → `rax`)
    fn largest_overlapping_register(&self, register: RegisterId) -> RegisterId;

    fn register_name(&self, register: RegisterId) -> &str;

    /// Every register that can key a table, in canonical order
    fn table_keys(&self) -> Vec<RegisterId>;

    /// Table key for a raw operand name
    fn key_register(&self, raw: &str) -> Option<RegisterId> {
        self.canonicalize(raw)
            .map(|r| self.largest_overlapping_register(r))
    }
}

/// ModRef query against a call site
pub trait CallModRef: Send + Sync {
    fn call_mod_ref(
        &self,
        module: &Module,
        site: CallSiteId,
        location: &MemoryLocation,
    ) -> ModRefEffect;
}

/// Answers `ModRef` for everything
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativeModRef;

impl CallModRef for ConservativeModRef {
    fn call_mod_ref(&self, _: &Module, _: CallSiteId, _: &MemoryLocation) -> ModRefEffect {
        ModRefEffect::ModRef
    }
}
