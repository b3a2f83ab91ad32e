//! Interprocedural register ModRef analysis
//!
//! Computes, per function, which registers the function (transitively through
//! its callees) may write and may read. Functions are processed in call-graph
//! SCC order so every non-recursive callee is complete before its callers.
//!
//! # Recursion
//! Members of one SCC are swept together. A call to another member reads the
//! callee's table as it is at that point: writes carry over, every other
//! register (recorded or not) is an `IncompleteRef`. Callers outside the
//! cycle see those as plain `Ref`.
//!
//! With [`RecursionPolicy::Fixpoint`] sweeps repeat until no entry changes.
//! With [`RecursionPolicy::SinglePass`] a cycle gets one sweep, after which
//! every member takes the union of the members' writes. Members of a cycle
//! reach one another, so both policies produce the same tables.
//!
//! # Usage
//! ```text
//! let mut analysis = RegisterModRefAnalysis::from_config(&AnalysisConfig::default());
//! analysis.run(&module);
//! let effect = analysis.query(&module, site, &MemoryLocation::register("eax"));
//! ```

use crate::config::{AnalysisConfig, ModRefConfig, RecursionPolicy};
use crate::features::reg_modref::domain::{ModRefEffect, ModRefTable, RegisterId};
use crate::features::reg_modref::infrastructure::{CallGraph, CallGraphScc, RegisterFile};
use crate::features::reg_modref::ports::{CallModRef, ConservativeModRef, RegisterNaming};
use crate::shared::models::{
    CallSite, CallSiteId, CallTarget, FunctionId, Instruction, MemoryLocation, Module,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModRefStats {
    pub functions: usize,
    pub sccs: usize,
    pub recursive_sccs: usize,
    /// Body sweeps over all SCCs (1 per non-recursive function)
    pub sweeps: usize,
    pub indirect_calls: usize,
    /// Distinct raw register names that could not be canonicalized
    pub unknown_registers: usize,
    pub duration_ms: f64,
}

pub struct RegisterModRefAnalysis<N: RegisterNaming = RegisterFile> {
    config: ModRefConfig,
    naming: N,
    fallback: Box<dyn CallModRef>,

    /// Canonical unknown-call clobber set
    clobbers: Vec<RegisterId>,
    /// Every table key, for calls into an unfinished cycle
    keys: Vec<RegisterId>,

    tables: FxHashMap<FunctionId, ModRefTable>,
    complete: FxHashSet<FunctionId>,
    recursive: FxHashSet<FunctionId>,

    unknown_registers: FxHashSet<String>,
    indirect_sites: FxHashSet<CallSiteId>,
    stats: ModRefStats,
}

impl RegisterModRefAnalysis<RegisterFile> {
    /// Analysis over the register file of the configured architecture
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.modref.clone(),
            RegisterFile::for_architecture(config.architecture),
        )
    }
}

impl<N: RegisterNaming> RegisterModRefAnalysis<N> {
    pub fn new(config: ModRefConfig, naming: N) -> Self {
        let mut clobbers = Vec::new();
        for raw in &config.unknown_call_clobbers {
            match naming.key_register(raw) {
                Some(register) => clobbers.push(register),
                None => warn!("Ignoring unknown clobber register '{}'", raw),
            }
        }
        clobbers.sort_unstable();
        clobbers.dedup();
        let keys = naming.table_keys();

        Self {
            config,
            naming,
            fallback: Box::new(ConservativeModRef),
            clobbers,
            keys,
            tables: FxHashMap::default(),
            complete: FxHashSet::default(),
            recursive: FxHashSet::default(),
            unknown_registers: FxHashSet::default(),
            indirect_sites: FxHashSet::default(),
            stats: ModRefStats::default(),
        }
    }

    /// Answer queries this analysis cannot decide with `fallback`
    pub fn with_fallback(mut self, fallback: impl CallModRef + 'static) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    pub fn config(&self) -> &ModRefConfig {
        &self.config
    }

    pub fn naming(&self) -> &N {
        &self.naming
    }

    pub fn stats(&self) -> &ModRefStats {
        &self.stats
    }

    /// Compute tables for every function of `module`
    pub fn run(&mut self, module: &Module) -> ModRefStats {
        let start = Instant::now();

        let graph = CallGraph::build(module);
        let sccs = graph.sccs();
        for scc in &sccs {
            self.compute_scc(module, scc);
        }

        self.stats.duration_ms += start.elapsed().as_secs_f64() * 1000.0;
        let graph_stats = graph.stats(&sccs);
        info!(
            "Register ModRef for '{}': {} functions, {} call edges, {} recursive SCCs (largest {}), {} sweeps",
            module.name,
            graph_stats.total_nodes,
            graph_stats.total_edges,
            graph_stats.recursive_sccs,
            graph_stats.largest_scc,
            self.stats.sweeps
        );
        self.stats.clone()
    }

    /// Compute one call-graph SCC.
    ///
    /// Callee SCCs must already be complete; a callee without a table
    /// contributes nothing.
    pub fn compute_scc(&mut self, module: &Module, scc: &CallGraphScc) {
        if scc.members.iter().all(|f| self.complete.contains(f)) {
            return;
        }
        for &f in &scc.members {
            self.tables.entry(f).or_default();
        }

        let fixpoint = scc.recursive && self.config.recursion == RecursionPolicy::Fixpoint;
        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut changed = false;
            for &f in &scc.members {
                changed |= self.sweep(module, f, scc);
            }
            if !(fixpoint && changed) {
                break;
            }
        }
        if scc.recursive && !fixpoint {
            self.share_cycle_writes(scc);
        }

        for &f in &scc.members {
            self.complete.insert(f);
            if scc.recursive {
                self.recursive.insert(f);
            }
        }

        self.stats.sccs += 1;
        self.stats.functions += scc.members.len();
        self.stats.sweeps += sweeps;
        if scc.recursive {
            self.stats.recursive_sccs += 1;
            debug!(
                "Resolved recursive SCC [{}] in {} sweep(s)",
                scc.members
                    .iter()
                    .map(|&f| module.function_name(f))
                    .collect::<Vec<_>>()
                    .join(", "),
                sweeps
            );
        }
    }

    /// Compute `function` alone, treating it as its own SCC.
    ///
    /// Intended for callers that drive the order themselves; [`Self::run`]
    /// is the usual entry point.
    pub fn compute_for_function(&mut self, module: &Module, function: FunctionId) {
        if self.complete.contains(&function) {
            return;
        }
        let self_call = module.function(function).is_some_and(|body| {
            body.call_sites()
                .any(|site| module.call_site(site).and_then(CallSite::direct_callee) == Some(function))
        });
        self.compute_scc(module, &CallGraphScc::singleton(function, self_call));
    }

    /// Record the union of the members' writes in every member
    fn share_cycle_writes(&mut self, scc: &CallGraphScc) {
        let mut writes: Vec<RegisterId> = scc
            .members
            .iter()
            .filter_map(|f| self.tables.get(f))
            .flat_map(|table| table.iter().filter(|(_, e)| e.is_mod()).map(|(r, _)| r))
            .collect();
        writes.sort_unstable();
        writes.dedup();

        for &f in &scc.members {
            let table = self.tables.entry(f).or_default();
            for &register in &writes {
                table.record(register, ModRefEffect::Mod);
            }
        }
    }

    /// One pass over the body of `function`; returns whether its table changed
    fn sweep(&mut self, module: &Module, function: FunctionId, scc: &CallGraphScc) -> bool {
        let Some(body) = module.function(function) else {
            return false;
        };

        let mut effects: Vec<(RegisterId, ModRefEffect)> = Vec::new();
        for inst in &body.body {
            match inst {
                Instruction::ReadRegister { register } => {
                    self.push_register(module, function, register, ModRefEffect::Ref, &mut effects)
                }
                Instruction::WriteRegister { register } => {
                    self.push_register(module, function, register, ModRefEffect::Mod, &mut effects)
                }
                Instruction::Call { site } => self.push_call(module, *site, scc, &mut effects),
            }
        }

        let table = self.tables.entry(function).or_default();
        let mut changed = false;
        for (register, effect) in effects {
            changed |= table.record(register, effect);
        }
        node_trace!("swept {} ({} entries, changed={})", function, table.len(), changed);
        changed
    }

    fn push_register(
        &mut self,
        module: &Module,
        function: FunctionId,
        raw: &str,
        effect: ModRefEffect,
        out: &mut Vec<(RegisterId, ModRefEffect)>,
    ) {
        match self.naming.key_register(raw) {
            Some(register) => out.push((register, effect)),
            None => {
                if self.unknown_registers.insert(raw.to_string()) {
                    self.stats.unknown_registers += 1;
                    warn!(
                        "Skipping unknown register '{}' in '{}'",
                        raw,
                        module.function_name(function)
                    );
                }
            }
        }
    }

    fn push_call(
        &mut self,
        module: &Module,
        site: CallSiteId,
        scc: &CallGraphScc,
        out: &mut Vec<(RegisterId, ModRefEffect)>,
    ) {
        let Some(call) = module.call_site(site) else {
            return;
        };
        match call.target {
            CallTarget::Direct { function: callee } if scc.contains(callee) => {
                // a register the callee has not recorded yet is still a possible read
                let table = self.tables.get(&callee);
                out.extend(self.keys.iter().map(|&register| {
                    let recorded = table.map(|t| t.get(register)).unwrap_or_default();
                    (register, recorded.through_recursive_call())
                }));
            }
            CallTarget::Direct { function: callee } => {
                let Some(table) = self.tables.get(&callee) else {
                    debug!("No table for callee '{}'", module.function_name(callee));
                    return;
                };
                out.extend(table.iter().map(|(register, effect)| (register, effect.promoted())));
            }
            CallTarget::Indirect { .. } => {
                if self.indirect_sites.insert(site) {
                    self.stats.indirect_calls += 1;
                }
                out.extend(self.clobbers.iter().map(|&r| (r, ModRefEffect::Mod)));
            }
        }
    }

    /// ModRef of `location` across the call at `site`.
    ///
    /// Register locations at direct calls are answered from the callee's
    /// table (absent entry = `None`). Everything else goes to the fallback.
    pub fn query(&self, module: &Module, site: CallSiteId, location: &MemoryLocation) -> ModRefEffect {
        match self.table_answer(module, site, location) {
            Some(effect) => effect,
            None => self.fallback.call_mod_ref(module, site, location),
        }
    }

    fn table_answer(
        &self,
        module: &Module,
        site: CallSiteId,
        location: &MemoryLocation,
    ) -> Option<ModRefEffect> {
        let callee = module.call_site(site)?.direct_callee()?;
        let table = self.tables.get(&callee)?;
        let MemoryLocation::Register(raw) = location else {
            return None;
        };
        let register = self.naming.key_register(raw)?;
        Some(table.get(register))
    }

    /// Effect recorded for `register` (any spelling) in `function`'s table
    pub fn effect_of(&self, function: FunctionId, register: &str) -> ModRefEffect {
        let Some(table) = self.tables.get(&function) else {
            return ModRefEffect::None;
        };
        self.naming
            .key_register(register)
            .map(|r| table.get(r))
            .unwrap_or_default()
    }

    pub fn table(&self, function: FunctionId) -> Option<&ModRefTable> {
        self.tables.get(&function)
    }

    pub fn is_complete(&self, function: FunctionId) -> bool {
        self.complete.contains(&function)
    }

    /// Part of a recursive call-graph SCC
    pub fn is_recursive(&self, function: FunctionId) -> bool {
        self.recursive.contains(&function)
    }

    /// Write `function`'s table to `out`, see [`Self::render_function`]
    pub fn dump_function<W: Write>(
        &self,
        module: &Module,
        function: FunctionId,
        out: &mut W,
    ) -> io::Result<()> {
        out.write_all(self.render_function(module, function).as_bytes())
    }

    /// `function`'s name, one `reg: effect` line per entry in canonical
    /// register order, then a blank line
    pub fn render_function(&self, module: &Module, function: FunctionId) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", module.function_name(function));
        if let Some(table) = self.tables.get(&function) {
            for (register, effect) in table.iter() {
                let _ = writeln!(out, "{}: {}", self.naming.register_name(register), effect);
            }
        }
        out.push('\n');
        out
    }

    /// Dump of every function in module order
    pub fn render_module(&self, module: &Module) -> String {
        module
            .function_ids()
            .map(|f| self.render_function(module, f))
            .collect()
    }
}

impl<N: RegisterNaming> CallModRef for RegisterModRefAnalysis<N> {
    fn call_mod_ref(
        &self,
        module: &Module,
        site: CallSiteId,
        location: &MemoryLocation,
    ) -> ModRefEffect {
        self.query(module, site, location)
    }
}
