//! Analysis Service - runs both passes over one lifted module
//!
//! ```text
//!   AnalysisInput (module, candidates?, mapped ranges?)
//!          │
//!          ▼
//!   ┌──────────────────┐     ┌───────────────────────┐
//!   │ Register ModRef  │     │ Pointer discovery     │
//!   │ (call-graph SCCs)│     │ (address hierarchy)   │
//!   └────────┬─────────┘     └──────────┬────────────┘
//!            └──────────┬───────────────┘
//!                       ▼
//!                AnalysisOutcome → text dump / JSON report
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! let input = AnalysisInput::from_json_file("module.json")?;
//! let service = AnalysisService::new(AnalysisConfig::default())?;
//! let outcome = service.run(&input)?;
//! print!("{}", outcome.render_text(&input.module));
//! ```

use crate::config::AnalysisConfig;
use crate::errors::Result;
use crate::features::pointer_discovery::{
    DiscoveryReport, DiscoveryStats, MappedRange, MappedRanges, PointerDiscovery,
};
use crate::features::reg_modref::{ModRefStats, RegisterModRefAnalysis};
use crate::shared::models::{CandidatePointers, Module};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Serialized analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub module: Module,

    /// Candidate pointer values; the module heuristic is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<CandidatePointers>,

    /// Mapped segments of the executable image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mapped_ranges: Vec<MappedRange>,
}

impl AnalysisInput {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            candidates: None,
            mapped_ranges: Vec::new(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let input: Self = serde_json::from_str(content)?;
        input.module.validate()?;
        Ok(input)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Explicit candidates, or the heuristic set
    pub fn candidates(&self) -> CandidatePointers {
        match &self.candidates {
            Some(candidates) => candidates.clone(),
            None => CandidatePointers::heuristic(&self.module),
        }
    }
}

pub struct AnalysisService {
    config: AnalysisConfig,
}

impl AnalysisService {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, input: &AnalysisInput) -> Result<AnalysisOutcome> {
        let module = &input.module;
        module.validate()?;

        let mut modref = RegisterModRefAnalysis::from_config(&self.config);
        let modref_stats = modref.run(module);

        let candidates = input.candidates();
        let image = MappedRanges::new(input.mapped_ranges.iter().copied());
        let mut discovery = PointerDiscovery::from_config(&self.config);
        let discovery_stats = discovery.analyze_module(&image, module, &candidates);

        info!(
            "Analyzed '{}' ({} preset, {})",
            module.name,
            self.config.get_preset(),
            self.config.architecture
        );

        Ok(AnalysisOutcome {
            modref,
            discovery,
            modref_stats,
            discovery_stats,
        })
    }
}

/// Both analyses after a run
pub struct AnalysisOutcome {
    pub modref: RegisterModRefAnalysis,
    pub discovery: PointerDiscovery,
    pub modref_stats: ModRefStats,
    pub discovery_stats: DiscoveryStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterEntry {
    pub register: String,
    pub effect: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionModRef {
    pub function: String,
    pub recursive: bool,
    pub registers: Vec<RegisterEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub module: String,
    pub modref: Vec<FunctionModRef>,
    pub modref_stats: ModRefStats,
    pub discovery: DiscoveryReport,
}

impl AnalysisOutcome {
    /// ModRef blocks followed by address blocks, one per function, and a
    /// module-level address block when there is one
    pub fn render_text(&self, module: &Module) -> String {
        let mut out = self.modref.render_module(module);
        for function in module.function_ids() {
            out.push_str(&self.discovery.render_function_addresses(module, function));
        }
        out.push_str(&self.discovery.render_module_addresses(module));
        out
    }

    pub fn report(&self, module: &Module) -> AnalysisReport {
        use crate::features::reg_modref::RegisterNaming;

        let naming = self.modref.naming();
        let functions = module
            .function_ids()
            .map(|f| FunctionModRef {
                function: module.function_name(f),
                recursive: self.modref.is_recursive(f),
                registers: self
                    .modref
                    .table(f)
                    .map(|table| {
                        table
                            .iter()
                            .map(|(register, effect)| RegisterEntry {
                                register: naming.register_name(register).to_string(),
                                effect: effect.to_string(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        AnalysisReport {
            module: module.name.clone(),
            modref: functions,
            modref_stats: self.modref_stats.clone(),
            discovery: DiscoveryReport::build(&self.discovery, module),
        }
    }
}
