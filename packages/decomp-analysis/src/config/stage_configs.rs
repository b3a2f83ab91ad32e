//! Per-pass configuration

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target architecture, selects the register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[default]
    X86_64,
    Aarch64,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::Aarch64 => write!(f, "aarch64"),
        }
    }
}

/// How recursive call-graph SCCs are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursionPolicy {
    /// One sweep over the SCC members, then every member takes the union of
    /// the members' writes
    SinglePass,
    /// Repeat sweeps until no table entry changes
    Fixpoint,
}

// ============================================================================
// Register ModRef
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModRefConfig {
    /// SCC resolution strategy
    pub recursion: RecursionPolicy,

    /// Registers assumed written by a call whose target is unknown
    pub unknown_call_clobbers: Vec<String>,
}

impl ModRefConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                recursion: RecursionPolicy::SinglePass,
                unknown_call_clobbers: Vec::new(),
            },
            Preset::Balanced | Preset::Thorough => Self {
                recursion: RecursionPolicy::Fixpoint,
                unknown_call_clobbers: Vec::new(),
            },
        }
    }

    /// Builder: Set recursion policy
    pub fn recursion(mut self, v: RecursionPolicy) -> Self {
        self.recursion = v;
        self
    }

    /// Builder: Set unknown_call_clobbers
    pub fn unknown_call_clobbers<I, S>(mut self, registers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unknown_call_clobbers = registers.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ModRefConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

// ============================================================================
// Pointer discovery
// ============================================================================

pub const MAX_STRIDE_LIMIT: u64 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Recognise `i * k` and `i << s` operands as scaled indices
    pub scaled_index_detection: bool,

    /// Largest stride accepted from a scaled operand; anything larger is
    /// kept as an unscaled index
    pub max_stride: u64,

    /// Candidate constants inside a mapped executable range become global roots
    pub mapped_constant_roots: bool,
}

impl DiscoveryConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast | Preset::Balanced => Self {
                scaled_index_detection: true,
                max_stride: 4096,
                mapped_constant_roots: false,
            },
            Preset::Thorough => Self {
                scaled_index_detection: true,
                max_stride: 65536,
                mapped_constant_roots: true,
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_stride == 0 || self.max_stride > MAX_STRIDE_LIMIT {
            return Err(ConfigError::out_of_range(
                "discovery.max_stride",
                self.max_stride,
                (1, MAX_STRIDE_LIMIT),
                "Element strides beyond this are almost never array accesses",
            ));
        }
        Ok(())
    }

    /// Builder: Set scaled_index_detection
    pub fn scaled_index_detection(mut self, v: bool) -> Self {
        self.scaled_index_detection = v;
        self
    }

    /// Builder: Set max_stride
    pub fn max_stride(mut self, v: u64) -> Self {
        self.max_stride = v;
        self
    }

    /// Builder: Set mapped_constant_roots
    pub fn mapped_constant_roots(mut self, v: bool) -> Self {
        self.mapped_constant_roots = v;
        self
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}
