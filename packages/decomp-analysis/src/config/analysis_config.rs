//! Top-level analysis configuration

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigFileV1, ConfigOverrides};
use super::preset::Preset;
use super::stage_configs::{Architecture, DiscoveryConfig, ModRefConfig};
use crate::features::reg_modref::infrastructure::register_file::RegisterFile;
use std::path::Path;

const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    preset: Preset,

    /// Register file used for canonicalization
    pub architecture: Architecture,

    /// Register ModRef pass
    pub modref: ModRefConfig,

    /// Pointer discovery pass
    pub discovery: DiscoveryConfig,
}

impl AnalysisConfig {
    /// Start from a preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            architecture: Architecture::default(),
            modref: ModRefConfig::from_preset(preset),
            discovery: DiscoveryConfig::from_preset(preset),
        }
    }

    pub fn get_preset(&self) -> Preset {
        self.preset
    }

    /// Builder: Set architecture
    pub fn architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    /// Builder: Adjust the register ModRef configuration
    pub fn modref(mut self, f: impl FnOnce(ModRefConfig) -> ModRefConfig) -> Self {
        self.modref = f(self.modref);
        self
    }

    /// Builder: Adjust the pointer discovery configuration
    pub fn discovery(mut self, f: impl FnOnce(DiscoveryConfig) -> DiscoveryConfig) -> Self {
        self.discovery = f(self.discovery);
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> ConfigResult<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.discovery.validate()?;

        let registers = RegisterFile::for_architecture(self.architecture);
        for name in &self.modref.unknown_call_clobbers {
            if registers.canonicalize(name).is_none() {
                return Err(ConfigError::UnknownRegister {
                    register: name.clone(),
                    architecture: self.architecture.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&file.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: file.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = Preset::from_str(&file.preset)
            .map_err(|_| ConfigError::UnknownPreset(file.preset.clone()))?;

        let mut config = Self::preset(preset);
        if let Some(architecture) = file.architecture {
            config.architecture = architecture;
        }
        if let Some(overrides) = file.overrides {
            if let Some(modref) = overrides.modref {
                config.modref = modref;
            }
            if let Some(discovery) = overrides.discovery {
                config.discovery = discovery;
            }
        }

        config.build()
    }

    /// Export as YAML (schema v1, all overrides spelled out)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: 1,
            preset: self.preset.to_string(),
            architecture: Some(self.architecture),
            overrides: Some(ConfigOverrides {
                modref: Some(self.modref.clone()),
                discovery: Some(self.discovery.clone()),
            }),
        };
        serde_yaml::to_string(&file).map_err(ConfigError::Yaml)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}
