//! SeedWork configuration
//!
//! Handles loading of `seedwork.yaml`. Every field has a default, so a
//! missing file and an empty file mean the same thing.

use crate::error::{Error, Result};
use crate::rules::Severity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file name looked up by [`Config::discover`]
pub const CONFIG_FILE: &str = "seedwork.yaml";

/// Root configuration (`seedwork.yaml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Name of the assembly user declarations are compiled into
    #[serde(default = "default_assembly")]
    pub assembly: String,

    /// Where the SeedWork runtime types live
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Marker attribute overrides, per pattern
    #[serde(default)]
    pub markers: MarkersConfig,

    /// Rule id to severity overrides
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,

    /// Rule ids that are never reported
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Code generation settings
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_assembly() -> String {
    "Compilation".to_string()
}

fn default_runtime_name() -> String {
    "Cranks.SeedWork.Domain".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assembly: default_assembly(),
            runtime: RuntimeConfig::default(),
            markers: MarkersConfig::default(),
            severity: BTreeMap::new(),
            disabled: Vec::new(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Assembly and namespace of `ValueObject`, `SmartEnum` and their markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuntimeConfig {
    #[serde(default = "default_runtime_name")]
    pub assembly: String,

    #[serde(default = "default_runtime_name")]
    pub namespace: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            assembly: default_runtime_name(),
            namespace: default_runtime_name(),
        }
    }
}

/// Identifies a marker attribute by simple name, assembly and namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MarkerTriple {
    /// Simple name including the `Attribute` suffix
    pub name: String,
    pub assembly: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MarkersConfig {
    #[serde(default)]
    pub value_object: Option<MarkerTriple>,

    #[serde(default)]
    pub smart_enum: Option<MarkerTriple>,
}

/// Settings for `seedwork generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationConfig {
    /// Synthesize fragments at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Output directory, relative to the config file
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Emit `IComparable` fragments for comparable value objects
    #[serde(default = "default_true")]
    pub comparable: bool,

    /// Emit `AllValues` / `Get` / `TryGet` for smart enums
    #[serde(default = "default_true")]
    pub registry: bool,
}

fn default_output_dir() -> String {
    "Generated".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: default_output_dir(),
            comparable: true,
            registry: true,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_norway::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))
    }

    /// Load `seedwork.yaml` from a directory
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_file = dir.join(CONFIG_FILE);
        if !config_file.exists() {
            return Ok(None);
        }
        Self::load(&config_file).map(Some)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_yaml(&content)
    }

    /// Walk up from `start` to the first directory holding a config file
    ///
    /// Returns the defaults and `None` when no file is found.
    pub fn discover(start: &Path) -> Result<(Self, Option<PathBuf>)> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            if let Some(config) = Self::load_from_dir(current)? {
                return Ok((config, Some(current.join(CONFIG_FILE))));
            }
            dir = current.parent();
        }
        Ok((Self::default(), None))
    }

    pub fn value_object_marker(&self) -> MarkerTriple {
        self.markers
            .value_object
            .clone()
            .unwrap_or_else(|| self.runtime_marker("ValueObjectAttribute"))
    }

    pub fn smart_enum_marker(&self) -> MarkerTriple {
        self.markers
            .smart_enum
            .clone()
            .unwrap_or_else(|| self.runtime_marker("SmartEnumAttribute"))
    }

    fn runtime_marker(&self, name: &str) -> MarkerTriple {
        MarkerTriple {
            name: name.to_string(),
            assembly: self.runtime.assembly.clone(),
            namespace: self.runtime.namespace.clone(),
        }
    }

    pub fn is_disabled(&self, rule_id: &str) -> bool {
        self.disabled.iter().any(|id| id == rule_id)
    }

    /// JSON schema for `seedwork.yaml`
    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(Config);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
