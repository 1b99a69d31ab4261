//! Layered configuration
//!
//! Values are merged from, lowest to highest precedence:
//! built-in defaults, the user config file (`<config dir>/tagflow/config.yaml`)
//! and the project config file (`.tagflow/config.yaml`).

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use thiserror::Error;
use tracing::warn;

use crate::core::project::Project;
use crate::core::reference::{EntityReference, ReferenceError};
use crate::core::workflow::WorkflowConfig;

/// Errors reading a configuration layer
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_yml::Error),
}

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database path, relative paths resolve against the project root
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".tagflow/tagflow.db"),
        }
    }
}

/// Merged configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub workflow: WorkflowConfig,
    /// Default acting entity for review commands, as `Kind:id`
    pub actor: Option<String>,
}

impl Config {
    /// Load defaults, then the user layer, then the project layer
    ///
    /// A layer that cannot be read or parsed is skipped with a warning.
    pub fn load(project: Option<&Project>) -> Self {
        let mut paths: Vec<PathBuf> = Vec::new();
        if let Some(user) = Self::user_config_path() {
            paths.push(user);
        }
        if let Some(project) = project {
            paths.push(project.config_path());
        }

        let mut layers = Vec::new();
        for path in paths.iter().filter(|p| p.exists()) {
            match read_layer(path) {
                Ok(layer) => layers.push(layer),
                Err(e) => warn!(error = %e, "ignoring configuration layer"),
            }
        }

        Self::from_layers(layers).unwrap_or_else(|e| {
            warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }

    /// Merge YAML layers over the defaults, later layers winning
    pub fn from_layers(layers: impl IntoIterator<Item = Value>) -> Result<Self, ConfigError> {
        let mut merged = serde_yml::to_value(Self::default())?;
        for layer in layers {
            merge(&mut merged, layer);
        }
        Ok(serde_yml::from_value(merged)?)
    }

    /// Path of the per-user configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tagflow").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Database path for `project`
    pub fn store_path(&self, project: &Project) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            project.root().join(&self.store.path)
        }
    }

    /// Configured default actor
    pub fn actor(&self) -> Result<Option<EntityReference>, ReferenceError> {
        self.actor.as_deref().map(str::parse).transpose()
    }
}

fn read_layer(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything
/// else replaces
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
