//! Project discovery and initialization
//!
//! A project is any directory containing a `.tagflow/` directory.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".tagflow";

const DEFAULT_CONFIG: &str = "\
# tagflow project configuration

store:
  path: .tagflow/tagflow.db

workflow:
  # Days an approval stays valid (0 = never expires)
  default_validity_days: 365
  # Points awarded when a progress workflow completes
  completion_points: 10

# Default reviewer for workflow commands, as Kind:id
# actor: \"Person:1\"
";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a tagflow project (no .tagflow/ found from {0})")]
    NotFound(PathBuf),

    #[error("Project already initialized at {0}")]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A tagflow project rooted at a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Create `.tagflow/` with a default config under `path`
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let dir = path.join(PROJECT_DIR);
        if dir.exists() {
            return Err(ProjectError::AlreadyExists(path.to_path_buf()));
        }
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("config.yaml"), DEFAULT_CONFIG)?;
        info!(root = %path.display(), "initialized project");
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Find the project containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Find the project containing `start`, walking up through its parents
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_DIR).is_dir())
            .map(|root| Self {
                root: root.to_path_buf(),
            })
            .ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tagflow_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.tagflow_dir().join("config.yaml")
    }
}
