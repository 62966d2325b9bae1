//! CLI configuration
//!
//! The `lablane` binary reads its acting identity and data-file location
//! from a TOML config file (default: `lablane.toml` in the working
//! directory). The identity decides which role every CLI operation runs as.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use lablane_model::{Actor, Role};

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "lablane.toml";

/// Acting identity for CLI operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Username recorded in job history entries
    pub username: String,

    /// Role the CLI acts as
    pub role: Role,

    /// Branch membership; required when role is branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    /// Branch display name; required when role is branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

/// Data-file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path of the JSON snapshot file
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("lablane-data.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

/// Full CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Acting identity
    pub identity: Identity,

    /// Data-file location
    #[serde(default)]
    pub data: DataConfig,
}

/// Errors loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("branch identity requires branch_id and branch_name")]
    MissingBranch,
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml)?;
        Ok(())
    }

    /// Check identity consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.role == Role::Branch
            && (self.identity.branch_id.is_none() || self.identity.branch_name.is_none())
        {
            return Err(ConfigError::MissingBranch);
        }
        Ok(())
    }

    /// The actor the CLI operates as.
    pub fn actor(&self) -> Actor {
        Actor {
            username: self.identity.username.clone(),
            role: self.identity.role,
            branch_id: self.identity.branch_id.clone(),
        }
    }
}
