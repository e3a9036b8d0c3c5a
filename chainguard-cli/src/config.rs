//! Configuration file handling.
//!
//! Looked up in order: an explicit `--config` path, `./chainguard.json`,
//! then `<config dir>/chainguard/config.json`. If none exists the built-in
//! defaults are used. `CHAINGUARD_SALT` overrides the salt from any file.

use chainguard_core::ConfigError;
use chainguard_graph::QueryLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the project-local config file.
pub const CONFIG_FILE: &str = "chainguard.json";

/// Environment variable that overrides the configured salt.
pub const SALT_ENV: &str = "CHAINGUARD_SALT";

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Let remote clients send real ids in batch requests.
    pub allow_real_ids: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7432,
            allow_real_ids: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainguardConfig {
    /// Risk-scored dataset (CSV).
    pub risk_path: PathBuf,
    /// Relationship edge list (CSV). A missing file yields an empty graph.
    pub edges_path: Option<PathBuf>,
    /// Pseudonymisation salt. Prefer `CHAINGUARD_SALT` over storing it here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    pub max_graph_depth: usize,
    pub default_top_k: usize,
    pub server: ServerSettings,
}

impl Default for ChainguardConfig {
    fn default() -> Self {
        Self {
            risk_path: PathBuf::from("data/processed/final_risk_scored.csv"),
            edges_path: Some(PathBuf::from("data/raw/elliptic_txs_edgelist.csv")),
            salt: None,
            max_graph_depth: QueryLimits::default().max_graph_depth,
            default_top_k: 10,
            server: ServerSettings::default(),
        }
    }
}

impl ChainguardConfig {
    /// Loads configuration following the lookup order, then applies the
    /// environment salt override.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigFileError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::candidate_paths().into_iter().find(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_salt_override(std::env::var(SALT_ENV).ok());
        Ok(config)
    }

    /// Reads one config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("chainguard").join("config.json"));
        }
        paths
    }

    /// Replaces the salt when a non-empty override is given.
    pub fn apply_salt_override(&mut self, value: Option<String>) {
        if let Some(salt) = value.filter(|s| !s.is_empty()) {
            self.salt = Some(salt);
        }
    }

    /// The salt to build identifiers with.
    pub fn salt(&self) -> Result<&str, ConfigError> {
        match self.salt.as_deref() {
            Some(salt) if !salt.is_empty() => Ok(salt),
            _ => Err(ConfigError::MissingSalt),
        }
    }

    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            max_graph_depth: self.max_graph_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ChainguardConfig::default();
        assert_eq!(config.server.port, 7432);
        assert_eq!(config.max_graph_depth, 3);
        assert_eq!(config.default_top_k, 10);
        assert!(matches!(config.salt(), Err(ConfigError::MissingSalt)));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"risk_path": "risk.csv", "salt": "s3cret", "server": {{"port": 9000}}}}"#
        )
        .unwrap();

        let config = ChainguardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.risk_path, PathBuf::from("risk.csv"));
        assert_eq!(config.salt().unwrap(), "s3cret");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.server.allow_real_ids);
        assert_eq!(config.max_graph_depth, 3);
    }

    #[test]
    fn test_real_ids_are_opt_in() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"server": {{"allow_real_ids": true}}}}"#).unwrap();

        let config = ChainguardConfig::from_file(file.path()).unwrap();
        assert!(config.server.allow_real_ids);
        assert_eq!(config.server.port, 7432);
        assert!(!ChainguardConfig::default().server.allow_real_ids);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ChainguardConfig::from_file(file.path()),
            Err(ConfigFileError::Parse { .. })
        ));
    }

    #[test]
    fn test_salt_override() {
        let mut config = ChainguardConfig {
            salt: Some("from-file".to_string()),
            ..Default::default()
        };
        config.apply_salt_override(Some(String::new()));
        assert_eq!(config.salt().unwrap(), "from-file");
        config.apply_salt_override(Some("from-env".to_string()));
        assert_eq!(config.salt().unwrap(), "from-env");
    }

    #[test]
    fn test_salt_is_not_written_when_absent() {
        let json = serde_json::to_string(&ChainguardConfig::default()).unwrap();
        assert!(!json.contains("salt"));
    }
}
