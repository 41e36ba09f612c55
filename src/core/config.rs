//! Project configuration loaded from `conegate.toml`.
//!
//! A missing file is not an error: every field has a default, so a bare
//! project root behaves like `data/cone_state.json` + `data/audit.log`.

use crate::core::error::ConeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "conegate.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ConeConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_audit_log")]
    pub audit_log: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReviewConfig {
    /// Deny rate at or above which the weekly review fails.
    #[serde(default = "default_deny_rate_threshold")]
    pub deny_rate_threshold: f64,
    /// Number of trailing audit records considered for decision stats.
    #[serde(default = "default_decision_window")]
    pub decision_window: usize,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_state_file() -> String {
    "cone_state.json".to_string()
}

fn default_audit_log() -> String {
    "audit.log".to_string()
}

fn default_deny_rate_threshold() -> f64 {
    0.35
}

fn default_decision_window() -> usize {
    200
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            state_file: default_state_file(),
            audit_log: default_audit_log(),
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            deny_rate_threshold: default_deny_rate_threshold(),
            decision_window: default_decision_window(),
        }
    }
}

impl ConeConfig {
    pub fn validate(&self) -> Result<(), ConeError> {
        if !(0.0..=1.0).contains(&self.review.deny_rate_threshold) {
            return Err(ConeError::ConfigError(format!(
                "review.deny_rate_threshold must be within [0, 1], got {}",
                self.review.deny_rate_threshold
            )));
        }
        if self.review.decision_window == 0 {
            return Err(ConeError::ConfigError(
                "review.decision_window must be positive".to_string(),
            ));
        }
        for (key, value) in [
            ("paths.data_dir", &self.paths.data_dir),
            ("paths.state_file", &self.paths.state_file),
            ("paths.audit_log", &self.paths.audit_log),
        ] {
            if value.trim().is_empty() {
                return Err(ConeError::ConfigError(format!("{} must not be empty", key)));
            }
        }
        Ok(())
    }
}

/// Load config from `<project_root>/conegate.toml`, or defaults if absent.
pub fn load_config(project_root: &Path) -> Result<ConeConfig, ConeError> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(ConeConfig::default());
    }

    let content = fs::read_to_string(&config_path)?;
    let config: ConeConfig = toml::from_str(&content).map_err(|e| {
        ConeError::ConfigError(format!("{}: {}", config_path.display(), e))
    })?;
    config.validate()?;
    Ok(config)
}
