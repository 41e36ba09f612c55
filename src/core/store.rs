//! Store abstraction for Conegate's on-disk state.
//!
//! A `Store` is the resolved set of paths for one project root: the cone
//! state document and the append-only audit log both live under the
//! configured data directory.

use crate::core::config::{self, ConeConfig};
use crate::core::error::ConeError;
use std::path::{Path, PathBuf};

/// Store handle representing one Conegate project workspace.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute or caller-relative project root
    pub root: PathBuf,
    /// Configuration resolved for this root
    pub config: ConeConfig,
}

impl Store {
    /// Open a store at `root`, reading `conegate.toml` if present.
    pub fn open(root: &Path) -> Result<Self, ConeError> {
        let config = config::load_config(root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: &Path, config: ConeConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.data_dir)
    }

    /// Path of the persisted cone state (`data/cone_state.json` by default).
    pub fn state_path(&self) -> PathBuf {
        self.data_dir().join(&self.config.paths.state_file)
    }

    /// Path of the audit log (`data/audit.log` by default).
    pub fn audit_log_path(&self) -> PathBuf {
        self.data_dir().join(&self.config.paths.audit_log)
    }
}
