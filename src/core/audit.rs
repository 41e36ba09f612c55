use crate::core::error;
use crate::core::time;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const EVENT_CONE_SET: &str = "CONE_SET";
pub const EVENT_CONE_ALLOW: &str = "CONE_ALLOW";
pub const EVENT_CONE_DENY: &str = "CONE_DENY";

/// The audit log is the single writer of `audit.log`.
/// One JSON record per line, appended; the file is opened per write.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub ts_utc: String,
    pub event: String,
    pub payload: JsonValue,
}

impl AuditLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `{ts_utc, event, payload}` line. I/O failures propagate.
    pub fn append<T: Serialize>(&self, event: &str, payload: &T) -> Result<(), error::ConeError> {
        // Serializes writers within the process; other processes may still interleave.
        static APPEND_LOCK: Mutex<()> = Mutex::new(());
        let _lock = APPEND_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let record = AuditRecord {
            ts_utc: time::now_iso_utc(),
            event: event.to_string(),
            payload: serde_json::to_value(payload)?,
        };
        let line = serde_json::to_string(&record)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(error::ConeError::IoError)?;
        writeln!(f, "{}", line).map_err(error::ConeError::IoError)?;
        Ok(())
    }

    /// All parseable records in file order. Malformed lines are skipped.
    pub fn records(&self) -> Result<Vec<AuditRecord>, error::ConeError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let mut out = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(line) {
                Ok(rec) => out.push(rec),
                Err(e) => tracing::debug!(path = %self.path.display(), error = %e, "skipping malformed audit line"),
            }
        }
        Ok(out)
    }

    /// Last `limit` records, oldest first.
    pub fn tail(&self, limit: usize) -> Result<Vec<AuditRecord>, error::ConeError> {
        let mut records = self.records()?;
        let start = records.len().saturating_sub(limit);
        Ok(records.split_off(start))
    }

    pub fn count(&self) -> Result<usize, error::ConeError> {
        Ok(self.records()?.len())
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "audit",
        "version": "0.1.0",
        "description": "Append-only governance audit log",
        "commands": [
            { "name": "tail", "parameters": ["limit"] }
        ],
        "events": [EVENT_CONE_SET, EVENT_CONE_ALLOW, EVENT_CONE_DENY],
        "storage": ["audit.log"]
    })
}
