//! Cone: the risk-band state and the band x engine-class decision matrix.
//!
//! `ConeStore` is the explicit handle over the persisted state document
//! and the audit log. Callers open one per project root and pass it to
//! whatever needs a decision; nothing here is process-global.

use crate::core::audit::{self, AuditLog};
use crate::core::error;
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::canon::{self, ConeBand, EngineClass};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_REASON: &str = "Boot default: caution until governance KPIs are green";

pub type Metrics = BTreeMap<String, JsonValue>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConeState {
    pub band: ConeBand,
    pub reason: String,
    pub updated_at_utc: String,
    #[serde(default)]
    pub metrics: Metrics,
}

impl ConeState {
    /// Caution band used whenever no valid persisted state exists.
    pub fn boot_default() -> Self {
        Self {
            band: ConeBand::BCaution,
            reason: DEFAULT_REASON.to_string(),
            updated_at_utc: time::now_iso_utc(),
            metrics: Metrics::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConeDecision {
    pub allowed: bool,
    pub band: ConeBand,
    pub engine: String,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EngineAction {
    Run,
    Optimize,
    Scale,
}

impl EngineAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineAction::Run => "run",
            EngineAction::Optimize => "optimize",
            EngineAction::Scale => "scale",
        }
    }
}

impl fmt::Display for EngineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineAction {
    type Err = error::ConeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run" => Ok(EngineAction::Run),
            "optimize" => Ok(EngineAction::Optimize),
            "scale" => Ok(EngineAction::Scale),
            other => Err(error::ConeError::ValidationError(format!(
                "Unknown action '{}'",
                other
            ))),
        }
    }
}

/// Actions the matrix permits for `class` while the cone sits in `band`.
pub fn allowed_actions(band: ConeBand, class: EngineClass) -> &'static [EngineAction] {
    use EngineAction::{Optimize, Run, Scale};

    match (band, class) {
        (ConeBand::AExpansion, EngineClass::Boring) => &[Run, Scale],
        (ConeBand::AExpansion, EngineClass::Alpha) => &[Run, Scale, Optimize],
        (ConeBand::AExpansion, EngineClass::Opportunistic) => &[Run, Optimize],

        (ConeBand::BCaution, EngineClass::Boring) => &[Run],
        (ConeBand::BCaution, EngineClass::Alpha) => &[Run, Optimize],
        (ConeBand::BCaution, EngineClass::Opportunistic) => &[Run],

        (ConeBand::CStabilize, EngineClass::Boring) => &[Run],
        (ConeBand::CStabilize, EngineClass::Alpha) => &[Run],
        (ConeBand::CStabilize, EngineClass::Opportunistic) => &[],

        (ConeBand::DSurvival, EngineClass::Boring) => &[Run],
        (ConeBand::DSurvival, EngineClass::Alpha) => &[],
        (ConeBand::DSurvival, EngineClass::Opportunistic) => &[],

        (_, EngineClass::Standby | EngineClass::Legacy) => &[],
    }
}

/// Handle over the persisted cone state and its audit trail.
pub struct ConeStore {
    state_path: PathBuf,
    audit: AuditLog,
    cached: Mutex<Option<ConeState>>,
}

impl ConeStore {
    pub fn open(store: &Store) -> Self {
        Self::new(&store.state_path(), AuditLog::new(&store.audit_log_path()))
    }

    pub fn new(state_path: &Path, audit: AuditLog) -> Self {
        Self {
            state_path: state_path.to_path_buf(),
            audit,
            cached: Mutex::new(None),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    fn lock(&self) -> MutexGuard<'_, Option<ConeState>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state; loaded from disk on first call, cached afterwards.
    pub fn get_state(&self) -> ConeState {
        let mut cached = self.lock();
        cached
            .get_or_insert_with(|| load_from_disk(&self.state_path))
            .clone()
    }

    /// Replace band, reason and metrics, persist, then audit `CONE_SET`.
    ///
    /// The file is written before the cached copy is swapped, so a failed
    /// write leaves both on the previous state.
    pub fn set_state(
        &self,
        band: ConeBand,
        reason: &str,
        metrics: Metrics,
    ) -> Result<ConeState, error::ConeError> {
        let mut cached = self.lock();
        let state = ConeState {
            band,
            reason: reason.to_string(),
            updated_at_utc: time::now_iso_utc(),
            metrics,
        };

        persist(&self.state_path, &state)?;
        *cached = Some(state.clone());
        drop(cached);

        tracing::info!(band = %band, reason = %state.reason, "cone state set");
        self.audit.append(
            audit::EVENT_CONE_SET,
            &serde_json::json!({
                "band": band,
                "reason": state.reason,
                "metrics": state.metrics,
            }),
        )?;
        Ok(state)
    }

    /// Decide whether `action` on `engine_name` is permitted under the current band.
    ///
    /// Fails only when the engine is not in Canon. Every decision, allow or
    /// deny, appends exactly one audit record.
    pub fn decide(&self, engine_name: &str, action: &str) -> Result<ConeDecision, error::ConeError> {
        let spec = canon::get_engine_spec(engine_name)?;
        let band = self.get_state().band;
        let class = spec.engine_class;

        let in_matrix = allowed_actions(band, class)
            .iter()
            .any(|a| a.as_str() == action);

        let (allowed, reason) = if !in_matrix {
            (
                false,
                format!(
                    "Denied by Cone: band={} class={}",
                    band,
                    class.qualified_name()
                ),
            )
        } else if class == EngineClass::Boring && action == EngineAction::Optimize.as_str() {
            (
                false,
                "Denied: boring engines are SOP-only (no optimize).".to_string(),
            )
        } else if class == EngineClass::Opportunistic && action == EngineAction::Scale.as_str() {
            (
                false,
                "Denied: opportunistic engines cannot scale (capped).".to_string(),
            )
        } else {
            (true, "Allowed by Cone".to_string())
        };

        let decision = ConeDecision {
            allowed,
            band,
            engine: engine_name.to_string(),
            action: action.to_string(),
            reason,
        };

        tracing::debug!(
            engine = engine_name,
            action,
            band = %band,
            allowed,
            "cone decision"
        );
        let event = if allowed {
            audit::EVENT_CONE_ALLOW
        } else {
            audit::EVENT_CONE_DENY
        };
        self.audit.append(event, &decision)?;
        Ok(decision)
    }
}

fn load_from_disk(path: &Path) -> ConeState {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no cone state on disk; using boot default");
            return ConeState::boot_default();
        }
    };
    match serde_json::from_str::<ConeState>(&content) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "cone state file unreadable; falling back to caution default"
            );
            ConeState::boot_default()
        }
    }
}

fn persist(path: &Path, state: &ConeState) -> Result<(), error::ConeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "cone",
        "version": "0.1.0",
        "description": "Risk band state and engine action decisions",
        "commands": [
            { "name": "state show", "parameters": [] },
            { "name": "state set", "parameters": ["band", "reason", "metric"] },
            { "name": "decide", "parameters": ["engine", "action"] }
        ],
        "storage": ["cone_state.json", "audit.log"]
    })
}
