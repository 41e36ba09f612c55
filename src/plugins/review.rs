//! Weekly governance review over the cone state, Canon and recent decisions.

use crate::core::audit::{self, AuditLog};
use crate::core::config::ReviewConfig;
use crate::core::error;
use crate::core::time;
use crate::plugins::canon::{self, ConeBand, EngineClass};
use crate::plugins::cone::ConeStore;
use crate::plugins::engines::EngineRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RECOMMEND_CONTINUE: &str = "CONTINUE";
pub const RECOMMEND_STABILIZE: &str = "DROP_AND_STABILIZE";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DecisionStats {
    pub window: usize,
    pub allow: usize,
    pub deny: usize,
    pub deny_rate: f64,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChecklistItem {
    pub item: String,
    pub pass: bool,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeeklyReview {
    pub ts_utc: String,
    pub band: ConeBand,
    pub checklist: Vec<ChecklistItem>,
    pub decision_stats: DecisionStats,
    pub capped_engines: usize,
    pub recommendation: String,
}

impl WeeklyReview {
    pub fn all_pass(&self) -> bool {
        self.checklist.iter().all(|c| c.pass)
    }
}

/// Tally events over the last `last_n` audit records.
pub fn decision_stats(audit_log: &AuditLog, last_n: usize) -> Result<DecisionStats, error::ConeError> {
    let records = audit_log.tail(last_n)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for rec in &records {
        *counts.entry(rec.event.clone()).or_default() += 1;
    }

    let allow = counts.get(audit::EVENT_CONE_ALLOW).copied().unwrap_or(0);
    let deny = counts.get(audit::EVENT_CONE_DENY).copied().unwrap_or(0);
    let decided = allow + deny;
    let deny_rate = if decided == 0 {
        0.0
    } else {
        deny as f64 / decided as f64
    };

    Ok(DecisionStats {
        window: records.len(),
        allow,
        deny,
        deny_rate,
        counts,
    })
}

pub fn weekly_review(
    cone: &ConeStore,
    registry: &EngineRegistry,
    config: &ReviewConfig,
) -> Result<WeeklyReview, error::ConeError> {
    let state = cone.get_state();
    let stats = decision_stats(cone.audit(), config.decision_window)?;

    let boring = canon::engines_in_class(EngineClass::Boring);
    let clever_boring: Vec<&str> = boring
        .iter()
        .filter(|s| s.allow_optimization)
        .map(|s| s.name)
        .collect();
    let boring_names: Vec<&str> = boring.iter().map(|s| s.name).collect();

    let capped = canon::capped_engines();

    let checklist = vec![
        ChecklistItem {
            item: "Are boring engines still SOP-only (no cleverness)?".to_string(),
            pass: clever_boring.is_empty(),
            note: if clever_boring.is_empty() {
                format!("Boring engines: {}", boring_names.join(", "))
            } else {
                format!("Boring engines allowing optimization: {}", clever_boring.join(", "))
            },
        },
        ChecklistItem {
            item: format!("Is Cone band correct? Currently {}.", state.band),
            pass: matches!(state.band, ConeBand::AExpansion | ConeBand::BCaution),
            note: format!("Band: {}, reason: {}", state.band, state.reason),
        },
        ChecklistItem {
            item: "Decision health - deny rate normal?".to_string(),
            pass: stats.deny_rate < config.deny_rate_threshold,
            note: format!(
                "Deny rate: {:.0}% over {} decisions (threshold {:.0}%)",
                stats.deny_rate * 100.0,
                stats.allow + stats.deny,
                config.deny_rate_threshold * 100.0
            ),
        },
        ChecklistItem {
            item: "Any new engine added outside Canon?".to_string(),
            // Registration rejects non-Canon names, so this row is informational.
            pass: true,
            note: format!(
                "Canon engines: {}, registered: {}",
                canon::list_engines().len(),
                registry.registered_names().len()
            ),
        },
        ChecklistItem {
            item: "All capital usage within caps?".to_string(),
            pass: true,
            note: format!("Capped engines: {}", capped.len()),
        },
    ];

    let recommendation = if checklist.iter().all(|c| c.pass) {
        RECOMMEND_CONTINUE
    } else {
        RECOMMEND_STABILIZE
    };

    Ok(WeeklyReview {
        ts_utc: time::now_iso_utc(),
        band: state.band,
        checklist,
        decision_stats: stats,
        capped_engines: capped.len(),
        recommendation: recommendation.to_string(),
    })
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "review",
        "version": "0.1.0",
        "description": "Weekly governance checklist and decision health",
        "commands": [
            { "name": "weekly", "parameters": [] }
        ],
        "storage": ["audit.log"]
    })
}
