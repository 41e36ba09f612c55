//! Canon: the fixed registry of known business engines.
//!
//! The table is built once from five class lists and never mutated. Every
//! engine name the Cone decides on must be present here; a miss is an
//! `UnknownEngine` error, never a defaulted spec.

use crate::core::error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Risk posture, from expansion (A) down to survival (D).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConeBand {
    #[serde(rename = "A_EXPANSION")]
    AExpansion,
    #[serde(rename = "B_CAUTION")]
    BCaution,
    #[serde(rename = "C_STABILIZE")]
    CStabilize,
    #[serde(rename = "D_SURVIVAL")]
    DSurvival,
}

impl ConeBand {
    pub const ALL: [ConeBand; 4] = [
        ConeBand::AExpansion,
        ConeBand::BCaution,
        ConeBand::CStabilize,
        ConeBand::DSurvival,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConeBand::AExpansion => "A_EXPANSION",
            ConeBand::BCaution => "B_CAUTION",
            ConeBand::CStabilize => "C_STABILIZE",
            ConeBand::DSurvival => "D_SURVIVAL",
        }
    }
}

impl fmt::Display for ConeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConeBand {
    type Err = error::ConeError;

    /// Accepts the full band name or its letter, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "A_EXPANSION" => Ok(ConeBand::AExpansion),
            "B" | "B_CAUTION" => Ok(ConeBand::BCaution),
            "C" | "C_STABILIZE" => Ok(ConeBand::CStabilize),
            "D" | "D_SURVIVAL" => Ok(ConeBand::DSurvival),
            other => Err(error::ConeError::ValidationError(format!(
                "Unknown cone band '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EngineClass {
    Boring,
    Alpha,
    Opportunistic,
    Standby,
    Legacy,
}

impl EngineClass {
    pub const ALL: [EngineClass; 5] = [
        EngineClass::Boring,
        EngineClass::Alpha,
        EngineClass::Opportunistic,
        EngineClass::Standby,
        EngineClass::Legacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineClass::Boring => "boring",
            EngineClass::Alpha => "alpha",
            EngineClass::Opportunistic => "opportunistic",
            EngineClass::Standby => "standby",
            EngineClass::Legacy => "legacy",
        }
    }

    /// Name as it appears in denial reasons, e.g. `EngineClass.ALPHA`.
    pub fn qualified_name(&self) -> String {
        format!("EngineClass.{}", self.as_str().to_ascii_uppercase())
    }
}

impl fmt::Display for EngineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineClass {
    type Err = error::ConeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineClass::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                error::ConeError::ValidationError(format!("Unknown engine class '{}'", s))
            })
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EngineSpec {
    pub name: &'static str,
    pub engine_class: EngineClass,
    pub allow_optimization: bool,
    pub year1_allowed: bool,
    pub hard_cap_usd: Option<f64>,
}

const fn spec(
    name: &'static str,
    engine_class: EngineClass,
    allow_optimization: bool,
    year1_allowed: bool,
    hard_cap_usd: Option<f64>,
) -> EngineSpec {
    EngineSpec {
        name,
        engine_class,
        allow_optimization,
        year1_allowed,
        hard_cap_usd,
    }
}

const BORING_ENGINES: [EngineSpec; 3] = [
    spec("storage_units", EngineClass::Boring, false, true, None),
    spec("cleaning_services", EngineClass::Boring, false, true, None),
    spec("landscaping_maintenance", EngineClass::Boring, false, true, None),
];

const ALPHA_ENGINES: [EngineSpec; 3] = [
    spec("wholesaling", EngineClass::Alpha, true, true, None),
    spec("creative_finance", EngineClass::Alpha, true, true, None),
    spec("flip_rehab", EngineClass::Alpha, true, true, None),
];

const OPPORTUNISTIC_ENGINES: [EngineSpec; 2] = [
    spec("fx_arbitrage", EngineClass::Opportunistic, false, false, Some(5000.0)),
    spec("collectibles_flip", EngineClass::Opportunistic, false, false, Some(2500.0)),
];

const STANDBY_ENGINES: [EngineSpec; 2] = [
    spec("short_term_rentals", EngineClass::Standby, false, false, None),
    spec("ecommerce_private_label", EngineClass::Standby, false, false, None),
];

const LEGACY_ENGINES: [EngineSpec; 2] = [
    spec("vending_routes", EngineClass::Legacy, false, false, None),
    spec("atm_placements", EngineClass::Legacy, false, false, None),
];

static ENGINE_CANON: LazyLock<BTreeMap<&'static str, EngineSpec>> = LazyLock::new(|| {
    BORING_ENGINES
        .into_iter()
        .chain(ALPHA_ENGINES)
        .chain(OPPORTUNISTIC_ENGINES)
        .chain(STANDBY_ENGINES)
        .chain(LEGACY_ENGINES)
        .map(|s| (s.name, s))
        .collect()
});

pub fn get_engine_spec(name: &str) -> Result<&'static EngineSpec, error::ConeError> {
    ENGINE_CANON
        .get(name)
        .ok_or_else(|| error::ConeError::UnknownEngine(name.to_string()))
}

pub fn is_canonical(name: &str) -> bool {
    ENGINE_CANON.contains_key(name)
}

/// All Canon engines, sorted by name.
pub fn list_engines() -> Vec<&'static EngineSpec> {
    ENGINE_CANON.values().collect()
}

pub fn engines_in_class(class: EngineClass) -> Vec<&'static EngineSpec> {
    ENGINE_CANON
        .values()
        .filter(|s| s.engine_class == class)
        .collect()
}

/// Engines carrying a hard USD exposure cap.
pub fn capped_engines() -> Vec<&'static EngineSpec> {
    ENGINE_CANON
        .values()
        .filter(|s| s.hard_cap_usd.is_some())
        .collect()
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "canon",
        "version": "0.1.0",
        "description": "Fixed registry of business engines and their classes",
        "commands": [
            { "name": "list", "parameters": ["class"] },
            { "name": "show", "parameters": ["name"] }
        ],
        "storage": []
    })
}
