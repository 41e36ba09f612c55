//! Engine registry and execution gate.
//!
//! Registration is checked against Canon; execution is checked against the
//! Cone. A Cone denial is an ordinary failed `EngineResult`. An allowed
//! action on an engine nobody registered is a configuration defect and
//! surfaces as `EngineNotRegistered`.

use crate::core::error;
use crate::plugins::canon::{self, EngineSpec};
use crate::plugins::cone::{ConeStore, EngineAction};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EngineResult {
    pub ok: bool,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, JsonValue>>,
}

impl EngineResult {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
            data: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: BTreeMap<String, JsonValue>) -> Self {
        self.data = Some(data);
        self
    }
}

/// A business engine the gate can dispatch to.
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self) -> EngineResult;
    fn optimize(&self) -> EngineResult;
    fn scale(&self) -> EngineResult;
}

/// Stock engine bound to a Canon spec: every action succeeds and reports
/// its Canon class and exposure cap.
pub struct SopEngine {
    spec: &'static EngineSpec,
}

impl SopEngine {
    pub fn new(name: &str) -> Result<Self, error::ConeError> {
        Ok(Self {
            spec: canon::get_engine_spec(name)?,
        })
    }

    fn report(&self, action: EngineAction) -> EngineResult {
        let mut data = BTreeMap::new();
        data.insert("engine".to_string(), JsonValue::from(self.spec.name));
        data.insert("action".to_string(), JsonValue::from(action.as_str()));
        data.insert(
            "class".to_string(),
            JsonValue::from(self.spec.engine_class.as_str()),
        );
        data.insert(
            "hard_cap_usd".to_string(),
            self.spec
                .hard_cap_usd
                .map(JsonValue::from)
                .unwrap_or(JsonValue::Null),
        );
        EngineResult::ok(format!("{} {} completed per SOP", self.spec.name, action)).with_data(data)
    }
}

impl Engine for SopEngine {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn run(&self) -> EngineResult {
        self.report(EngineAction::Run)
    }

    fn optimize(&self) -> EngineResult {
        self.report(EngineAction::Optimize)
    }

    fn scale(&self) -> EngineResult {
        self.report(EngineAction::Scale)
    }
}

#[derive(Default)]
pub struct EngineRegistry {
    engines: BTreeMap<String, Box<dyn Engine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding a `SopEngine` for every year-1 Canon engine.
    pub fn with_year1_defaults() -> Result<Self, error::ConeError> {
        let mut registry = Self::new();
        for spec in canon::list_engines().into_iter().filter(|s| s.year1_allowed) {
            registry.register_engine(Box::new(SopEngine::new(spec.name)?))?;
        }
        Ok(registry)
    }

    /// Register `engine` under its name. Fails if the name is not in Canon.
    pub fn register_engine(&mut self, engine: Box<dyn Engine>) -> Result<(), error::ConeError> {
        let name = engine.name().to_string();
        canon::get_engine_spec(&name)?;
        tracing::debug!(engine = %name, "engine registered");
        self.engines.insert(name, engine);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    pub fn registered_names(&self) -> Vec<&str> {
        self.engines.keys().map(String::as_str).collect()
    }

    /// Ask the Cone first; dispatch to the engine only when allowed.
    pub fn execute(
        &self,
        cone: &ConeStore,
        engine_name: &str,
        action: &str,
    ) -> Result<EngineResult, error::ConeError> {
        let decision = cone.decide(engine_name, action)?;
        if !decision.allowed {
            return Ok(EngineResult::failed(decision.reason));
        }

        let engine = self
            .engines
            .get(engine_name)
            .ok_or_else(|| error::ConeError::EngineNotRegistered(engine_name.to_string()))?;

        let result = dispatch(engine.as_ref(), action);
        tracing::info!(engine = engine_name, action, ok = result.ok, "engine executed");
        Ok(result)
    }
}

/// Route `action` to the matching engine method.
fn dispatch(engine: &dyn Engine, action: &str) -> EngineResult {
    match action.parse::<EngineAction>() {
        Ok(EngineAction::Run) => engine.run(),
        Ok(EngineAction::Optimize) => engine.optimize(),
        Ok(EngineAction::Scale) => engine.scale(),
        // The Cone denies unknown actions first; reachable only if the matrix and parser drift.
        Err(_) => EngineResult::failed(format!("Unknown action '{}'", action)),
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "engine",
        "version": "0.1.0",
        "description": "Cone-gated engine execution",
        "commands": [
            { "name": "exec", "parameters": ["engine", "action"] },
            { "name": "list", "parameters": [] }
        ],
        "storage": []
    })
}
