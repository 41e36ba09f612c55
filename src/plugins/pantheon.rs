//! Pantheon role boundaries for the named agent helpers.

use crate::core::error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PantheonRole {
    Owner,
    Heimdall,
    Loki,
    Fenrir,
    Observer,
}

impl PantheonRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PantheonRole::Owner => "owner",
            PantheonRole::Heimdall => "heimdall",
            PantheonRole::Loki => "loki",
            PantheonRole::Fenrir => "fenrir",
            PantheonRole::Observer => "observer",
        }
    }
}

impl fmt::Display for PantheonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PantheonRole {
    type Err = error::ConeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(PantheonRole::Owner),
            "heimdall" => Ok(PantheonRole::Heimdall),
            "loki" => Ok(PantheonRole::Loki),
            "fenrir" => Ok(PantheonRole::Fenrir),
            "observer" => Ok(PantheonRole::Observer),
            other => Err(error::ConeError::ValidationError(format!(
                "Unknown role '{}'",
                other
            ))),
        }
    }
}

/// Caller identity as declared to the agent helpers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AgentContext {
    pub actor: String,
    pub role: PantheonRole,
}

impl AgentContext {
    pub fn new(actor: &str, role: PantheonRole) -> Self {
        Self {
            actor: actor.to_string(),
            role,
        }
    }
}

pub const HEIMDALL_ROLES: &[PantheonRole] = &[PantheonRole::Owner, PantheonRole::Heimdall];
pub const LOKI_ROLES: &[PantheonRole] = &[PantheonRole::Owner, PantheonRole::Loki];
pub const FENRIR_ROLES: &[PantheonRole] = &[PantheonRole::Owner, PantheonRole::Fenrir];

pub fn require_role(
    ctx: &AgentContext,
    allowed_roles: &[PantheonRole],
    action_name: &str,
) -> Result<(), error::ConeError> {
    if allowed_roles.contains(&ctx.role) {
        return Ok(());
    }
    tracing::warn!(actor = %ctx.actor, role = %ctx.role, action = action_name, "pantheon boundary violated");
    Err(error::ConeError::PantheonViolation {
        role: ctx.role.to_string(),
        action: action_name.to_string(),
    })
}

/// Orchestration entrypoint: owner or heimdall only.
pub fn heimdall_orchestrate<T, F>(ctx: &AgentContext, orchestrate: F) -> Result<T, error::ConeError>
where
    F: FnOnce() -> Result<T, error::ConeError>,
{
    require_role(ctx, HEIMDALL_ROLES, "heimdall.orchestrate")?;
    orchestrate()
}

/// Adversarial review entrypoint: owner or loki only.
pub fn loki_challenge<T, F>(ctx: &AgentContext, challenge: F) -> Result<T, error::ConeError>
where
    F: FnOnce() -> Result<T, error::ConeError>,
{
    require_role(ctx, LOKI_ROLES, "loki.challenge")?;
    challenge()
}

/// Emergency stop entrypoint: owner or fenrir only.
pub fn fenrir_halt<T, F>(ctx: &AgentContext, halt: F) -> Result<T, error::ConeError>
where
    F: FnOnce() -> Result<T, error::ConeError>,
{
    require_role(ctx, FENRIR_ROLES, "fenrir.halt")?;
    halt()
}
