use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConeError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),
    #[error("Engine '{0}' is in Canon but not registered")]
    EngineNotRegistered(String),
    #[error("Pantheon violation: role '{role}' may not perform '{action}'")]
    PantheonViolation { role: String, action: String },
    #[error("Validation error: {0}")]
    ValidationError(String),
}
