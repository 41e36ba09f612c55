//! Core modules shared by every Conegate subsystem.
//!
//! Store path resolution, configuration, the audit log, error types and
//! small output/time helpers live here.

pub mod audit;
pub mod config;
pub mod error;
pub mod output;
pub mod store;
pub mod time;
