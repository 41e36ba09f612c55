//! Conegate: risk cone and engine canon gate.
//!
//! Conegate decides which business engines may run, optimize, or scale.
//! Two axes feed every decision:
//!
//! - **Canon** (`plugins::canon`): the fixed table of known engines and
//!   their class (boring, alpha, opportunistic, standby, legacy).
//! - **Cone** (`plugins::cone`): the current risk band (A expansion down to
//!   D survival), persisted as one JSON document.
//!
//! `ConeStore::decide` intersects the two through a total band x class
//! matrix, and `EngineRegistry::execute` only dispatches to an engine when
//! the decision allows it. Every state change and every decision is
//! appended to the audit log (`data/audit.log`).
//!
//! # Examples
//!
//! ```bash
//! conegate cone state set --band D --reason "cash runway under 60 days"
//! conegate cone decide --engine wholesaling --action run
//! conegate engine exec --engine storage_units --action run
//! conegate review weekly --format json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: shared primitives (store paths, config, audit log, errors)
//! - [`plugins`]: governance subsystems (canon, cone, engines, pantheon, review)

pub mod core;
pub mod plugins;

mod cli;

use crate::cli::{
    AuditCommand, CanonCommand, Cli, Command, ConeCommand, EngineCommand, OutputFormat,
    PantheonCommand, PantheonHelper, ReviewCommand, StateCommand,
};
use crate::core::{audit, error, output, store::Store, time};
use crate::plugins::cone::{ConeStore, Metrics};
use crate::plugins::engines::EngineRegistry;
use crate::plugins::{canon, cone, engines, pantheon, review};

use clap::Parser;
use colored::Colorize;
use serde_json::Value as JsonValue;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn emit(format: OutputFormat, cmd: &str, payload: JsonValue, text: impl FnOnce()) {
    match format {
        OutputFormat::Json => {
            let envelope = time::command_envelope(cmd, "ok", payload);
            println!(
                "{}",
                serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| envelope.to_string())
            );
        }
        OutputFormat::Text => text(),
    }
}

/// Parse `key=value`; the value is taken as JSON when it parses, else as a string.
pub fn parse_metric(raw: &str) -> Result<(String, JsonValue), error::ConeError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        error::ConeError::ValidationError(format!("metric '{}' is not key=value", raw))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(error::ConeError::ValidationError(format!(
            "metric '{}' has an empty key",
            raw
        )));
    }
    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| JsonValue::String(value.trim().to_string()));
    Ok((key.to_string(), value))
}

pub fn run() -> Result<(), error::ConeError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = match cli.root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };
    let store = Store::open(&root)?;
    let format = cli.format;

    match cli.command {
        Command::Cone(c) => run_cone_cli(&store, format, c.command),
        Command::Engine(c) => run_engine_cli(&store, format, c.command),
        Command::Canon(c) => run_canon_cli(format, c.command),
        Command::Audit(c) => run_audit_cli(&store, format, c.command),
        Command::Review(c) => run_review_cli(&store, format, c.command),
        Command::Pantheon(c) => run_pantheon_cli(format, c.command),
        Command::Capabilities => {
            let schemas = serde_json::json!({
                "subsystems": [
                    canon::schema(),
                    cone::schema(),
                    engines::schema(),
                    review::schema(),
                    audit::schema(),
                ]
            });
            emit(format, "capabilities", schemas.clone(), || {
                if let Some(subs) = schemas["subsystems"].as_array() {
                    for s in subs {
                        println!(
                            "{:<8} {}",
                            s["name"].as_str().unwrap_or("?").bright_cyan(),
                            s["description"].as_str().unwrap_or("")
                        );
                    }
                }
            });
            Ok(())
        }
    }
}

fn run_cone_cli(
    store: &Store,
    format: OutputFormat,
    command: ConeCommand,
) -> Result<(), error::ConeError> {
    let cone = ConeStore::open(store);
    match command {
        ConeCommand::State { command } => {
            let (cmd, state) = match command {
                StateCommand::Show => ("cone.state.show", cone.get_state()),
                StateCommand::Set {
                    band,
                    reason,
                    metrics,
                } => {
                    let band: canon::ConeBand = band.parse()?;
                    let mut parsed = Metrics::new();
                    for raw in &metrics {
                        let (k, v) = parse_metric(raw)?;
                        parsed.insert(k, v);
                    }
                    ("cone.state.set", cone.set_state(band, &reason, parsed)?)
                }
            };
            emit(format, cmd, serde_json::to_value(&state)?, || {
                println!("Band:    {}", state.band.to_string().bold());
                println!("Reason:  {}", output::compact_line(&state.reason, 120));
                println!("Updated: {}", state.updated_at_utc);
                if !state.metrics.is_empty() {
                    println!(
                        "Metrics: {}",
                        serde_json::to_string(&state.metrics).unwrap_or_default()
                    );
                }
            });
        }
        ConeCommand::Decide { engine, action } => {
            let decision = cone.decide(&engine, &action)?;
            emit(format, "cone.decide", serde_json::to_value(&decision)?, || {
                println!(
                    "{} {} {} (band {}): {}",
                    output::verdict(decision.allowed),
                    decision.engine,
                    decision.action,
                    decision.band,
                    decision.reason
                );
            });
        }
    }
    Ok(())
}

fn run_engine_cli(
    store: &Store,
    format: OutputFormat,
    command: EngineCommand,
) -> Result<(), error::ConeError> {
    let registry = EngineRegistry::with_year1_defaults()?;
    match command {
        EngineCommand::Exec { engine, action } => {
            let cone = ConeStore::open(store);
            let result = registry.execute(&cone, &engine, &action)?;
            emit(format, "engine.exec", serde_json::to_value(&result)?, || {
                println!("{} {}", output::verdict(result.ok), result.detail);
            });
        }
        EngineCommand::List => {
            let names = registry.registered_names();
            emit(format, "engine.list", serde_json::json!({ "engines": names }), || {
                for name in &names {
                    println!("{}", name);
                }
            });
        }
    }
    Ok(())
}

fn run_canon_cli(format: OutputFormat, command: CanonCommand) -> Result<(), error::ConeError> {
    match command {
        CanonCommand::List { class } => {
            let specs = match class {
                Some(c) => canon::engines_in_class(c.parse()?),
                None => canon::list_engines(),
            };
            emit(format, "canon.list", serde_json::json!({ "engines": specs }), || {
                for s in &specs {
                    let cap = s
                        .hard_cap_usd
                        .map(|c| format!("cap ${:.0}", c))
                        .unwrap_or_default();
                    println!(
                        "{:<26} {:<14} year1={:<5} {}",
                        s.name,
                        s.engine_class.to_string().bright_cyan(),
                        s.year1_allowed,
                        cap
                    );
                }
            });
        }
        CanonCommand::Show { name } => {
            let spec = canon::get_engine_spec(&name)?;
            emit(format, "canon.show", serde_json::to_value(spec)?, || {
                println!("Name:               {}", spec.name);
                println!("Class:              {}", spec.engine_class);
                println!("Allow optimization: {}", spec.allow_optimization);
                println!("Year 1 allowed:     {}", spec.year1_allowed);
                match spec.hard_cap_usd {
                    Some(cap) => println!("Hard cap (USD):     {:.2}", cap),
                    None => println!("Hard cap (USD):     none"),
                }
            });
        }
    }
    Ok(())
}

fn run_audit_cli(
    store: &Store,
    format: OutputFormat,
    command: AuditCommand,
) -> Result<(), error::ConeError> {
    let log = audit::AuditLog::new(&store.audit_log_path());
    match command {
        AuditCommand::Tail { limit } => {
            let records = log.tail(limit)?;
            emit(format, "audit.tail", serde_json::json!({ "records": records }), || {
                for r in &records {
                    println!(
                        "{} {:<10} {}",
                        r.ts_utc,
                        r.event,
                        output::compact_line(&r.payload.to_string(), 100)
                    );
                }
            });
        }
    }
    Ok(())
}

fn run_review_cli(
    store: &Store,
    format: OutputFormat,
    command: ReviewCommand,
) -> Result<(), error::ConeError> {
    match command {
        ReviewCommand::Weekly => {
            let cone = ConeStore::open(store);
            let registry = EngineRegistry::with_year1_defaults()?;
            let report = review::weekly_review(&cone, &registry, &store.config.review)?;
            emit(format, "review.weekly", serde_json::to_value(&report)?, || {
                for item in &report.checklist {
                    println!("[{}] {}", output::pass_fail(item.pass), item.item);
                    println!("       {}", item.note);
                }
                println!();
                println!("Recommendation: {}", report.recommendation.bold());
            });
        }
    }
    Ok(())
}

fn run_pantheon_cli(format: OutputFormat, command: PantheonCommand) -> Result<(), error::ConeError> {
    match command {
        PantheonCommand::Check {
            actor,
            role,
            helper,
        } => {
            let ctx = pantheon::AgentContext::new(&actor, role.parse()?);
            let outcome = match helper {
                PantheonHelper::Heimdall => pantheon::heimdall_orchestrate(&ctx, || Ok(())),
                PantheonHelper::Loki => pantheon::loki_challenge(&ctx, || Ok(())),
                PantheonHelper::Fenrir => pantheon::fenrir_halt(&ctx, || Ok(())),
            };
            let (allowed, detail) = match outcome {
                Ok(()) => (true, "role permitted".to_string()),
                Err(e @ error::ConeError::PantheonViolation { .. }) => (false, e.to_string()),
                Err(e) => return Err(e),
            };
            emit(
                format,
                "pantheon.check",
                serde_json::json!({ "actor": ctx.actor, "role": ctx.role, "allowed": allowed, "detail": detail }),
                || println!("{} {}", output::verdict(allowed), detail),
            );
        }
    }
    Ok(())
}
