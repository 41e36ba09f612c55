//! CLI struct definitions for the Conegate command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "conegate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Risk cone and engine canon gate: decides which engines may run, optimize, or scale under the current band."
)]
pub(crate) struct Cli {
    /// Project root holding `conegate.toml` and the data directory (defaults to cwd).
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,
    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    /// Enable debug-level diagnostics on stderr.
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Risk band state and decisions
    Cone(ConeCli),
    /// Cone-gated engine execution
    Engine(EngineCli),
    /// Inspect the engine Canon
    Canon(CanonCli),
    /// Inspect the audit log
    Audit(AuditCli),
    /// Governance reviews
    Review(ReviewCli),
    /// Pantheon role boundary checks
    Pantheon(PantheonCli),
    /// Print subsystem schemas
    Capabilities,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ConeCli {
    #[clap(subcommand)]
    pub command: ConeCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ConeCommand {
    /// Show or change the current band
    State {
        #[clap(subcommand)]
        command: StateCommand,
    },
    /// Decide whether an action on an engine is allowed
    Decide {
        #[clap(long)]
        engine: String,
        #[clap(long)]
        action: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum StateCommand {
    /// Print the current cone state
    Show,
    /// Set band and reason (persisted and audited)
    Set {
        /// A_EXPANSION, B_CAUTION, C_STABILIZE, D_SURVIVAL (or A/B/C/D)
        #[clap(long)]
        band: String,
        #[clap(long)]
        reason: String,
        /// Metric as key=value; value is parsed as JSON when possible.
        #[clap(long = "metric")]
        metrics: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct EngineCli {
    #[clap(subcommand)]
    pub command: EngineCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum EngineCommand {
    /// Execute an action through the Cone gate
    Exec {
        #[clap(long)]
        engine: String,
        #[clap(long)]
        action: String,
    },
    /// List registered engines
    List,
}

#[derive(clap::Args, Debug)]
pub(crate) struct CanonCli {
    #[clap(subcommand)]
    pub command: CanonCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CanonCommand {
    /// List Canon engines
    List {
        /// boring, alpha, opportunistic, standby, legacy
        #[clap(long)]
        class: Option<String>,
    },
    /// Show one engine spec
    Show { name: String },
}

#[derive(clap::Args, Debug)]
pub(crate) struct AuditCli {
    #[clap(subcommand)]
    pub command: AuditCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AuditCommand {
    /// Show the most recent audit records
    Tail {
        #[clap(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct ReviewCli {
    #[clap(subcommand)]
    pub command: ReviewCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ReviewCommand {
    /// Weekly checklist and recommendation
    Weekly,
}

#[derive(clap::Args, Debug)]
pub(crate) struct PantheonCli {
    #[clap(subcommand)]
    pub command: PantheonCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PantheonCommand {
    /// Check whether a role may use an agent helper
    Check {
        #[clap(long, default_value = "operator")]
        actor: String,
        /// owner, heimdall, loki, fenrir, observer
        #[clap(long)]
        role: String,
        #[clap(long, value_enum)]
        helper: PantheonHelper,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum PantheonHelper {
    Heimdall,
    Loki,
    Fenrir,
}
