//! CLI module for Vigil
//!
//! Command-line interface definitions and handlers for the gateway
//! health auditor.
//!
//! # Commands
//!
//! - `report` - Generate the health-audit report on stdout
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Audit the last 24 hours from the gateway state directory
//! vigil report --hours 24
//!
//! # Pin the reference instant for a reproducible run
//! vigil report --hours 2 --now 2026-02-07T12:00:00Z
//!
//! # Generate shell completions
//! vigil completions bash > ~/.bash_completion.d/vigil
//! ```

pub mod completions;
pub mod report;

pub use completions::handle_completions;
pub use report::handle_report;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Vigil - deterministic gateway health auditor
#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    about = "Deterministic health-audit report generator for always-on agent gateways"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the health-audit report
    Report(ReportArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// The only supported output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Fixed four-section Markdown document
    Markdown,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Lookback window in hours
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub hours: u32,

    /// Main gateway log (mandatory source)
    #[arg(long, default_value = "logs/gateway.log")]
    pub log: PathBuf,

    /// Gateway error log (mandatory source)
    #[arg(long, default_value = "logs/gateway.err.log")]
    pub err_log: PathBuf,

    /// Anomaly journal, JSON lines (optional source)
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Cron-job registry JSON (optional source)
    #[arg(long)]
    pub cron_registry: Option<PathBuf>,

    /// Gateway configuration JSON (optional source)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Timezone override (else from config, else the fixed fallback)
    #[arg(long, env = "VIGIL_TZ")]
    pub tz: Option<String>,

    /// Reference instant (RFC 3339) for the window cutoff; defaults to the
    /// current time. Pinning it makes a run fully reproducible.
    #[arg(long)]
    pub now: Option<String>,

    /// Failures-in-window at or above which a pair is degraded
    #[arg(long, default_value_t = 3)]
    pub degraded_threshold: u32,

    /// Maximum anomaly-timeline entries before truncation
    #[arg(long, default_value_t = 50)]
    pub max_anomalies: usize,

    /// Schedule jitter tolerated before a cron run counts as missed
    #[arg(long, default_value_t = 10)]
    pub cron_tolerance_minutes: u32,

    /// Hard wall-clock budget for the whole run, in seconds
    #[arg(long, default_value_t = 30)]
    pub budget_seconds: u64,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
