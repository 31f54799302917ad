use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::correlate::EntityCategory;

#[derive(Parser)]
#[command(name = "dragnet")]
#[command(author, version, about = "Concurrent probe orchestration and correlation engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to dragnet.toml (default: ./dragnet.toml)
    #[arg(long, global = true, env = "DRAGNET_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Output format for CLI results.
/// - Text: Human-readable text output (default)
/// - Json: Single JSON object at completion
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single scan against one target
    Scan {
        /// Target identifier (name, email, handle, ...)
        target: String,

        /// Path to a TOML scan plan describing phases and probes
        #[arg(long, default_value = "scan_plan.toml")]
        plan: PathBuf,

        /// Per-probe deadline in seconds (0 = no deadline)
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Maximum probes running at once
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Persist the fused report to the report directory
        #[arg(long)]
        save: bool,
    },

    /// Validate a single value against one entity category
    Check {
        /// Value to validate
        value: String,

        /// Entity category to validate against
        #[arg(long, value_enum, default_value = "email")]
        category: CategoryArg,
    },

    /// Inspect stored reports
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Run a multi-target investigation and wait for it to settle
    Investigate {
        /// Target identifiers
        #[arg(required = true)]
        targets: Vec<String>,

        /// Path to a TOML scan plan describing phases and probes
        #[arg(long, default_value = "scan_plan.toml")]
        plan: PathBuf,

        /// Scan type label carried on the investigation
        #[arg(long, default_value = "comprehensive")]
        scan_type: String,

        /// Depth label carried on the investigation
        #[arg(long, default_value = "deep")]
        depth: String,
    },
}

#[derive(Subcommand)]
pub enum ReportAction {
    /// List stored report files, newest first
    List,
    /// Show one stored report
    Show {
        /// Path to the report file
        path: PathBuf,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CategoryArg {
    Phone,
    Email,
    Social,
}

impl From<CategoryArg> for EntityCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Phone => Self::Phone,
            CategoryArg::Email => Self::Email,
            CategoryArg::Social => Self::SocialHandle,
        }
    }
}
