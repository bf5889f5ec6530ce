//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// AutoEvolver - turn an objective into a tree of actionable tasks
#[derive(Parser)]
#[command(
    name = "ae",
    about = "Judge an objective's feasibility and decompose it into classified tasks",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive session: objective, feasibility, decomposition
    Run,

    /// Decompose an objective without prompting
    Plan {
        /// The objective to decompose
        objective: String,

        /// Context constraining the objective
        #[arg(short = 'x', long, default_value = "")]
        context: String,

        /// Skip the feasibility check
        #[arg(long)]
        skip_feasibility: bool,

        /// Bound on subdivision passes (overrides config)
        #[arg(short, long)]
        max_passes: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Free conversation with the oracle
    Chat,

    /// Show saved session logs
    Logs {
        /// List log files instead of showing one
        #[arg(long)]
        list: bool,

        /// Log file to show (defaults to the latest)
        file: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

/// Output format for `plan`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Where tracing output is written
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autoevolver")
        .join("logs")
        .join("autoevolver.log")
}
