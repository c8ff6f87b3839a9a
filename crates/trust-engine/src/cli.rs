use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "trust-engine", version, about = "Anti-cheat, economy and audit checks over a platform snapshot")]
pub struct Cli {
    /// Path to the runner configuration file
    #[arg(short, long, default_value = "trust-engine.yaml", global = true)]
    pub config: PathBuf,

    /// Path to the engine rule configuration (overrides config file setting)
    #[arg(short, long, global = true)]
    pub engine_config: Option<PathBuf>,

    /// Path of the JSON-lines diagnostic log (overrides config file setting)
    #[arg(long, global = true)]
    pub diagnostic_log: Option<PathBuf>,

    /// Log level filter used when RUST_LOG is unset (overrides config file setting)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Reference instant for date-based rules (defaults to the dataset's asOf, then now)
    #[arg(long, global = true)]
    pub as_of: Option<DateTime<Utc>>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score recent activity and decide each user's shield level
    Shield {
        /// JSON dataset with users and their activity snapshots
        dataset: PathBuf,
    },
    /// Audit every regular user and summarise the population
    Audit { dataset: PathBuf },
    /// Validate all missions and submissions
    ScanActions { dataset: PathBuf },
    /// Validate balances, plan limits, reward and store math, queues
    ScanEconomy { dataset: PathBuf },
    /// Load and validate the engine configuration, then print it
    CheckConfig,
}
