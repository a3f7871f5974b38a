use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "orchestra-ops")]
#[command(about = "Collects and executes backend operations for model changes")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "orchestra.toml", global = true)]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output", global = true)]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Replay the model changes of one request and execute the resulting operations
    Replay {
        /// Path to the scenario file
        #[arg(short, long)]
        scenario: String,

        /// Print scripts instead of running them
        #[arg(long)]
        dry_run: bool,
    },
    /// Compute the billing point and chunks of a service's orders
    Chunks {
        /// Path to the orders file
        #[arg(short, long)]
        orders: String,

        /// Service name as configured in [[services]]
        #[arg(short, long)]
        service: String,

        /// Start of the billing window (defaults to today)
        #[arg(long)]
        from: Option<NaiveDate>,
    },
}
