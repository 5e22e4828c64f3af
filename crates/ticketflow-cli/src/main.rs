mod cmd;
mod output;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cmd::{status::StatusSubcommand, workflow::WorkflowSubcommand};
use std::path::PathBuf;
use ticketflow_core::dataset::Dataset;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ticketflow",
    about = "Status workflow graphs and the SLA clock engine for support tickets",
    version,
    propagate_version = true
)]
struct Cli {
    /// Dataset file holding statuses, workflows, and tickets
    #[arg(long, global = true, env = "TICKETFLOW_DATA", default_value = "ticketflow.yaml")]
    data: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the status catalog
    Status {
        #[command(subcommand)]
        subcmd: StatusSubcommand,
    },

    /// Inspect and validate workflow graphs
    Workflow {
        #[command(subcommand)]
        subcmd: WorkflowSubcommand,
    },

    /// Evaluate one ticket's SLA clock and tier split
    Evaluate {
        ticket_id: String,
        /// Reference instant (RFC 3339); defaults to now
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },

    /// Aggregate breach verdicts over the whole ticket population
    Report {
        /// Reference instant (RFC 3339); defaults to now
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dataset = Dataset::load(&cli.data)
        .with_context(|| format!("failed to load dataset {}", cli.data.display()))?;

    match cli.command {
        Commands::Status { subcmd } => cmd::status::run(&dataset, subcmd, cli.json),
        Commands::Workflow { subcmd } => cmd::workflow::run(dataset, subcmd, cli.json),
        Commands::Evaluate { ticket_id, as_of } => {
            cmd::evaluate::run(&dataset, &ticket_id, as_of.unwrap_or_else(Utc::now), cli.json)
        }
        Commands::Report { as_of } => {
            cmd::report::run(&dataset, as_of.unwrap_or_else(Utc::now), cli.json)
        }
    }
}
