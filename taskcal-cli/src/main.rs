mod airtable;
mod commands;
mod config;
mod gcal;
mod http;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskcal")]
#[command(about = "Reconcile task records in Airtable with Google Calendar events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full reconciliation pass (today scheduling, then deadlines)
    Sync,
    /// Show which records would change, without writing anything
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync => commands::sync::run().await,
        Commands::Status => commands::status::run().await,
    }
}
