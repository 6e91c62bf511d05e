use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use cli::accounts::AccountsCommands;

#[derive(Parser)]
#[command(name = "gcal-accounts")]
#[command(about = "Manage Google Calendar accounts for gcal (read-only access)")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Accounts(AccountsCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    gcal_cli::logging::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Accounts(cmd) => cmd.execute().await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
