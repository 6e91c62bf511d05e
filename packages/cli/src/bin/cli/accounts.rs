// ABOUTME: CLI commands for managing authorized Google Calendar accounts
// ABOUTME: add (interactive OAuth), remove, list, and status

use anyhow::Context;
use clap::Subcommand;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use gcal_auth::{AccountManager, AccountStatus, AuthError};

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add an account and authorize it in the browser (e.g. 'personal' or 'work')
    Add {
        /// Account name
        name: String,

        /// Re-authorize even if the account already exists
        #[arg(long)]
        force: bool,
    },

    /// Remove a configured account and its token
    Remove {
        /// Account name
        name: String,
    },

    /// List configured accounts
    List,

    /// Show token status for every configured account
    Status,
}

impl AccountsCommands {
    pub async fn execute(self) -> anyhow::Result<()> {
        let manager = gcal_cli::account_manager_from_env()
            .context("Failed to load gcal configuration")?;

        match self {
            Self::Add { name, force } => add_command(&manager, &name, force).await,
            Self::Remove { name } => remove_command(&manager, &name),
            Self::List => list_command(&manager),
            Self::Status => status_command(&manager),
        }
    }
}

async fn add_command(manager: &AccountManager, name: &str, force: bool) -> anyhow::Result<()> {
    match manager.add_account(name, force).await {
        Ok(account) => {
            println!(
                "\n{} Account '{}' configured successfully!",
                "✓".green().bold(),
                name.bold()
            );
            if let Some(email) = account.email {
                println!("   Email: {}", email);
            }
            Ok(())
        }
        Err(e @ AuthError::IdentityLookup(_)) => {
            eprintln!(
                "{} Account '{}' was authorized but its email could not be resolved",
                "⚠".yellow().bold(),
                name
            );
            Err(e.into())
        }
        Err(e @ AuthError::AccountExists(_)) => Err(anyhow::anyhow!(
            "{}. Use --force to re-authorize it.",
            e
        )),
        Err(e) => Err(anyhow::Error::new(e).context("OAuth flow failed")),
    }
}

fn remove_command(manager: &AccountManager, name: &str) -> anyhow::Result<()> {
    manager
        .remove_account(name)
        .context("Failed to remove account")?;
    println!("{} Account '{}' removed successfully!", "✓".green().bold(), name);
    Ok(())
}

fn list_command(manager: &AccountManager) -> anyhow::Result<()> {
    let accounts = manager.list_accounts()?;

    if accounts.is_empty() {
        println!("No accounts configured. Use 'gcal-accounts add <name>' to add one.");
        return Ok(());
    }

    println!("Configured accounts:");
    for account in accounts {
        match account.email {
            Some(email) => println!("  - {} ({})", account.name, email),
            None => println!("  - {}", account.name),
        }
    }
    Ok(())
}

fn status_command(manager: &AccountManager) -> anyhow::Result<()> {
    let statuses = manager.status()?;

    if statuses.is_empty() {
        println!("No accounts configured. Use 'gcal-accounts add <name>' to add one.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Account", "Email", "Status"]);

    for status in &statuses {
        table.add_row(vec![
            status.name.clone(),
            status.email.clone().unwrap_or_else(|| "-".to_string()),
            status_label(status).to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn status_label(status: &AccountStatus) -> &'static str {
    match (status.has_token, status.expired, status.refreshable) {
        (false, _, _) => "✗ Not authorized",
        (true, false, _) => "✓ Authorized",
        (true, true, true) => "✓ Authorized (refresh on next use)",
        (true, true, false) => "✗ Expired, run add --force",
    }
}
