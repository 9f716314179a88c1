//! Shoplist CLI - Database migrations and account maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shoplist-cli migrate
//!
//! # Delete an account with its profile, lists and items
//! shoplist-cli purge-user --username alice_1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `purge-user` - Delete an account and everything it owns

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shoplist-cli")]
#[command(author, version, about = "Shoplist CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Delete an account and everything it owns
    PurgeUser {
        /// Username of the account to delete
        #[arg(short, long)]
        username: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::PurgeUser { username } => commands::user::purge(&username).await?,
    }
    Ok(())
}
