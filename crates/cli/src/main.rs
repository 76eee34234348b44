//! Storefinder CLI - Database migrations and sample data tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! storefinder-cli migrate
//!
//! # Load sample stores (creates the owning account if needed)
//! storefinder-cli seed --file data/stores.json --email demo@example.com --password "..."
//!
//! # Wipe sample data
//! storefinder-cli seed --file data/stores.json --email demo@example.com --password "..." --clear
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "storefinder-cli")]
#[command(author, version, about = "Storefinder CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load sample stores from a JSON file
    Seed {
        /// Path to the JSON file of stores
        #[arg(short, long)]
        file: String,

        /// Email of the account that will own the sample stores
        #[arg(short, long)]
        email: String,

        /// Password for the account, used only if it doesn't exist yet
        #[arg(short, long)]
        password: String,

        /// Delete all stores, reviews, and hearts before loading
        #[arg(long)]
        clear: bool,
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
        Commands::Seed {
            file,
            email,
            password,
            clear,
        } => commands::seed::run(&file, &email, &password, clear).await?,
    }
    Ok(())
}
