//! Realm Wear CLI - wishlist and catalog inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # One-shot reconciled wishlist count for a user
//! rw-cli count -e shopper@example.com
//!
//! # Keep watching the badge count (poll + change notifications)
//! rw-cli count -e shopper@example.com --watch
//!
//! # List the product catalog
//! rw-cli products
//! ```
//!
//! # Environment Variables
//!
//! - `REALM_API_BASE_URL` - Backend REST API base URL
//! - `REALM_BEARER_TOKEN` - Bearer credential for authenticated endpoints
//! - `REALM_CACHE_PATH` - Durable wishlist cache file
//!
//! # Commands
//!
//! - `count` - Reconciled wishlist count (remote preferred, cache fallback)
//! - `products` - Product catalog listing

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)] // command output goes to stdout by design

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rw-cli")]
#[command(author, version, about = "Realm Wear CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the reconciled wishlist count for a user
    Count {
        /// User email (the wishlist cache key)
        #[arg(short, long)]
        email: String,

        /// Bearer credential; defaults to `REALM_BEARER_TOKEN`
        #[arg(short, long)]
        token: Option<String>,

        /// Keep watching: refresh on the configured poll interval
        #[arg(short, long)]
        watch: bool,
    },
    /// List the product catalog
    Products,
}

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter; default to info for our crates
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "realm_wear=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Count {
            email,
            token,
            watch,
        } => commands::count::run(&email, token, watch).await?,
        Commands::Products => commands::products::run().await?,
    }
    Ok(())
}
