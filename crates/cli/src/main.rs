//! Wishlist CLI - Inspect and edit the remote wishlist of a session.
//!
//! # Usage
//!
//! ```bash
//! # Fetch (or create) the wishlist and print it
//! wishlist show
//!
//! # Add a product at a given price
//! wishlist add PROD123 --name "Pineapple Tee" --price 24.99
//!
//! # Print the total
//! wishlist total
//!
//! # Re-fetch after switching currency
//! wishlist refresh --currency EUR --symbol €
//!
//! # Print every change until Ctrl+C, refreshing every minute
//! wishlist watch --interval 60
//! ```
//!
//! # Environment Variables
//!
//! See `wishlist_sync::config`. Logs go to stderr and honor `RUST_LOG`;
//! stdout carries JSON only.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use wishlist_sync::{SyncConfig, WishlistSession};

mod commands;

const DEFAULT_LOG_FILTER: &str = "wishlist_sync=info,wishlist_cli=info";

#[derive(Parser)]
#[command(name = "wishlist")]
#[command(author, version, about = "Wishlist session tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch or create the wishlist and print it
    Show,
    /// Add a product to the wishlist
    Add {
        /// Catalog product id, plain or composite (`namespace;id`)
        product: String,

        /// Display name stored with the item
        #[arg(short, long)]
        name: Option<String>,

        /// Unit price in the configured currency
        #[arg(short, long)]
        price: Option<Decimal>,

        /// Free-text note
        #[arg(long)]
        note: Option<String>,
    },
    /// Print the total price
    Total,
    /// Re-fetch and re-enrich the wishlist
    Refresh {
        /// Currency id to price items in
        #[arg(long)]
        currency: Option<String>,

        /// Symbol of `--currency`
        #[arg(long, requires = "currency")]
        symbol: Option<String>,
    },
    /// Print every wishlist update until interrupted
    Watch {
        /// Seconds between refreshes; no refresh when omitted
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Reset the local session and print the empty wishlist
    Reset,
}

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SyncConfig::from_env()?;
    let session = WishlistSession::from_config(&config)?;

    match cli.command {
        Commands::Show => commands::wishlist::show(&session).await?,
        Commands::Add {
            product,
            name,
            price,
            note,
        } => commands::wishlist::add(&session, &product, name, price, note).await?,
        Commands::Total => commands::wishlist::total(&session).await?,
        Commands::Refresh { currency, symbol } => {
            commands::wishlist::refresh(&session, currency, symbol).await?;
        }
        Commands::Watch { interval } => commands::watch::run(&session, interval).await?,
        Commands::Reset => commands::wishlist::reset(&session)?,
    }
    Ok(())
}
