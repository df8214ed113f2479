use std::io::Read;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use outsweep_models::catalog::CatalogEntry;
use outsweep_models::config::OutsweepConfig;
use outsweep_models::outbound::OutboundOffer;
use outsweep_store::SqliteStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "outsweep", about = "Outbound trade sweeper - one-shot tools")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/outsweep.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one outbound against the stored catalog and print the verdict
    Evaluate {
        /// Outbound JSON file (stdin when omitted)
        #[arg(long)]
        offer: Option<String>,

        /// JSON array of owned uaids
        #[arg(long)]
        inventory: String,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Upsert catalog entries from a JSON array
    ImportCatalog {
        #[arg(short, long)]
        input: String,
    },
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read input: {path}")),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: OutsweepConfig = toml::from_str(&config_str).with_context(|| "Failed to parse config")?;
    config.validate().with_context(|| "Invalid config")?;

    let mut store = SqliteStore::open(&config.store.sqlite_path)
        .with_context(|| format!("Failed to open store: {}", config.store.sqlite_path))?;

    match cli.command {
        Command::Evaluate {
            offer,
            inventory,
            pretty,
        } => {
            let offer: OutboundOffer = serde_json::from_str(&read_input(offer.as_deref())?)
                .context("Failed to parse outbound JSON")?;
            let owned: Vec<u64> = serde_json::from_str(&read_input(Some(inventory.as_str()))?)
                .context("Failed to parse inventory JSON")?;

            let catalog = store.load_catalog().context("Failed to load catalog")?;
            let evaluation = outsweep::evaluate_offer(&config, &catalog, &offer, owned, Utc::now())
                .map_err(|e| anyhow::anyhow!("Evaluation failed: {e}"))?;

            let output = if pretty {
                serde_json::to_string_pretty(&evaluation)?
            } else {
                serde_json::to_string(&evaluation)?
            };
            println!("{output}");
        }
        Command::ImportCatalog { input } => {
            let entries: Vec<CatalogEntry> = serde_json::from_str(&read_input(Some(input.as_str()))?)
                .context("Failed to parse catalog JSON")?;
            let written = outsweep::import_catalog(&mut store, &entries).context("Catalog import failed")?;
            println!("{written}");
        }
    }

    Ok(())
}
