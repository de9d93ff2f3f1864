use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pricebench::snapshot::{MarketSnapshot, SnapshotScraper};
use pricebench_models::PricebenchConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pricebench", about = "Competitor price benchmarking pipeline")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/pricebench.toml")]
    config: String,

    /// Read the product input from a file instead of stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Path to the marketplace snapshot JSON backing the scraper
    #[arg(short, long)]
    snapshot: String,

    /// Override the configured cap on candidate listings
    #[arg(long)]
    max_offers: Option<usize>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config
    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: PricebenchConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse config")?;

    // Read the product input
    let product_input = if let Some(input_path) = &cli.input {
        std::fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read input: {input_path}"))?
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    };
    let product_input = product_input.trim();
    anyhow::ensure!(!product_input.is_empty(), "Product input is empty");

    // Build the pipeline over the snapshot-backed scraper and run it
    let snapshot = MarketSnapshot::load(&cli.snapshot)?;
    let pipeline = pricebench::build_pipeline(&config, Arc::new(SnapshotScraper::new(snapshot)));

    let run = pipeline.analyze(product_input, cli.max_offers).await;

    // Output the run report as JSON to stdout
    let output = if cli.pretty {
        serde_json::to_string_pretty(&run)?
    } else {
        serde_json::to_string(&run)?
    };
    println!("{output}");

    Ok(())
}
