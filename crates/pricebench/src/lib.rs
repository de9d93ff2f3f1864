//! pricebench - competitor price benchmarking for marketplace listings
//!
//! Given a product description or page excerpt, pricebench extracts a pivot
//! product, derives brand-agnostic search terms, gathers comparable
//! listings, computes robust price statistics, and produces a price
//! recommendation with a full per-stage audit report.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pricebench::models::PricebenchConfig;
//! use pricebench::snapshot::{MarketSnapshot, SnapshotScraper};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = PricebenchConfig::default();
//! let snapshot = MarketSnapshot::load("snapshot.json")?;
//! let pipeline = pricebench::build_pipeline(&config, Arc::new(SnapshotScraper::new(snapshot)));
//! let run = pipeline.analyze("Bocina Bluetooth Acme 10W", None).await;
//! println!("{}", serde_json::to_string_pretty(&run)?);
//! # Ok(())
//! # }
//! ```

pub use pricebench_agents as agents;
pub use pricebench_models as models;
pub use pricebench_stats as stats;

pub mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use pricebench_agents::{
    ClaudeClassifier, ClaudeCliConfig, ClaudeExtractor, ClaudeReasoner, ClaudeTermGenerator,
    Pipeline, ScrapeCollaborator,
};
use pricebench_models::PricebenchConfig;

/// Build a pipeline from configuration, with Claude-CLI collaborators for
/// every seam except scraping, which the caller supplies.
pub fn build_pipeline(config: &PricebenchConfig, scraper: Arc<dyn ScrapeCollaborator>) -> Pipeline {
    let timeout = Duration::from_secs(config.llm.timeout_seconds);
    let cli_config = ClaudeCliConfig {
        model: config.llm.model.clone(),
        timeout,
    };
    let extraction_config = ClaudeCliConfig {
        model: config
            .llm
            .extraction_model
            .clone()
            .unwrap_or_else(|| config.llm.model.clone()),
        timeout,
    };

    Pipeline::new(
        Arc::new(ClaudeExtractor {
            cli_config: extraction_config,
        }),
        Arc::new(ClaudeTermGenerator {
            cli_config: cli_config.clone(),
        }),
        scraper,
        Arc::new(ClaudeClassifier {
            cli_config: cli_config.clone(),
        }),
        Arc::new(ClaudeReasoner { cli_config }),
        config.pipeline.clone(),
    )
}
