//! A scrape collaborator backed by a marketplace snapshot file.
//!
//! The snapshot is a JSON object mapping search queries to the listings
//! they returned, captured ahead of time. Queries with no exact entry fall
//! back to token matching against listing titles, so fallback queries the
//! capture never saw still find plausible results.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use pricebench_agents::{PipelineError, ScrapeCollaborator};
use pricebench_models::CandidateListing;

#[derive(Debug, Clone, Deserialize)]
pub struct MarketSnapshot {
    /// Listings keyed by the query that returned them.
    pub queries: BTreeMap<String, Vec<CandidateListing>>,
}

impl MarketSnapshot {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("Failed to parse snapshot JSON")
    }

    fn all_listings(&self) -> impl Iterator<Item = &CandidateListing> {
        self.queries.values().flatten()
    }
}

pub struct SnapshotScraper {
    snapshot: MarketSnapshot,
}

impl SnapshotScraper {
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ScrapeCollaborator for SnapshotScraper {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateListing>, PipelineError> {
        if let Some(listings) = self.snapshot.queries.get(query) {
            let mut listings = listings.clone();
            listings.truncate(limit);
            return Ok(listings);
        }

        // Fallback: every query token must appear in the listing title.
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = std::collections::HashSet::new();
        let mut matched = Vec::new();
        for listing in self.snapshot.all_listings() {
            let title = listing.title.to_lowercase();
            if tokens.iter().all(|t| title.contains(t.as_str()))
                && seen.insert(listing.listing_id.clone())
            {
                matched.push(listing.clone());
                if matched.len() >= limit {
                    break;
                }
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> MarketSnapshot {
        let raw = serde_json::json!({
            "queries": {
                "bocina bluetooth 10w": [
                    {"listing_id": "a", "title": "Bocina Bluetooth 10W negra",
                     "price": "599.00", "currency": "MXN", "condition": "new"},
                    {"listing_id": "b", "title": "Bocina Bluetooth 10W blanca",
                     "price": "649.00", "currency": "MXN", "condition": "new"}
                ],
                "bocina portatil": [
                    {"listing_id": "c", "title": "Bocina portatil 10w recargable",
                     "price": "699.00", "currency": "MXN", "condition": "used"}
                ]
            }
        });
        MarketSnapshot::from_json_str(&raw.to_string()).unwrap()
    }

    #[tokio::test]
    async fn exact_query_hit() {
        let scraper = SnapshotScraper::new(snapshot());
        let listings = scraper.search("bocina bluetooth 10w", 25).await.unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].listing_id, "a");
        assert_eq!(listings[0].price, dec!(599.00));
    }

    #[tokio::test]
    async fn token_fallback_matches_across_queries() {
        let scraper = SnapshotScraper::new(snapshot());
        let listings = scraper.search("bocina 10w", 25).await.unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn unknown_query_returns_empty() {
        let scraper = SnapshotScraper::new(snapshot());
        let listings = scraper.search("lavadora 18kg", 25).await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn limit_applies_to_both_paths() {
        let scraper = SnapshotScraper::new(snapshot());
        assert_eq!(
            scraper.search("bocina bluetooth 10w", 1).await.unwrap().len(),
            1
        );
        assert_eq!(scraper.search("bocina", 2).await.unwrap().len(), 2);
    }
}
