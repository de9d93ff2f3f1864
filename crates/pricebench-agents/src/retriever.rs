//! Listing retrieval (stage 2).
//!
//! Runs the strategy's queries against the scrape collaborator, a bounded
//! number at a time, and merges the results in query-rank order so dedup
//! and cap truncation are deterministic across runs.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use pricebench_models::{CandidateListing, SearchStrategy};

use crate::collaborator::ScrapeCollaborator;

/// What retrieval produced: merged listings plus per-query failures that
/// were absorbed along the way.
#[derive(Debug, Default)]
pub struct RetrievalOutcome {
    pub listings: Vec<CandidateListing>,
    pub query_errors: Vec<String>,
}

impl RetrievalOutcome {
    /// True when every query failed and nothing came back.
    pub fn is_total_failure(&self) -> bool {
        self.listings.is_empty() && !self.query_errors.is_empty()
    }
}

pub struct ListingRetriever {
    scraper: Arc<dyn ScrapeCollaborator>,
    concurrency: usize,
}

impl ListingRetriever {
    pub fn new(scraper: Arc<dyn ScrapeCollaborator>, concurrency: usize) -> Self {
        Self {
            scraper,
            concurrency: concurrency.max(1),
        }
    }

    /// Run every query in the strategy, dedup by listing id (first query to
    /// return a listing wins), and cap the merged result at `max_offers`.
    pub async fn retrieve(&self, strategy: &SearchStrategy, max_offers: usize) -> RetrievalOutcome {
        let queries: Vec<String> = strategy.ranked_queries().map(str::to_string).collect();
        let mut outcome = RetrievalOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();

        for chunk in queries.chunks(self.concurrency) {
            let mut handles = Vec::with_capacity(chunk.len());
            for query in chunk {
                let scraper = Arc::clone(&self.scraper);
                let query = query.clone();
                handles.push(tokio::spawn(async move {
                    let result = scraper.search(&query, max_offers).await;
                    (query, result)
                }));
            }

            // Consume in spawn order so merging stays rank-stable.
            for handle in handles {
                let (query, result) = match handle.await {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "Scrape task panicked");
                        outcome.query_errors.push(format!("scrape task failed: {e}"));
                        continue;
                    }
                };
                match result {
                    Ok(listings) => {
                        debug!(query = %query, count = listings.len(), "Query returned listings");
                        for listing in listings {
                            if listing.price.is_sign_negative() {
                                warn!(
                                    listing_id = %listing.listing_id,
                                    "Dropping listing with negative price"
                                );
                                continue;
                            }
                            if seen.insert(listing.listing_id.clone()) {
                                outcome.listings.push(listing);
                            }
                        }
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "Query failed");
                        outcome.query_errors.push(format!("query {query:?}: {e}"));
                    }
                }
            }

            if outcome.listings.len() >= max_offers {
                break;
            }
        }

        outcome.listings.truncate(max_offers);
        info!(
            listings = outcome.listings.len(),
            failed_queries = outcome.query_errors.len(),
            "Retrieval complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_listing, MockScraper};
    use rust_decimal_macros::dec;

    fn strategy(primary: &str, fallbacks: &[&str]) -> SearchStrategy {
        SearchStrategy {
            primary_query: primary.to_string(),
            fallback_queries: fallbacks.iter().map(|s| s.to_string()).collect(),
            reasoning: String::new(),
        }
    }

    #[tokio::test]
    async fn merges_in_rank_order_and_dedups() {
        let scraper = MockScraper::new()
            .with_results(
                "q1",
                vec![sample_listing("a", dec!(100)), sample_listing("b", dec!(110))],
            )
            .with_results(
                "q2",
                vec![sample_listing("b", dec!(115)), sample_listing("c", dec!(120))],
            );
        let retriever = ListingRetriever::new(Arc::new(scraper), 1);
        let outcome = retriever.retrieve(&strategy("q1", &["q2"]), 25).await;
        let ids: Vec<&str> = outcome
            .listings
            .iter()
            .map(|l| l.listing_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // The first-seen copy of "b" wins.
        assert_eq!(outcome.listings[1].price, dec!(110));
    }

    #[tokio::test]
    async fn caps_at_max_offers() {
        let scraper = MockScraper::new().with_results(
            "q1",
            (0..10)
                .map(|i| sample_listing(&format!("l{i}"), dec!(100)))
                .collect(),
        );
        let retriever = ListingRetriever::new(Arc::new(scraper), 2);
        let outcome = retriever.retrieve(&strategy("q1", &[]), 4).await;
        assert_eq!(outcome.listings.len(), 4);
        assert_eq!(outcome.listings[0].listing_id, "l0");
    }

    #[tokio::test]
    async fn absorbs_per_query_failures() {
        let scraper = MockScraper::new()
            .failing_for("q1")
            .with_results("q2", vec![sample_listing("a", dec!(100))]);
        let retriever = ListingRetriever::new(Arc::new(scraper), 2);
        let outcome = retriever.retrieve(&strategy("q1", &["q2"]), 25).await;
        assert_eq!(outcome.listings.len(), 1);
        assert_eq!(outcome.query_errors.len(), 1);
        assert!(!outcome.is_total_failure());
    }

    #[tokio::test]
    async fn reports_total_failure() {
        let scraper = MockScraper::new().failing_for("q1").failing_for("q2");
        let retriever = ListingRetriever::new(Arc::new(scraper), 2);
        let outcome = retriever.retrieve(&strategy("q1", &["q2"]), 25).await;
        assert!(outcome.is_total_failure());
        assert_eq!(outcome.query_errors.len(), 2);
    }

    #[tokio::test]
    async fn drops_negative_prices() {
        let scraper = MockScraper::new().with_results(
            "q1",
            vec![sample_listing("a", dec!(-5)), sample_listing("b", dec!(50))],
        );
        let retriever = ListingRetriever::new(Arc::new(scraper), 1);
        let outcome = retriever.retrieve(&strategy("q1", &[]), 25).await;
        assert_eq!(outcome.listings.len(), 1);
        assert_eq!(outcome.listings[0].listing_id, "b");
    }
}
