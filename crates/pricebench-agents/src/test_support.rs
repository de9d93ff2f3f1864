//! Deterministic collaborator doubles for exercising pipeline behavior
//! without the Claude CLI.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;

use pricebench_models::{
    CandidateListing, Classification, ComparableSummary, ComparableVerdict, Condition,
    PivotProduct, PriceSample, PriceStatistics, RawRecommendation, SearchStrategy,
};
use pricebench_stats::analyze_prices;

use crate::collaborator::{
    ClassifyCollaborator, ExtractionCollaborator, ReasonCollaborator, ScrapeCollaborator,
    TermCollaborator,
};
use crate::error::PipelineError;

/// A branded 10W speaker pivot used across the test suite.
pub fn sample_pivot() -> PivotProduct {
    PivotProduct {
        source: "Bocina Bluetooth Acme 10W 5 pulgadas".to_string(),
        title: "Bocina Bluetooth Acme 10W".to_string(),
        brand: Some("Acme".to_string()),
        attributes: BTreeMap::from([
            ("power".to_string(), "10W".to_string()),
            ("size".to_string(), "5 inch".to_string()),
        ]),
        condition: Condition::New,
        price: None,
        currency: "MXN".to_string(),
    }
}

pub fn sample_listing(id: &str, price: Decimal) -> CandidateListing {
    CandidateListing {
        listing_id: id.to_string(),
        title: format!("Bocina bluetooth {id}"),
        price,
        currency: "MXN".to_string(),
        condition: Condition::New,
        attributes_text: None,
        permalink: None,
    }
}

/// Statistics over the given listings' prices, as the stats stage would
/// compute them.
pub fn statistics_for(listings: &[CandidateListing]) -> PriceStatistics {
    let samples: Vec<PriceSample> = listings
        .iter()
        .map(|l| PriceSample {
            price: l.price,
            condition: l.condition,
        })
        .collect();
    analyze_prices(&samples)
}

pub struct MockExtractor {
    pivot: Option<PivotProduct>,
    hang: bool,
}

impl MockExtractor {
    pub fn with_pivot(pivot: PivotProduct) -> Self {
        Self {
            pivot: Some(pivot),
            hang: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            pivot: None,
            hang: false,
        }
    }

    /// Never completes; for exercising stage timeouts.
    pub fn hanging() -> Self {
        Self {
            pivot: None,
            hang: true,
        }
    }
}

#[async_trait]
impl ExtractionCollaborator for MockExtractor {
    async fn extract(&self, _product_input: &str) -> Result<PivotProduct, PipelineError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.pivot
            .clone()
            .ok_or_else(|| PipelineError::Extraction("mock extraction failure".to_string()))
    }
}

pub struct MockTermGenerator {
    strategy: Option<SearchStrategy>,
}

impl MockTermGenerator {
    pub fn with_strategy(strategy: SearchStrategy) -> Self {
        Self {
            strategy: Some(strategy),
        }
    }

    pub fn failing() -> Self {
        Self { strategy: None }
    }
}

#[async_trait]
impl TermCollaborator for MockTermGenerator {
    async fn generate_terms(&self, _pivot: &PivotProduct) -> Result<SearchStrategy, PipelineError> {
        self.strategy
            .clone()
            .ok_or_else(|| PipelineError::TermGeneration("mock term failure".to_string()))
    }
}

#[derive(Default)]
pub struct MockScraper {
    results: HashMap<String, Vec<CandidateListing>>,
    failing: HashSet<String>,
    hang: bool,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never completes a search; for exercising stage timeouts and the run
    /// deadline.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn with_results(mut self, query: &str, listings: Vec<CandidateListing>) -> Self {
        self.results.insert(query.to_string(), listings);
        self
    }

    pub fn failing_for(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }
}

#[async_trait]
impl ScrapeCollaborator for MockScraper {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateListing>, PipelineError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(query) {
            return Err(PipelineError::Scrape(format!("mock failure for {query:?}")));
        }
        let mut listings = self.results.get(query).cloned().unwrap_or_default();
        listings.truncate(limit);
        Ok(listings)
    }
}

#[derive(Default)]
pub struct MockClassifier {
    verdicts: Vec<(String, Classification)>,
    omitted: HashSet<String>,
    failing_ids: HashSet<String>,
    fail: bool,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verdict(mut self, listing_id: &str, classification: Classification) -> Self {
        self.verdicts
            .push((listing_id.to_string(), classification));
        self
    }

    /// Configure the mock to return no verdict for this listing.
    pub fn omit(mut self, listing_id: &str) -> Self {
        self.omitted.insert(listing_id.to_string());
        self
    }

    pub fn always_fail(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Fail any batch containing this listing; other batches still classify.
    pub fn failing_on(mut self, listing_id: &str) -> Self {
        self.failing_ids.insert(listing_id.to_string());
        self
    }
}

#[async_trait]
impl ClassifyCollaborator for MockClassifier {
    async fn classify(
        &self,
        _pivot: &PivotProduct,
        listings: &[CandidateListing],
    ) -> Result<Vec<ComparableVerdict>, PipelineError> {
        if self.fail
            || listings
                .iter()
                .any(|l| self.failing_ids.contains(&l.listing_id))
        {
            return Err(PipelineError::Classification(
                "mock classification failure".to_string(),
            ));
        }
        Ok(self
            .verdicts
            .iter()
            .filter(|(id, _)| !self.omitted.contains(id))
            .map(|(id, classification)| ComparableVerdict {
                listing_id: id.clone(),
                classification: *classification,
                confidence: None,
                reason: "mock".to_string(),
            })
            .collect())
    }
}

pub struct MockReasoner {
    recommendation: Option<RawRecommendation>,
}

impl MockReasoner {
    pub fn with_recommendation(recommendation: RawRecommendation) -> Self {
        Self {
            recommendation: Some(recommendation),
        }
    }

    pub fn failing() -> Self {
        Self {
            recommendation: None,
        }
    }
}

#[async_trait]
impl ReasonCollaborator for MockReasoner {
    async fn recommend(
        &self,
        _statistics: &PriceStatistics,
        _summary: &ComparableSummary,
    ) -> Result<RawRecommendation, PipelineError> {
        self.recommendation
            .clone()
            .ok_or_else(|| PipelineError::Reasoning("mock reasoning failure".to_string()))
    }
}
