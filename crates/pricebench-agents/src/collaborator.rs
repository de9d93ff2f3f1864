//! Abstract contracts for the external collaborators the pipeline delegates
//! to. Everything behind these traits is replaceable: the bundled
//! implementations live in [`crate::llm`], the test doubles in
//! [`crate::test_support`].

use async_trait::async_trait;

use pricebench_models::{
    CandidateListing, ComparableSummary, ComparableVerdict, PivotProduct, PriceStatistics,
    RawRecommendation, SearchStrategy,
};

use crate::error::PipelineError;

/// Turns the raw product input (URL or free text) into a pivot product.
/// The one collaborator whose failure is fatal to a run.
#[async_trait]
pub trait ExtractionCollaborator: Send + Sync {
    async fn extract(&self, product_input: &str) -> Result<PivotProduct, PipelineError>;
}

/// Generates ranked, brand-agnostic search queries for a pivot product.
#[async_trait]
pub trait TermCollaborator: Send + Sync {
    async fn generate_terms(&self, pivot: &PivotProduct) -> Result<SearchStrategy, PipelineError>;
}

/// Fetches candidate listings for one search query, bounded by `limit`.
#[async_trait]
pub trait ScrapeCollaborator: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateListing>, PipelineError>;
}

/// Classifies candidate listings against the pivot. The response may be
/// partial; listings it omits are excluded fail-closed by the filter.
#[async_trait]
pub trait ClassifyCollaborator: Send + Sync {
    async fn classify(
        &self,
        pivot: &PivotProduct,
        listings: &[CandidateListing],
    ) -> Result<Vec<ComparableVerdict>, PipelineError>;
}

/// Reasons about the computed statistics and produces an untrusted price
/// recommendation, validated afterwards by the synthesizer.
#[async_trait]
pub trait ReasonCollaborator: Send + Sync {
    async fn recommend(
        &self,
        statistics: &PriceStatistics,
        summary: &ComparableSummary,
    ) -> Result<RawRecommendation, PipelineError>;
}
