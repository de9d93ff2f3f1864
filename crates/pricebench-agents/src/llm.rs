//! Claude-CLI-backed implementations of the collaborator contracts.
//!
//! These are deliberately thin: serialize the request, invoke the CLI,
//! parse the response. Retry and backoff policy belongs to callers outside
//! the core, which only distinguishes succeeded / partial / failed.

use async_trait::async_trait;

use pricebench_models::{
    CandidateListing, ComparableSummary, ComparableVerdict, PivotProduct, PriceStatistics,
    RawRecommendation, SearchStrategy,
};

use crate::claude::{invoke_claude, ClaudeCliConfig, CliError};
use crate::collaborator::{
    ClassifyCollaborator, ExtractionCollaborator, ReasonCollaborator, TermCollaborator,
};
use crate::error::PipelineError;
use crate::parser;
use crate::prompts;

/// CLI timeouts keep their own variant; everything else folds into the
/// stage's error class.
fn map_cli_error(e: CliError, stage: fn(String) -> PipelineError) -> PipelineError {
    match e {
        CliError::Timeout(secs) => PipelineError::Timeout(secs),
        other => stage(other.to_string()),
    }
}

pub struct ClaudeExtractor {
    pub cli_config: ClaudeCliConfig,
}

#[async_trait]
impl ExtractionCollaborator for ClaudeExtractor {
    async fn extract(&self, product_input: &str) -> Result<PivotProduct, PipelineError> {
        let raw = invoke_claude(
            &prompts::extraction_system_prompt(),
            product_input,
            &self.cli_config,
        )
        .await
        .map_err(|e| map_cli_error(e, PipelineError::Extraction))?;
        parser::parse_pivot(&raw, product_input)
            .map_err(|e| PipelineError::Extraction(e.to_string()))
    }
}

pub struct ClaudeTermGenerator {
    pub cli_config: ClaudeCliConfig,
}

#[async_trait]
impl TermCollaborator for ClaudeTermGenerator {
    async fn generate_terms(&self, pivot: &PivotProduct) -> Result<SearchStrategy, PipelineError> {
        let user_prompt = serde_json::to_string_pretty(pivot)?;
        let raw = invoke_claude(&prompts::term_system_prompt(), &user_prompt, &self.cli_config)
            .await
            .map_err(|e| map_cli_error(e, PipelineError::TermGeneration))?;
        parser::parse_strategy(&raw).map_err(|e| PipelineError::TermGeneration(e.to_string()))
    }
}

pub struct ClaudeClassifier {
    pub cli_config: ClaudeCliConfig,
}

#[async_trait]
impl ClassifyCollaborator for ClaudeClassifier {
    async fn classify(
        &self,
        pivot: &PivotProduct,
        listings: &[CandidateListing],
    ) -> Result<Vec<ComparableVerdict>, PipelineError> {
        let user_prompt = serde_json::to_string_pretty(&serde_json::json!({
            "pivot": pivot,
            "offers": listings,
        }))?;
        let raw = invoke_claude(
            &prompts::classify_system_prompt(),
            &user_prompt,
            &self.cli_config,
        )
        .await
        .map_err(|e| map_cli_error(e, PipelineError::Classification))?;
        parser::parse_verdicts(&raw).map_err(|e| PipelineError::Classification(e.to_string()))
    }
}

pub struct ClaudeReasoner {
    pub cli_config: ClaudeCliConfig,
}

#[async_trait]
impl ReasonCollaborator for ClaudeReasoner {
    async fn recommend(
        &self,
        statistics: &PriceStatistics,
        summary: &ComparableSummary,
    ) -> Result<RawRecommendation, PipelineError> {
        let user_prompt = serde_json::to_string_pretty(&serde_json::json!({
            "statistics": statistics,
            "comparables": summary,
        }))?;
        let raw = invoke_claude(
            &prompts::recommend_system_prompt(),
            &user_prompt,
            &self.cli_config,
        )
        .await
        .map_err(|e| map_cli_error(e, PipelineError::Reasoning))?;
        parser::parse_recommendation(&raw).map_err(|e| PipelineError::Reasoning(e.to_string()))
    }
}
