use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::listing::{CandidateListing, ComparableVerdict};
use crate::pivot::PivotProduct;
use crate::recommendation::PriceRecommendation;
use crate::search::SearchStrategy;
use crate::statistics::PriceStatistics;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    DeriveSearch,
    Retrieve,
    Filter,
    Stats,
    Recommend,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Extract,
        Stage::DeriveSearch,
        Stage::Retrieve,
        Stage::Filter,
        Stage::Stats,
        Stage::Recommend,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::DeriveSearch => "derive_search",
            Stage::Retrieve => "retrieve",
            Stage::Filter => "filter",
            Stage::Stats => "stats",
            Stage::Recommend => "recommend",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Succeeded,
    /// The stage failed or timed out but the pipeline continued degraded.
    Failed,
    /// The stage never ran (fatal extraction failure or spent deadline).
    Skipped,
}

/// Audit record for one stage of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed_ms: u64,
    /// Collaborator or timeout error observed at this stage, if any.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The pipeline ran to the end, possibly degraded.
    Done,
    /// The pivot product could not be identified; nothing downstream ran.
    Failed,
}

/// The complete, finalized output of one pipeline run.
///
/// The `pivot_product`, `search_strategy`, `statistics` and
/// `final_recommendation` field names are the documented export shape and
/// must stay stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineRun {
    pub id: Uuid,
    pub schema_version: u32,
    pub product_input: String,
    pub max_offers: usize,
    pub started_at: DateTime<Utc>,
    pub status: RunStatus,
    pub pivot_product: Option<PivotProduct>,
    pub search_strategy: Option<SearchStrategy>,
    /// Deduplicated candidate listings after the retrieve stage.
    pub listings: Vec<CandidateListing>,
    /// Exactly one verdict per listing; missing collaborator verdicts are
    /// synthesized as irrelevant.
    pub verdicts: Vec<ComparableVerdict>,
    pub statistics: Option<PriceStatistics>,
    pub final_recommendation: Option<PriceRecommendation>,
    pub stages: Vec<StageReport>,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl PipelineRun {
    /// A fresh run record with every stage pending.
    pub fn new(product_input: &str, max_offers: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            schema_version: REPORT_SCHEMA_VERSION,
            product_input: product_input.to_string(),
            max_offers,
            started_at: Utc::now(),
            status: RunStatus::Done,
            pivot_product: None,
            search_strategy: None,
            listings: Vec::new(),
            verdicts: Vec::new(),
            statistics: None,
            final_recommendation: None,
            stages: Stage::ALL
                .iter()
                .map(|stage| StageReport {
                    stage: *stage,
                    status: StageStatus::Pending,
                    elapsed_ms: 0,
                    error: None,
                })
                .collect(),
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn stage_mut(&mut self, stage: Stage) -> &mut StageReport {
        // Stage::ALL seeds one report per stage, so the lookup always hits.
        self.stages
            .iter_mut()
            .find(|report| report.stage == stage)
            .unwrap_or_else(|| unreachable!("stage report missing: {}", stage.name()))
    }

    pub fn stage_status(&self, stage: Stage) -> StageStatus {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| report.status)
            .unwrap_or(StageStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_has_all_stages_pending() {
        let run = PipelineRun::new("Bocina 10W", 25);
        assert_eq!(run.stages.len(), 6);
        assert!(run
            .stages
            .iter()
            .all(|s| s.status == StageStatus::Pending));
        assert_eq!(run.status, RunStatus::Done);
        assert_eq!(run.schema_version, REPORT_SCHEMA_VERSION);
    }

    #[test]
    fn stage_mut_targets_the_right_report() {
        let mut run = PipelineRun::new("x", 10);
        run.stage_mut(Stage::Filter).status = StageStatus::Failed;
        assert_eq!(run.stage_status(Stage::Filter), StageStatus::Failed);
        assert_eq!(run.stage_status(Stage::Stats), StageStatus::Pending);
    }

    #[test]
    fn roundtrip_pipeline_run() {
        let mut run = PipelineRun::new("Bocina 10W", 25);
        run.errors.push("scrape failed: query 2".to_string());
        let json = serde_json::to_string(&run).unwrap();
        let deserialized: PipelineRun = serde_json::from_str(&json).unwrap();
        assert_eq!(run, deserialized);
    }

    #[test]
    fn export_shape_field_names_are_stable() {
        let run = PipelineRun::new("x", 5);
        let value = serde_json::to_value(&run).unwrap();
        for field in [
            "pivot_product",
            "search_strategy",
            "statistics",
            "final_recommendation",
        ] {
            assert!(value.get(field).is_some(), "missing field: {field}");
        }
    }

    #[test]
    fn stage_serialization() {
        assert_eq!(
            serde_json::to_string(&Stage::DeriveSearch).unwrap(),
            "\"derive_search\""
        );
        assert_eq!(
            serde_json::to_string(&StageStatus::Skipped).unwrap(),
            "\"skipped\""
        );
    }
}
