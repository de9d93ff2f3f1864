pub mod config;
pub mod listing;
pub mod pivot;
pub mod recommendation;
pub mod report;
pub mod search;
pub mod statistics;

pub use config::{LlmConfig, PipelineConfig, PricebenchConfig};
pub use listing::{CandidateListing, Classification, ComparableVerdict};
pub use pivot::{Condition, PivotProduct};
pub use recommendation::{
    ComparableSummary, ConfidenceLevel, PriceRecommendation, PricingStrategy, RawRecommendation,
};
pub use report::{PipelineRun, RunStatus, Stage, StageReport, StageStatus};
pub use search::SearchStrategy;
pub use statistics::{PriceSample, PriceStatistics};
