use thiserror::Error;

/// Failure taxonomy for the pipeline.
///
/// Only `Extraction` is fatal to a run; every other variant is absorbed at
/// its stage boundary, recorded in the audit trail, and the pipeline
/// continues degraded.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("term generation failed: {0}")]
    TermGeneration(String),

    #[error("scrape failed: {0}")]
    Scrape(String),

    #[error("classification failed: {0}")]
    Classification(String),

    #[error("reasoning failed: {0}")]
    Reasoning(String),

    #[error("stage timed out after {0} seconds")]
    Timeout(u64),

    #[error("collaborator response parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// True for the one error class that aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Extraction(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_extraction_is_fatal() {
        assert!(PipelineError::Extraction("no pivot".into()).is_fatal());
        assert!(!PipelineError::Scrape("timeout".into()).is_fatal());
        assert!(!PipelineError::Classification("bad batch".into()).is_fatal());
        assert!(!PipelineError::Reasoning("empty".into()).is_fatal());
        assert!(!PipelineError::Timeout(45).is_fatal());
    }
}
