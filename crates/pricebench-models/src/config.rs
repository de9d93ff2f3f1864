use serde::{Deserialize, Serialize};

/// Top-level configuration for pricebench.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PricebenchConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Orchestrator-level knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Default cap on distinct candidate listings per run.
    pub max_offers: usize,
    /// Per-stage timeout; an overrunning stage counts as failed-degraded.
    pub stage_timeout_seconds: u64,
    /// Overall run deadline; once spent, remaining stages are skipped and
    /// the best-effort report is assembled.
    pub total_deadline_seconds: u64,
    /// Listings per classification batch, bounded by the collaborator's
    /// payload limits.
    pub classification_batch_size: usize,
    /// How many search queries may be in flight at once during retrieval.
    pub scrape_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_offers: 25,
            stage_timeout_seconds: 45,
            total_deadline_seconds: 180,
            classification_batch_size: 20,
            scrape_concurrency: 3,
        }
    }
}

/// Configuration for the LLM-backed collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Model used by the term-generation, classification and reasoning
    /// collaborators.
    pub model: String,
    /// Override model for pivot extraction. Falls back to `model`.
    pub extraction_model: Option<String>,
    /// Per-invocation timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            extraction_model: None,
            timeout_seconds: 45,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_config() {
        let config = PricebenchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PricebenchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_offers, 25);
        assert_eq!(config.classification_batch_size, 20);
        assert_eq!(config.scrape_concurrency, 3);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[pipeline]
max_offers = 40
stage_timeout_seconds = 30
total_deadline_seconds = 120
classification_batch_size = 10
scrape_concurrency = 2

[llm]
model = "claude-sonnet-4-5-20250929"
timeout_seconds = 60
"#;

        let config: PricebenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pipeline.max_offers, 40);
        assert_eq!(config.pipeline.scrape_concurrency, 2);
        assert_eq!(config.llm.model, "claude-sonnet-4-5-20250929");
        assert!(config.llm.extraction_model.is_none());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: PricebenchConfig = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.max_offers, 25);
        assert_eq!(config.llm.timeout_seconds, 45);
    }
}
