//! Pipeline components and collaborator integrations for pricebench.
//!
//! The orchestrator in [`pipeline`] wires five collaborator contracts
//! ([`collaborator`]) into a six-stage benchmarking run. The bundled
//! LLM-backed implementations ([`llm`]) shell out to the Claude CLI;
//! [`test_support`] provides deterministic doubles for everything.

pub mod claude;
pub mod collaborator;
pub mod deriver;
pub mod error;
pub mod filter;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod synthesizer;
pub mod test_support;

pub use claude::{check_cli_available, ClaudeCliConfig};
pub use collaborator::{
    ClassifyCollaborator, ExtractionCollaborator, ReasonCollaborator, ScrapeCollaborator,
    TermCollaborator,
};
pub use deriver::SearchTermDeriver;
pub use error::PipelineError;
pub use filter::{ComparableFilter, FilterOutcome};
pub use llm::{ClaudeClassifier, ClaudeExtractor, ClaudeReasoner, ClaudeTermGenerator};
pub use pipeline::Pipeline;
pub use retriever::{ListingRetriever, RetrievalOutcome};
pub use synthesizer::RecommendationSynthesizer;
