use serde::{Deserialize, Serialize};

/// Ranked search queries produced by the derive stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchStrategy {
    pub primary_query: String,
    /// Tried in order when the primary query undershoots the offer cap.
    pub fallback_queries: Vec<String>,
    /// Opaque audit text from the term-generation collaborator.
    pub reasoning: String,
}

impl SearchStrategy {
    /// All queries in rank order, primary first.
    pub fn ranked_queries(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_query.as_str())
            .chain(self.fallback_queries.iter().map(String::as_str))
    }
}
