//! Search term derivation (stage 1).
//!
//! Delegates to the term-generation collaborator and validates its output.
//! Anything invalid, plus any collaborator failure, falls back to a pure
//! deterministic strategy built from the pivot's attributes, so this stage
//! can never block the pipeline.

use std::sync::Arc;

use tracing::warn;

use pricebench_models::{PivotProduct, SearchStrategy};

use crate::collaborator::TermCollaborator;

pub struct SearchTermDeriver {
    terms: Arc<dyn TermCollaborator>,
}

impl SearchTermDeriver {
    pub fn new(terms: Arc<dyn TermCollaborator>) -> Self {
        Self { terms }
    }

    /// Derive a search strategy for the pivot. Returns the strategy plus the
    /// absorbed collaborator/validation error, if one occurred.
    pub async fn derive(&self, pivot: &PivotProduct) -> (SearchStrategy, Option<String>) {
        match self.terms.generate_terms(pivot).await {
            Ok(strategy) => match normalize(pivot, strategy) {
                Ok(strategy) => (strategy, None),
                Err(reason) => {
                    warn!(reason = %reason, "Generated terms rejected, using fallback");
                    (fallback_strategy(pivot), Some(reason))
                }
            },
            Err(e) => {
                warn!(error = %e, "Term generation failed, using fallback");
                (fallback_strategy(pivot), Some(e.to_string()))
            }
        }
    }
}

/// Validate and normalize collaborator output: non-empty primary, no brand
/// leakage, deduplicated non-leaking fallbacks.
fn normalize(pivot: &PivotProduct, strategy: SearchStrategy) -> Result<SearchStrategy, String> {
    let primary = strategy.primary_query.trim().to_string();
    if primary.is_empty() {
        return Err("primary query is empty".to_string());
    }
    if pivot.leaks_brand(&primary) {
        return Err(format!(
            "primary query leaks the pivot brand token: {primary:?}"
        ));
    }

    let mut fallbacks: Vec<String> = Vec::new();
    for query in &strategy.fallback_queries {
        let query = query.trim();
        if query.is_empty() || query == primary || pivot.leaks_brand(query) {
            continue;
        }
        if !fallbacks.iter().any(|q| q == query) {
            fallbacks.push(query.to_string());
        }
    }

    Ok(SearchStrategy {
        primary_query: primary,
        fallback_queries: fallbacks,
        reasoning: strategy.reasoning,
    })
}

/// The pure fallback: concatenate attribute values in key order, or strip
/// the brand token out of the title when there are no attributes. Always
/// produces a non-empty primary query; it is brand-free except in the
/// degenerate case of an attribute-less pivot whose title is nothing but
/// the brand token, where non-emptiness wins.
pub fn fallback_strategy(pivot: &PivotProduct) -> SearchStrategy {
    let from_attributes = pivot
        .attributes
        .values()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let stripped_title = title_without_brand(pivot);

    let primary = if !from_attributes.is_empty() {
        from_attributes
    } else {
        stripped_title.clone()
    };

    let fallback_queries = if stripped_title != primary && !stripped_title.is_empty() {
        vec![stripped_title]
    } else {
        Vec::new()
    };

    SearchStrategy {
        primary_query: primary,
        fallback_queries,
        reasoning: "deterministic fallback built from pivot attributes".to_string(),
    }
}

fn title_without_brand(pivot: &PivotProduct) -> String {
    let brand = pivot.brand.as_deref().map(str::to_lowercase);
    let stripped = pivot
        .title
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|word| brand.as_deref() != Some(word.as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    if stripped.is_empty() {
        pivot.title.to_lowercase()
    } else {
        stripped
    }
}
