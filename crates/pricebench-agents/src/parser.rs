//! Extraction of structured payloads from noisy LLM output.
//!
//! Collaborator responses arrive as free text that usually, but not always,
//! wraps a single JSON value: clean JSON, a markdown code fence, or prose
//! followed by an object. Each typed parser below first isolates the JSON
//! and then deserializes it into the wire shape for that collaborator.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use pricebench_models::{
    Classification, ComparableVerdict, Condition, PivotProduct, RawRecommendation, SearchStrategy,
};

use crate::error::PipelineError;

/// Isolate the first JSON value (object or array) in `text`.
pub fn extract_json(text: &str) -> Result<String, PipelineError> {
    let trimmed = text.trim();

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return Ok(trimmed.to_string());
    }

    if let Some(candidate) = fenced_block(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    if let Some(candidate) = first_balanced_value(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    Err(PipelineError::Parse(format!(
        "no valid JSON value found in response (length={})",
        text.len()
    )))
}

/// Pull the body of the first ``` fence, tolerating a `json` language tag.
fn fenced_block(text: &str) -> Option<String> {
    let open = text.find("```")?;
    let after_marker = &text[open + 3..];
    let body_start = after_marker.find('\n')? + 1;
    let body = &after_marker[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim().to_string())
}

/// Scan for the first balanced `{...}` or `[...]`, respecting strings.
fn first_balanced_value(text: &str) -> Option<String> {
    let open = text.find(['{', '['])?;
    let bytes = &text[open..];
    let (open_ch, close_ch) = match bytes.chars().next()? {
        '{' => ('{', '}'),
        _ => ('[', ']'),
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in bytes.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open_ch && !in_string => depth += 1,
            c if c == close_ch && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(bytes[..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct PivotPayload {
    title: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    currency: Option<String>,
}

/// Parse a pivot product from extraction output. `source` is the run input
/// the caller already holds; the collaborator never echoes it.
pub fn parse_pivot(raw: &str, source: &str) -> Result<PivotProduct, PipelineError> {
    let json = extract_json(raw)?;
    let payload: PivotPayload = serde_json::from_str(&json)
        .map_err(|e| PipelineError::Parse(format!("pivot payload: {e}")))?;

    if payload.title.trim().is_empty() {
        return Err(PipelineError::Parse("pivot title is empty".to_string()));
    }

    Ok(PivotProduct {
        source: source.to_string(),
        title: payload.title,
        brand: payload.brand.filter(|b| !b.trim().is_empty()),
        attributes: payload.attributes,
        condition: payload
            .condition
            .as_deref()
            .map(Condition::parse)
            .unwrap_or(Condition::Unknown),
        price: payload.price,
        currency: payload.currency.unwrap_or_else(|| "MXN".to_string()),
    })
}

#[derive(Debug, Deserialize)]
struct StrategyPayload {
    primary_query: String,
    #[serde(default)]
    fallback_queries: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

pub fn parse_strategy(raw: &str) -> Result<SearchStrategy, PipelineError> {
    let json = extract_json(raw)?;
    let payload: StrategyPayload = serde_json::from_str(&json)
        .map_err(|e| PipelineError::Parse(format!("search strategy payload: {e}")))?;
    Ok(SearchStrategy {
        primary_query: payload.primary_query,
        fallback_queries: payload.fallback_queries,
        reasoning: payload.reasoning,
    })
}

#[derive(Debug, Deserialize)]
struct VerdictPayload {
    listing_id: String,
    classification: Classification,
    #[serde(default)]
    confidence: Option<Decimal>,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct VerdictsPayload {
    verdicts: Vec<VerdictPayload>,
}

/// Parse classification verdicts. Accepts `{"verdicts": [...]}` or a bare
/// array.
pub fn parse_verdicts(raw: &str) -> Result<Vec<ComparableVerdict>, PipelineError> {
    let json = extract_json(raw)?;
    let payloads: Vec<VerdictPayload> = if json.trim_start().starts_with('[') {
        serde_json::from_str(&json)
            .map_err(|e| PipelineError::Parse(format!("verdict array: {e}")))?
    } else {
        let wrapped: VerdictsPayload = serde_json::from_str(&json)
            .map_err(|e| PipelineError::Parse(format!("verdicts payload: {e}")))?;
        wrapped.verdicts
    };

    Ok(payloads
        .into_iter()
        .map(|p| ComparableVerdict {
            listing_id: p.listing_id,
            classification: p.classification,
            confidence: p
                .confidence
                .filter(|c| *c >= Decimal::ZERO && *c <= Decimal::ONE),
            reason: p.reason,
        })
        .collect())
}

pub fn parse_recommendation(raw: &str) -> Result<RawRecommendation, PipelineError> {
    let json = extract_json(raw)?;
    serde_json::from_str(&json)
        .map_err(|e| PipelineError::Parse(format!("recommendation payload: {e}")))
}
