use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pivot::Condition;

/// Pricing posture relative to the comparable market.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    /// Undercut the market, near the lower quartile.
    Aggressive,
    /// Track the median.
    Competitive,
    /// Price near the upper quartile.
    Premium,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Bounded digest of the comparable set sent to the reasoning collaborator
/// instead of every raw listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparableSummary {
    pub comparable_count: usize,
    pub by_condition: BTreeMap<Condition, usize>,
    /// Up to a handful of "title (price)" lines for context.
    pub sample_listings: Vec<String>,
}

/// Untrusted output of the reasoning collaborator, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRecommendation {
    pub recommended_price: Decimal,
    pub strategy: PricingStrategy,
    pub reasoning: String,
    #[serde(default)]
    pub alternatives: BTreeMap<PricingStrategy, Decimal>,
}

/// The validated final recommendation.
///
/// `recommended_price` is None for the degraded "no comparable listings
/// found" outcome; a number is never fabricated. The collaborator's
/// reasoning text is preserved verbatim, but its numeric output is clamped
/// to the retained price range (`clamped` records that this happened).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecommendation {
    pub recommended_price: Option<Decimal>,
    pub strategy: Option<PricingStrategy>,
    pub confidence: ConfidenceLevel,
    pub reasoning: String,
    pub alternatives: BTreeMap<PricingStrategy, Decimal>,
    pub clamped: bool,
    /// Explicit cause for a null or degraded recommendation.
    pub reason: Option<String>,
}

impl PriceRecommendation {
    /// The null recommendation returned when nothing comparable survived.
    pub fn null_with_reason(reason: &str) -> Self {
        Self {
            recommended_price: None,
            strategy: None,
            confidence: ConfidenceLevel::Low,
            reasoning: String::new(),
            alternatives: BTreeMap::new(),
            clamped: false,
            reason: Some(reason.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roundtrip_price_recommendation() {
        let rec = PriceRecommendation {
            recommended_price: Some(dec!(699.00)),
            strategy: Some(PricingStrategy::Competitive),
            confidence: ConfidenceLevel::High,
            reasoning: "Tight IQR; median tracks the market".to_string(),
            alternatives: BTreeMap::from([
                (PricingStrategy::Aggressive, dec!(655.00)),
                (PricingStrategy::Premium, dec!(745.00)),
            ]),
            clamped: false,
            reason: None,
        };

        let json = serde_json::to_string(&rec).unwrap();
        let deserialized: PriceRecommendation = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, deserialized);
    }

    #[test]
    fn strategy_serialization() {
        assert_eq!(
            serde_json::to_string(&PricingStrategy::Aggressive).unwrap(),
            "\"aggressive\""
        );
        assert_eq!(
            serde_json::to_string(&ConfidenceLevel::Low).unwrap(),
            "\"low\""
        );
    }

    #[test]
    fn null_recommendation_carries_reason() {
        let rec = PriceRecommendation::null_with_reason("no comparable listings found");
        assert!(rec.recommended_price.is_none());
        assert!(rec.strategy.is_none());
        assert_eq!(rec.confidence, ConfidenceLevel::Low);
        assert_eq!(rec.reason.as_deref(), Some("no comparable listings found"));
    }

    #[test]
    fn raw_recommendation_alternatives_default_empty() {
        let json = r#"{
            "recommended_price": "699.00",
            "strategy": "competitive",
            "reasoning": "median"
        }"#;
        let raw: RawRecommendation = serde_json::from_str(json).unwrap();
        assert!(raw.alternatives.is_empty());
        assert_eq!(raw.recommended_price, dec!(699.00));
    }
}
