//! Recommendation synthesis (stage 5).
//!
//! Builds a bounded summary of the comparables, asks the reasoning
//! collaborator for a price, then validates the numeric output against the
//! retained price range. When nothing comparable survived the filter, the
//! collaborator is never called and an explicit null recommendation is
//! returned instead.

use std::sync::Arc;

use tracing::{info, warn};

use pricebench_models::{
    CandidateListing, ComparableSummary, ConfidenceLevel, PivotProduct, PriceRecommendation,
    PriceStatistics,
};

use crate::collaborator::ReasonCollaborator;

const MAX_SAMPLE_LINES: usize = 10;

/// Comparable counts below this cap confidence at medium.
const HIGH_CONFIDENCE_MIN: usize = 5;

pub struct RecommendationSynthesizer {
    reasoner: Arc<dyn ReasonCollaborator>,
}

impl RecommendationSynthesizer {
    pub fn new(reasoner: Arc<dyn ReasonCollaborator>) -> Self {
        Self { reasoner }
    }

    /// Produce a recommendation. Returns the recommendation plus the
    /// absorbed collaborator error, if one occurred.
    pub async fn synthesize(
        &self,
        pivot: &PivotProduct,
        statistics: &PriceStatistics,
        comparable: &[CandidateListing],
    ) -> (PriceRecommendation, Option<String>) {
        if comparable.is_empty() {
            info!(title = %pivot.title, "No comparables, returning null recommendation");
            return (
                PriceRecommendation::null_with_reason("no comparable listings found"),
                None,
            );
        }

        let summary = summarize(comparable);
        match self.reasoner.recommend(statistics, &summary).await {
            Ok(raw) => {
                let rec = validate(raw, statistics, &summary);
                (rec, None)
            }
            Err(e) => {
                warn!(error = %e, "Reasoning failed, returning degraded recommendation");
                let reason = format!("reasoning failed: {e}");
                (PriceRecommendation::null_with_reason(&reason), Some(e.to_string()))
            }
        }
    }
}

fn summarize(comparable: &[CandidateListing]) -> ComparableSummary {
    let mut by_condition = std::collections::BTreeMap::new();
    for listing in comparable {
        *by_condition.entry(listing.condition).or_insert(0usize) += 1;
    }
    ComparableSummary {
        comparable_count: comparable.len(),
        by_condition,
        sample_listings: comparable
            .iter()
            .take(MAX_SAMPLE_LINES)
            .map(|l| format!("{} ({})", l.title, l.price))
            .collect(),
    }
}

/// Clamp the recommended price into the retained [min, max] range and drop
/// alternatives that fall outside it. The collaborator's reasoning text is
/// kept verbatim either way.
fn validate(
    raw: pricebench_models::RawRecommendation,
    statistics: &PriceStatistics,
    summary: &ComparableSummary,
) -> PriceRecommendation {
    let (min, max) = match (statistics.min, statistics.max) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            // Comparables existed but every price was fenced out; nothing
            // remains to validate against.
            return PriceRecommendation::null_with_reason("no retained prices to benchmark");
        }
    };

    let mut clamped = false;
    let price = if raw.recommended_price < min {
        warn!(price = %raw.recommended_price, floor = %min, "Clamping recommendation to range floor");
        clamped = true;
        min
    } else if raw.recommended_price > max {
        warn!(price = %raw.recommended_price, ceiling = %max, "Clamping recommendation to range ceiling");
        clamped = true;
        max
    } else {
        raw.recommended_price
    };

    let alternatives = raw
        .alternatives
        .into_iter()
        .filter(|(strategy, alt)| {
            let in_range = *alt >= min && *alt <= max;
            if !in_range {
                warn!(strategy = ?strategy, price = %alt, "Dropping out-of-range alternative");
            }
            in_range
        })
        .collect();

    let confidence = if statistics.insufficient_data || statistics.iqr_unreliable {
        ConfidenceLevel::Low
    } else if summary.comparable_count < HIGH_CONFIDENCE_MIN {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::High
    };

    PriceRecommendation {
        recommended_price: Some(price),
        strategy: Some(raw.strategy),
        confidence,
        reasoning: raw.reasoning,
        alternatives,
        clamped,
        reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_listing, sample_pivot, statistics_for, MockReasoner};
    use pricebench_models::{PricingStrategy, RawRecommendation};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn comparables(n: usize) -> Vec<CandidateListing> {
        (0..n)
            .map(|i| sample_listing(&format!("l{i}"), dec!(100) + rust_decimal::Decimal::from(i)))
            .collect()
    }

    #[tokio::test]
    async fn empty_comparables_short_circuit() {
        // A reasoner that would fail loudly if called.
        let synthesizer = RecommendationSynthesizer::new(Arc::new(MockReasoner::failing()));
        let stats = PriceStatistics::empty();
        let (rec, err) = synthesizer.synthesize(&sample_pivot(), &stats, &[]).await;
        assert!(err.is_none());
        assert!(rec.recommended_price.is_none());
        assert_eq!(rec.reason.as_deref(), Some("no comparable listings found"));
    }

    #[tokio::test]
    async fn in_range_recommendation_passes_through() {
        let reasoner = MockReasoner::with_recommendation(RawRecommendation {
            recommended_price: dec!(104),
            strategy: PricingStrategy::Competitive,
            reasoning: "median play".to_string(),
            alternatives: BTreeMap::from([
                (PricingStrategy::Aggressive, dec!(101)),
                (PricingStrategy::Premium, dec!(106)),
            ]),
        });
        let synthesizer = RecommendationSynthesizer::new(Arc::new(reasoner));
        let listings = comparables(8);
        let stats = statistics_for(&listings);
        let (rec, err) = synthesizer
            .synthesize(&sample_pivot(), &stats, &listings)
            .await;
        assert!(err.is_none());
        assert_eq!(rec.recommended_price, Some(dec!(104)));
        assert!(!rec.clamped);
        assert_eq!(rec.confidence, ConfidenceLevel::High);
        assert_eq!(rec.reasoning, "median play");
        assert_eq!(rec.alternatives.len(), 2);
    }

    #[tokio::test]
    async fn out_of_range_price_is_clamped() {
        let reasoner = MockReasoner::with_recommendation(RawRecommendation {
            recommended_price: dec!(9999),
            strategy: PricingStrategy::Premium,
            reasoning: "shoot the moon".to_string(),
            alternatives: BTreeMap::from([(PricingStrategy::Aggressive, dec!(1))]),
        });
        let synthesizer = RecommendationSynthesizer::new(Arc::new(reasoner));
        let listings = comparables(8);
        let stats = statistics_for(&listings);
        let (rec, _) = synthesizer
            .synthesize(&sample_pivot(), &stats, &listings)
            .await;
        assert_eq!(rec.recommended_price, stats.max);
        assert!(rec.clamped);
        // The out-of-range alternative is dropped, not clamped.
        assert!(rec.alternatives.is_empty());
        assert_eq!(rec.reasoning, "shoot the moon");
    }

    #[tokio::test]
    async fn below_range_price_is_clamped_to_floor() {
        let reasoner = MockReasoner::with_recommendation(RawRecommendation {
            recommended_price: dec!(1),
            strategy: PricingStrategy::Aggressive,
            reasoning: "race to the bottom".to_string(),
            alternatives: BTreeMap::new(),
        });
        let synthesizer = RecommendationSynthesizer::new(Arc::new(reasoner));
        let listings = comparables(8);
        let stats = statistics_for(&listings);
        let (rec, _) = synthesizer
            .synthesize(&sample_pivot(), &stats, &listings)
            .await;
        assert_eq!(rec.recommended_price, stats.min);
        assert!(rec.clamped);
        assert_eq!(rec.reasoning, "race to the bottom");
    }

    #[tokio::test]
    async fn reasoner_failure_degrades_to_null() {
        let synthesizer = RecommendationSynthesizer::new(Arc::new(MockReasoner::failing()));
        let listings = comparables(5);
        let stats = statistics_for(&listings);
        let (rec, err) = synthesizer
            .synthesize(&sample_pivot(), &stats, &listings)
            .await;
        assert!(err.is_some());
        assert!(rec.recommended_price.is_none());
        assert!(rec.reason.as_deref().unwrap().contains("reasoning failed"));
    }

    #[tokio::test]
    async fn small_sample_lowers_confidence() {
        let reasoner = MockReasoner::with_recommendation(RawRecommendation {
            recommended_price: dec!(101),
            strategy: PricingStrategy::Competitive,
            reasoning: String::new(),
            alternatives: BTreeMap::new(),
        });
        let synthesizer = RecommendationSynthesizer::new(Arc::new(reasoner));
        let listings = comparables(4);
        let stats = statistics_for(&listings);
        let (rec, _) = synthesizer
            .synthesize(&sample_pivot(), &stats, &listings)
            .await;
        assert_eq!(rec.confidence, ConfidenceLevel::Medium);
    }

    #[test]
    fn summary_caps_sample_lines() {
        let listings = comparables(15);
        let summary = summarize(&listings);
        assert_eq!(summary.comparable_count, 15);
        assert_eq!(summary.sample_listings.len(), MAX_SAMPLE_LINES);
        assert!(summary.sample_listings[0].contains("(100)"));
    }
}
