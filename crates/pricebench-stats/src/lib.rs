//! Outlier-resistant price statistics.
//!
//! Pure and deterministic: identical samples produce identical statistics
//! regardless of input order. Quartiles use linear interpolation between
//! closest ranks (`p = (n - 1) * q`), the convention pinned by the tests
//! below; other conventions give different numbers for the same data, so
//! this one must not drift.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use pricebench_models::{Condition, PriceSample, PriceStatistics};

const FENCE_MULTIPLIER_TENTHS: i64 = 15; // 1.5 as 15/10, exact in Decimal

/// Minimum sample count for IQR fences to mean anything.
const MIN_SAMPLES_FOR_FENCES: usize = 4;

/// Compute robust price statistics over comparable price samples.
///
/// Zero samples yield the all-None statistics with `insufficient_data` set.
/// Fewer than [`MIN_SAMPLES_FOR_FENCES`] samples skip fencing entirely: the
/// raw set is retained and `iqr_unreliable` is set. Otherwise prices outside
/// `[q1 - 1.5*IQR, q3 + 1.5*IQR]` are counted as outliers and excluded, and
/// min/max/mean are recomputed over the retained set only.
pub fn analyze_prices(samples: &[PriceSample]) -> PriceStatistics {
    if samples.is_empty() {
        return PriceStatistics::empty();
    }

    let mut sorted: Vec<PriceSample> = samples.to_vec();
    sorted.sort_by(|a, b| a.price.cmp(&b.price));
    let prices: Vec<Decimal> = sorted.iter().map(|s| s.price).collect();
    let count = prices.len();

    let q1 = quantile(&prices, Decimal::new(25, 2));
    let median = quantile(&prices, Decimal::new(50, 2));
    let q3 = quantile(&prices, Decimal::new(75, 2));

    let (retained_samples, iqr, lower_fence, upper_fence, outlier_count, iqr_unreliable) =
        if count < MIN_SAMPLES_FOR_FENCES {
            (sorted, None, None, None, 0, true)
        } else {
            let iqr = q3 - q1;
            let margin = iqr * Decimal::new(FENCE_MULTIPLIER_TENTHS, 1);
            let lower = q1 - margin;
            let upper = q3 + margin;
            let retained: Vec<PriceSample> = sorted
                .iter()
                .copied()
                .filter(|s| s.price >= lower && s.price <= upper)
                .collect();
            let outliers = count - retained.len();
            (retained, Some(iqr), Some(lower), Some(upper), outliers, false)
        };

    let retained: Vec<Decimal> = retained_samples.iter().map(|s| s.price).collect();
    let by_condition = tally_conditions(&retained_samples);

    PriceStatistics {
        count,
        min: retained.first().copied(),
        max: retained.last().copied(),
        mean: mean(&retained),
        median: Some(median),
        q1: Some(q1),
        q3: Some(q3),
        iqr,
        lower_fence,
        upper_fence,
        outlier_count,
        retained,
        by_condition,
        insufficient_data: false,
        iqr_unreliable,
    }
}

/// Quantile by linear interpolation between closest ranks. `sorted` must be
/// ascending and non-empty; `q` in [0, 1].
fn quantile(sorted: &[Decimal], q: Decimal) -> Decimal {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = Decimal::from(n - 1) * q;
    let lower_idx = pos.floor().to_usize().unwrap_or(0).min(n - 1);
    let upper_idx = (lower_idx + 1).min(n - 1);
    let frac = pos - pos.floor();
    sorted[lower_idx] + frac * (sorted[upper_idx] - sorted[lower_idx])
}

fn mean(prices: &[Decimal]) -> Option<Decimal> {
    if prices.is_empty() {
        return None;
    }
    let sum: Decimal = prices.iter().copied().sum();
    Some(sum / Decimal::from(prices.len()))
}

fn tally_conditions(
    samples: &[PriceSample],
) -> std::collections::BTreeMap<Condition, usize> {
    let mut tally = std::collections::BTreeMap::new();
    for sample in samples {
        *tally.entry(sample.condition).or_insert(0) += 1;
    }
    tally
}
