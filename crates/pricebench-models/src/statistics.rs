use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pivot::Condition;

/// One observed price with its listing condition, the input unit of the
/// statistics engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceSample {
    pub price: Decimal,
    pub condition: Condition,
}

/// Robust descriptive statistics over comparable prices.
///
/// Quartiles use linear interpolation between closest ranks
/// (`p = (n - 1) * q`); min, max and mean are recomputed over the retained
/// (non-outlier) set, which is what downstream recommendation sees.
/// Recomputed fresh on every run, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceStatistics {
    /// Number of input samples.
    pub count: usize,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub mean: Option<Decimal>,
    pub median: Option<Decimal>,
    pub q1: Option<Decimal>,
    pub q3: Option<Decimal>,
    pub iqr: Option<Decimal>,
    /// q1 - 1.5 * IQR. None when the sample was too small to fence.
    pub lower_fence: Option<Decimal>,
    /// q3 + 1.5 * IQR.
    pub upper_fence: Option<Decimal>,
    pub outlier_count: usize,
    /// Non-outlier prices, ascending.
    pub retained: Vec<Decimal>,
    /// Condition tally of the retained samples.
    pub by_condition: BTreeMap<Condition, usize>,
    /// Set when there were zero input samples.
    pub insufficient_data: bool,
    /// Set when fewer than 4 samples made the IQR fences meaningless.
    pub iqr_unreliable: bool,
}

impl PriceStatistics {
    /// The empty-input statistics object.
    pub fn empty() -> Self {
        Self {
            insufficient_data: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roundtrip_price_statistics() {
        let stats = PriceStatistics {
            count: 5,
            min: Some(dec!(599)),
            max: Some(dec!(899)),
            mean: Some(dec!(719.2)),
            median: Some(dec!(699)),
            q1: Some(dec!(649)),
            q3: Some(dec!(750)),
            iqr: Some(dec!(101)),
            lower_fence: Some(dec!(497.5)),
            upper_fence: Some(dec!(901.5)),
            outlier_count: 0,
            retained: vec![dec!(599), dec!(649), dec!(699), dec!(750), dec!(899)],
            by_condition: BTreeMap::from([(Condition::New, 4), (Condition::Used, 1)]),
            insufficient_data: false,
            iqr_unreliable: false,
        };

        let json = serde_json::to_string(&stats).unwrap();
        let deserialized: PriceStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, deserialized);
    }

    #[test]
    fn empty_statistics_flag_insufficient_data() {
        let stats = PriceStatistics::empty();
        assert!(stats.insufficient_data);
        assert_eq!(stats.count, 0);
        assert!(stats.median.is_none());
        assert!(stats.retained.is_empty());
    }
}
