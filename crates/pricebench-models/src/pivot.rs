use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Listing condition as reported by the marketplace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    Used,
    Unknown,
}

impl Condition {
    /// Map a raw marketplace condition string. The target site reports
    /// conditions in Spanish, so both languages are accepted.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "new" | "nuevo" | "nueva" => Condition::New,
            "used" | "usado" | "usada" => Condition::Used,
            _ => Condition::Unknown,
        }
    }
}

/// The reference product whose price is being benchmarked.
///
/// Built once at the extract stage and never mutated afterwards; every later
/// stage borrows it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PivotProduct {
    /// The URL or free text the run started from.
    pub source: String,
    pub title: String,
    /// Brand token, when one could be identified. Drives the brand-leakage
    /// guard on derived search terms.
    pub brand: Option<String>,
    /// Normalized technical attributes, e.g. "power" -> "10W".
    pub attributes: BTreeMap<String, String>,
    pub condition: Condition,
    /// The pivot's own listed price, when known. Audit only; never fed into
    /// the statistics.
    pub price: Option<Decimal>,
    pub currency: String,
}

impl PivotProduct {
    /// True when `text` contains the pivot's brand token as a whole word,
    /// case-insensitive. Always false for brandless pivots.
    pub fn leaks_brand(&self, text: &str) -> bool {
        let Some(brand) = &self.brand else {
            return false;
        };
        let brand = brand.to_lowercase();
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_pivot() -> PivotProduct {
        PivotProduct {
            source: "https://example.com/p/MLM123".to_string(),
            title: "Bocina Bluetooth Acme 10W".to_string(),
            brand: Some("Acme".to_string()),
            attributes: BTreeMap::from([
                ("power".to_string(), "10W".to_string()),
                ("size".to_string(), "5 inch".to_string()),
            ]),
            condition: Condition::New,
            price: Some(dec!(799.00)),
            currency: "MXN".to_string(),
        }
    }

    #[test]
    fn roundtrip_pivot_product() {
        let pivot = sample_pivot();
        let json = serde_json::to_string(&pivot).unwrap();
        let deserialized: PivotProduct = serde_json::from_str(&json).unwrap();
        assert_eq!(pivot, deserialized);
    }

    #[test]
    fn condition_parse_accepts_spanish() {
        assert_eq!(Condition::parse("Nuevo"), Condition::New);
        assert_eq!(Condition::parse("usado"), Condition::Used);
        assert_eq!(Condition::parse("refurbished"), Condition::Unknown);
        assert_eq!(Condition::parse(""), Condition::Unknown);
    }

    #[test]
    fn condition_serialization() {
        assert_eq!(serde_json::to_string(&Condition::New).unwrap(), "\"new\"");
        assert_eq!(
            serde_json::to_string(&Condition::Unknown).unwrap(),
            "\"unknown\""
        );
    }

    #[test]
    fn brand_leak_is_whole_word_case_insensitive() {
        let pivot = sample_pivot();
        assert!(pivot.leaks_brand("bocina ACME bluetooth"));
        assert!(pivot.leaks_brand("acme-10w speaker"));
        assert!(!pivot.leaks_brand("bocina acmeson bluetooth"));
        assert!(!pivot.leaks_brand("bocina bluetooth 10w"));
    }

    #[test]
    fn brandless_pivot_never_leaks() {
        let mut pivot = sample_pivot();
        pivot.brand = None;
        assert!(!pivot.leaks_brand("anything at all"));
    }
}
