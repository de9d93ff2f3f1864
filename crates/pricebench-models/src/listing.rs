use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pivot::Condition;

/// A competitor listing collected by the retrieve stage.
///
/// `listing_id` is the dedup key: the same listing surfacing under several
/// search queries collapses to one entry, first occurrence wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateListing {
    pub listing_id: String,
    pub title: String,
    /// Non-negative; rows with negative prices are dropped at ingestion.
    pub price: Decimal,
    pub currency: String,
    pub condition: Condition,
    /// Raw attribute text from the listing page, kept opaque for the
    /// classification collaborator.
    pub attributes_text: Option<String>,
    pub permalink: Option<String>,
}

/// How a candidate relates to the pivot product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Same or directly equivalent product.
    Comparable,
    /// Case, cable, stand, replacement part.
    Accessory,
    /// Multiple items or a kit.
    Bundle,
    /// A different product, or no verdict was available (fail-closed).
    Irrelevant,
}

/// One classification verdict per surviving candidate listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparableVerdict {
    pub listing_id: String,
    pub classification: Classification,
    /// 0.0 to 1.0 when the collaborator reported one.
    pub confidence: Option<Decimal>,
    pub reason: String,
}

impl ComparableVerdict {
    /// The verdict synthesized for a listing the classification collaborator
    /// never ruled on. Missing evidence always excludes.
    pub fn fail_closed(listing_id: &str, reason: &str) -> Self {
        Self {
            listing_id: listing_id.to_string(),
            classification: Classification::Irrelevant,
            confidence: None,
            reason: reason.to_string(),
        }
    }
}
