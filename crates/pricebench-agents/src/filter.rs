//! Comparable filtering (stage 3).
//!
//! Sends listings to the classification collaborator in batches and pairs
//! every listing with exactly one verdict. A listing the collaborator does
//! not rule on, or whose whole batch fails, is marked irrelevant rather
//! than silently admitted into the price sample.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use pricebench_models::{
    CandidateListing, Classification, ComparableVerdict, PivotProduct,
};

use crate::collaborator::ClassifyCollaborator;

/// Verdicts for every listing, the comparable subset, and absorbed batch
/// failures.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub verdicts: Vec<ComparableVerdict>,
    pub comparable: Vec<CandidateListing>,
    pub errors: Vec<String>,
    pub total_batches: usize,
    pub failed_batches: usize,
}

impl FilterOutcome {
    /// True when every classification batch failed. A run where some batch
    /// genuinely classified everything irrelevant is not a total failure.
    pub fn is_total_failure(&self) -> bool {
        self.total_batches > 0 && self.failed_batches == self.total_batches
    }
}

pub struct ComparableFilter {
    classifier: Arc<dyn ClassifyCollaborator>,
    batch_size: usize,
}

impl ComparableFilter {
    pub fn new(classifier: Arc<dyn ClassifyCollaborator>, batch_size: usize) -> Self {
        Self {
            classifier,
            batch_size: batch_size.max(1),
        }
    }

    /// Classify every listing against the pivot. Output order follows the
    /// input listing order, one verdict per listing.
    pub async fn filter(
        &self,
        pivot: &PivotProduct,
        listings: &[CandidateListing],
    ) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for batch in listings.chunks(self.batch_size) {
            outcome.total_batches += 1;
            match self.classifier.classify(pivot, batch).await {
                Ok(verdicts) => self.apply_batch(batch, verdicts, &mut outcome),
                Err(e) => {
                    warn!(batch_size = batch.len(), error = %e, "Classification batch failed");
                    outcome.failed_batches += 1;
                    outcome.errors.push(e.to_string());
                    for listing in batch {
                        outcome.verdicts.push(ComparableVerdict::fail_closed(
                            &listing.listing_id,
                            &format!("classification failed: {e}"),
                        ));
                    }
                }
            }
        }

        info!(
            listings = listings.len(),
            comparable = outcome.comparable.len(),
            failed_batches = outcome.errors.len(),
            "Filtering complete"
        );
        outcome
    }

    fn apply_batch(
        &self,
        batch: &[CandidateListing],
        verdicts: Vec<ComparableVerdict>,
        outcome: &mut FilterOutcome,
    ) {
        let mut by_id: HashMap<String, ComparableVerdict> = HashMap::new();
        for verdict in verdicts {
            if !batch.iter().any(|l| l.listing_id == verdict.listing_id) {
                warn!(listing_id = %verdict.listing_id, "Verdict for unknown listing, ignoring");
                continue;
            }
            by_id.insert(verdict.listing_id.clone(), verdict);
        }

        for listing in batch {
            let verdict = by_id.remove(&listing.listing_id).unwrap_or_else(|| {
                warn!(listing_id = %listing.listing_id, "No verdict returned for listing");
                ComparableVerdict::fail_closed(&listing.listing_id, "no verdict returned")
            });
            if verdict.classification == Classification::Comparable {
                outcome.comparable.push(listing.clone());
            }
            outcome.verdicts.push(verdict);
        }
    }
}
