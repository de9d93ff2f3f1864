//! The benchmarking pipeline orchestrator.
//!
//! Runs the six stages in order under a per-stage timeout bounded by the
//! overall run deadline. Only pivot extraction is fatal; every later stage
//! degrades (fallback strategy, empty listings, fail-closed verdicts, null
//! recommendation) and the run still produces a complete audit report.

use std::sync::Arc;
use std::time::Duration;

// Same clock as the stage timeouts, so the deadline and the budgets agree
// even under a paused test clock.
use tokio::time::Instant;
use tracing::{error, info, warn};

use pricebench_models::{
    ComparableVerdict, PipelineConfig, PipelineRun, PriceRecommendation, PriceSample, RunStatus,
    Stage, StageStatus,
};
use pricebench_stats::analyze_prices;

use crate::collaborator::{
    ClassifyCollaborator, ExtractionCollaborator, ReasonCollaborator, ScrapeCollaborator,
    TermCollaborator,
};
use crate::deriver::{fallback_strategy, SearchTermDeriver};
use crate::filter::ComparableFilter;
use crate::retriever::ListingRetriever;
use crate::synthesizer::RecommendationSynthesizer;

/// Why a stage's future never yielded a value.
enum StageAbort {
    /// The stage overran its budget mid-flight.
    Timeout(u64),
    /// The run deadline was already spent before the stage started.
    DeadlineSpent,
}

impl StageAbort {
    fn status(&self) -> StageStatus {
        match self {
            StageAbort::Timeout(_) => StageStatus::Failed,
            StageAbort::DeadlineSpent => StageStatus::Skipped,
        }
    }

    fn message(&self, what: &str) -> String {
        match self {
            StageAbort::Timeout(secs) => format!("{what} timed out after {secs} seconds"),
            StageAbort::DeadlineSpent => format!("{what} skipped: run deadline exceeded"),
        }
    }
}

pub struct Pipeline {
    extractor: Arc<dyn ExtractionCollaborator>,
    deriver: SearchTermDeriver,
    retriever: ListingRetriever,
    filter: ComparableFilter,
    synthesizer: RecommendationSynthesizer,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn ExtractionCollaborator>,
        terms: Arc<dyn TermCollaborator>,
        scraper: Arc<dyn ScrapeCollaborator>,
        classifier: Arc<dyn ClassifyCollaborator>,
        reasoner: Arc<dyn ReasonCollaborator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            deriver: SearchTermDeriver::new(terms),
            retriever: ListingRetriever::new(scraper, config.scrape_concurrency),
            filter: ComparableFilter::new(classifier, config.classification_batch_size),
            synthesizer: RecommendationSynthesizer::new(reasoner),
            config,
        }
    }

    /// Run the full pipeline for one product input. Never returns an error:
    /// every outcome, including fatal extraction failure, is a finalized
    /// [`PipelineRun`].
    pub async fn analyze(&self, product_input: &str, max_offers: Option<usize>) -> PipelineRun {
        let max_offers = max_offers.unwrap_or(self.config.max_offers).max(1);
        let mut run = PipelineRun::new(product_input, max_offers);
        let started = Instant::now();
        let deadline = Duration::from_secs(self.config.total_deadline_seconds);
        let stage_timeout = Duration::from_secs(self.config.stage_timeout_seconds);

        info!(run_id = %run.id, max_offers, "Starting pipeline run");

        // Stage 0: pivot extraction. The only stage whose failure is fatal.
        let stage_started = Instant::now();
        let pivot = match self
            .bounded(
                started,
                deadline,
                stage_timeout,
                self.extractor.extract(product_input),
            )
            .await
        {
            Ok(Ok(pivot)) => {
                self.finish_stage(
                    &mut run,
                    Stage::Extract,
                    stage_started,
                    StageStatus::Succeeded,
                    None,
                );
                pivot
            }
            Ok(Err(e)) => {
                error!(run_id = %run.id, error = %e, "Pivot extraction failed, aborting run");
                return self.abort(run, started, stage_started, e.to_string());
            }
            Err(abort) => {
                let msg = abort.message("pivot extraction");
                error!(run_id = %run.id, error = %msg, "Pivot extraction did not complete");
                return self.abort(run, started, stage_started, msg);
            }
        };
        run.pivot_product = Some(pivot.clone());

        // Stage 1: search term derivation. The deriver absorbs collaborator
        // failures itself; even a timeout leaves us with the pure fallback.
        let stage_started = Instant::now();
        let strategy = match self
            .bounded(started, deadline, stage_timeout, self.deriver.derive(&pivot))
            .await
        {
            Ok((strategy, absorbed)) => {
                let status = if absorbed.is_some() {
                    StageStatus::Failed
                } else {
                    StageStatus::Succeeded
                };
                if let Some(ref e) = absorbed {
                    run.errors.push(format!("derive_search: {e}"));
                }
                self.finish_stage(&mut run, Stage::DeriveSearch, stage_started, status, absorbed);
                strategy
            }
            Err(abort) => {
                let msg = abort.message("term generation");
                warn!(run_id = %run.id, error = %msg, "Using fallback search strategy");
                run.errors.push(format!("derive_search: {msg}"));
                self.finish_stage(
                    &mut run,
                    Stage::DeriveSearch,
                    stage_started,
                    abort.status(),
                    Some(msg),
                );
                fallback_strategy(&pivot)
            }
        };
        run.search_strategy = Some(strategy.clone());

        // Stage 2: listing retrieval.
        let stage_started = Instant::now();
        let listings = match self
            .bounded(
                started,
                deadline,
                stage_timeout,
                self.retriever.retrieve(&strategy, max_offers),
            )
            .await
        {
            Ok(outcome) => {
                let (status, stage_error) = if outcome.is_total_failure() {
                    (
                        StageStatus::Failed,
                        Some("all search queries failed".to_string()),
                    )
                } else {
                    (StageStatus::Succeeded, None)
                };
                for e in &outcome.query_errors {
                    run.errors.push(format!("retrieve: {e}"));
                }
                self.finish_stage(&mut run, Stage::Retrieve, stage_started, status, stage_error);
                outcome.listings
            }
            Err(abort) => {
                let msg = abort.message("retrieval");
                warn!(run_id = %run.id, error = %msg, "Retrieval did not complete");
                run.errors.push(format!("retrieve: {msg}"));
                self.finish_stage(
                    &mut run,
                    Stage::Retrieve,
                    stage_started,
                    abort.status(),
                    Some(msg),
                );
                Vec::new()
            }
        };
        run.listings = listings.clone();

        // Stage 3: comparable filtering. Fail-closed: anything unclassified
        // is marked irrelevant and excluded from the price sample.
        let stage_started = Instant::now();
        let comparable = match self
            .bounded(
                started,
                deadline,
                stage_timeout,
                self.filter.filter(&pivot, &listings),
            )
            .await
        {
            Ok(outcome) => {
                let (status, stage_error) = if outcome.is_total_failure() {
                    (
                        StageStatus::Failed,
                        Some("all classification batches failed".to_string()),
                    )
                } else {
                    (StageStatus::Succeeded, None)
                };
                for e in &outcome.errors {
                    run.errors.push(format!("filter: {e}"));
                }
                self.finish_stage(&mut run, Stage::Filter, stage_started, status, stage_error);
                run.verdicts = outcome.verdicts;
                outcome.comparable
            }
            Err(abort) => {
                let msg = abort.message("classification");
                warn!(run_id = %run.id, error = %msg, "Filtering did not complete, failing closed");
                run.errors.push(format!("filter: {msg}"));
                run.verdicts = listings
                    .iter()
                    .map(|l| ComparableVerdict::fail_closed(&l.listing_id, &msg))
                    .collect();
                self.finish_stage(
                    &mut run,
                    Stage::Filter,
                    stage_started,
                    abort.status(),
                    Some(msg),
                );
                Vec::new()
            }
        };

        // Stage 4: price statistics. Pure and in-process; never fails.
        let stage_started = Instant::now();
        let samples: Vec<PriceSample> = comparable
            .iter()
            .map(|l| PriceSample {
                price: l.price,
                condition: l.condition,
            })
            .collect();
        let statistics = analyze_prices(&samples);
        self.finish_stage(
            &mut run,
            Stage::Stats,
            stage_started,
            StageStatus::Succeeded,
            None,
        );
        run.statistics = Some(statistics.clone());

        // Stage 5: recommendation synthesis.
        let stage_started = Instant::now();
        let recommendation = match self
            .bounded(
                started,
                deadline,
                stage_timeout,
                self.synthesizer.synthesize(&pivot, &statistics, &comparable),
            )
            .await
        {
            Ok((recommendation, absorbed)) => {
                let status = if absorbed.is_some() {
                    StageStatus::Failed
                } else {
                    StageStatus::Succeeded
                };
                if let Some(ref e) = absorbed {
                    run.errors.push(format!("recommend: {e}"));
                }
                self.finish_stage(&mut run, Stage::Recommend, stage_started, status, absorbed);
                recommendation
            }
            Err(abort) => {
                let msg = abort.message("reasoning");
                warn!(run_id = %run.id, error = %msg, "Recommendation did not complete");
                run.errors.push(format!("recommend: {msg}"));
                self.finish_stage(
                    &mut run,
                    Stage::Recommend,
                    stage_started,
                    abort.status(),
                    Some(msg.clone()),
                );
                PriceRecommendation::null_with_reason(&msg)
            }
        };
        run.final_recommendation = Some(recommendation);

        run.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %run.id,
            status = ?run.status,
            listings = run.listings.len(),
            duration_ms = run.duration_ms,
            "Pipeline run complete"
        );
        run
    }

    /// Run `fut` under the smaller of the stage timeout and the remaining
    /// overall deadline.
    async fn bounded<T>(
        &self,
        started: Instant,
        deadline: Duration,
        stage_timeout: Duration,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, StageAbort> {
        let elapsed = started.elapsed();
        if elapsed >= deadline {
            return Err(StageAbort::DeadlineSpent);
        }
        let budget = stage_timeout.min(deadline - elapsed);
        tokio::time::timeout(budget, fut)
            .await
            .map_err(|_| StageAbort::Timeout(budget.as_secs()))
    }

    fn finish_stage(
        &self,
        run: &mut PipelineRun,
        stage: Stage,
        stage_started: Instant,
        status: StageStatus,
        stage_error: Option<String>,
    ) {
        let report = run.stage_mut(stage);
        report.status = status;
        report.elapsed_ms = stage_started.elapsed().as_millis() as u64;
        report.error = stage_error;
        info!(
            stage = stage.name(),
            status = ?status,
            elapsed_ms = report.elapsed_ms,
            "Stage finished"
        );
    }

    /// Finalize a run after fatal extraction failure: the failed stage is
    /// recorded, everything downstream is marked skipped.
    fn abort(
        &self,
        mut run: PipelineRun,
        started: Instant,
        stage_started: Instant,
        message: String,
    ) -> PipelineRun {
        run.status = RunStatus::Failed;
        run.errors.push(format!("extract: {message}"));
        self.finish_stage(
            &mut run,
            Stage::Extract,
            stage_started,
            StageStatus::Failed,
            Some(message),
        );
        for stage in Stage::ALL {
            if run.stage_status(stage) == StageStatus::Pending {
                run.stage_mut(stage).status = StageStatus::Skipped;
            }
        }
        run.duration_ms = started.elapsed().as_millis() as u64;
        run
    }
}
