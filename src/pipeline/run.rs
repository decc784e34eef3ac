//! One pipeline run: fetch → parse → dedupe → score → gate → handoff.
//!
//! The orchestrator is the only component aware of run-level policy (job
//! cap, batching, recurrence). Failures below it are isolated per page or
//! per job and surface only in the run-summary counts; only configuration
//! and profile errors abort a run, and those are raised before any
//! fetching begins.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::fetcher::{PageOutcome, PageSource};
use crate::models::{Config, JobPosting, JobStatus, PipelineRun, Profile, ScoreResult};
use crate::parser::ListingParser;
use crate::pipeline::handoff::Handoff;
use crate::scorer::JobScorer;
use crate::store::JobStore;

/// Outcome of one run: closed statistics plus the ordered matches that
/// were handed downstream.
#[derive(Debug)]
pub struct RunReport {
    pub run: PipelineRun,
    pub matches: Vec<(JobPosting, ScoreResult)>,
}

/// Drives the staged pipeline over injected components.
pub struct Orchestrator {
    config: Config,
    parser: ListingParser,
    scorer: JobScorer,
    source: Arc<dyn PageSource>,
    store: Arc<dyn JobStore>,
    handoff: Box<dyn Handoff>,
    force_rescore: bool,
}

impl Orchestrator {
    /// Build an orchestrator, validating config and profile up front.
    ///
    /// Invalid weights or a malformed profile abort here, before any
    /// network activity.
    pub fn new(
        config: Config,
        profile: Profile,
        source: Arc<dyn PageSource>,
        store: Arc<dyn JobStore>,
        handoff: Box<dyn Handoff>,
    ) -> Result<Self> {
        config.validate()?;
        profile.validate()?;

        let parser = ListingParser::new(&config.selectors)?;
        let scorer = JobScorer::new(profile, config.scoring.clone());

        Ok(Self {
            config,
            parser,
            scorer,
            source,
            store,
            handoff,
            force_rescore: false,
        })
    }

    /// Rescore already-finalized jobs on the next run.
    pub fn with_force_rescore(mut self, force: bool) -> Self {
        self.force_rescore = force;
        self
    }

    /// Execute one run.
    pub async fn run(&self, query: &str) -> Result<RunReport> {
        let mut run = PipelineRun::begin();
        log::info!("{}: starting run for '{query}'", run.run_id);

        self.ingest(query, &mut run).await;
        let matches = self.score_pending(&mut run).await;

        if let Err(e) = self.handoff.deliver(&matches).await {
            run.record_failure(format!("handoff: {e}"));
        }

        run.finish();
        for (key, value) in run.summary_items() {
            log::info!("{}: {key}: {value}", run.run_id);
        }
        for reason in &run.failures {
            log::warn!("{}: failure: {reason}", run.run_id);
        }

        Ok(RunReport { run, matches })
    }

    /// Repeat runs at the configured interval. Per-cycle failures are
    /// logged; only fatal errors end the loop.
    pub async fn run_recurring(&self, query: &str) -> Result<()> {
        let interval = Duration::from_secs(self.config.run.interval_hours * 3600);
        loop {
            match self.run(query).await {
                Ok(report) => log::info!(
                    "{}: cycle complete, {} match(es)",
                    report.run.run_id,
                    report.matches.len()
                ),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::error!("run cycle failed: {e}"),
            }
            log::info!(
                "next run in {}h",
                self.config.run.interval_hours
            );
            tokio::time::sleep(interval).await;
        }
    }

    /// Fetch and parse listing pages, upserting postings until the job cap.
    async fn ingest(&self, query: &str, run: &mut PipelineRun) {
        let page_range = 1..=self.config.fetcher.pages_per_run;
        let outcome = self.source.fetch(query, page_range).await;

        for event in &outcome.events {
            match &event.outcome {
                PageOutcome::Fetched => {}
                PageOutcome::Failed(reason) => {
                    run.record_failure(format!(
                        "page {} after {} attempt(s): {reason}",
                        event.page, event.attempts
                    ));
                }
                PageOutcome::Skipped(reason) => {
                    log::info!("page {} skipped: {reason}", event.page);
                }
            }
        }

        let cap = self.config.run.max_jobs_per_run;
        let mut pulled = 0usize;

        'pages: for page in &outcome.pages {
            let postings = self.parser.parse(page);
            if postings.is_empty() {
                run.record_failure(format!("page {}: no postings parsed", page.page));
                continue;
            }

            for posting in postings {
                if pulled >= cap {
                    log::info!("job cap of {cap} reached, stopping intake");
                    break 'pages;
                }
                pulled += 1;
                run.scraped += 1;

                match self.store.upsert(&posting).await {
                    Ok(outcome) if outcome.is_duplicate() => run.duplicates += 1,
                    Ok(_) => {}
                    Err(e) => run.record_failure(format!("job {}: {e}", posting.id)),
                }
            }
        }
    }

    /// Score pending jobs in batches and collect the ordered matches.
    async fn score_pending(&self, run: &mut PipelineRun) -> Vec<(JobPosting, ScoreResult)> {
        let candidates = if self.force_rescore {
            self.store.list_all().await
        } else {
            self.store.list_unscored().await
        };
        let candidates = match candidates {
            Ok(jobs) => jobs,
            Err(e) => {
                run.record_failure(format!("listing candidates: {e}"));
                return Vec::new();
            }
        };

        let mut matches = Vec::new();
        for batch in candidates.chunks(self.config.run.batch_size.max(1)) {
            for job in batch {
                match self.score_one(job).await {
                    Ok((result, passed)) => {
                        run.scored += 1;
                        if passed {
                            run.passed += 1;
                            matches.push((job.clone(), result));
                        }
                    }
                    Err(e) => run.record_failure(format!("scoring {}: {e}", job.id)),
                }
            }
            log::debug!("scored batch of {}", batch.len());
        }

        // Best score first; ties broken by id for stable output.
        matches.sort_by(|a, b| {
            b.1.overall_score
                .total_cmp(&a.1.overall_score)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        matches
    }

    /// Score one job: append the result, then advance the status through
    /// the gate. Isolated so one job's failure cannot touch its siblings.
    async fn score_one(&self, job: &JobPosting) -> Result<(ScoreResult, bool)> {
        let result = self.scorer.score(job);
        self.store.record_score(&result).await?;
        self.store.set_status(&job.id, JobStatus::Scored).await?;

        let passed = self.scorer.passes(&result);
        let status = if passed {
            JobStatus::Passed
        } else {
            JobStatus::Rejected
        };
        self.store.set_status(&job.id, status).await?;

        if !passed {
            if let Some(explanation) = &result.explanation {
                log::debug!("rejected: {explanation}");
            }
        }
        Ok((result, passed))
    }
}
