//! # Crawl Coordinator
//!
//! Drives a [`Traverser`] over the root and feeds every file to the
//! [`FetchOrchestrator`], one at a time, tallying the outcomes.
//!
//! Per-file failures are logged and counted; only an inaccessible root
//! ends the crawl early.

use crate::error::Result;
use crate::orchestrator::{FetchOrchestrator, FetchOutcome, SkipReason};
use crate::traverser::Traverser;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::instrument::WithSubscriber;
use tracing::{error, info, warn};

/// Tally of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Lyrics files downloaded this run
    pub fetched: usize,
    /// Lookups that found nothing and went to the ledger
    pub not_found: usize,
    /// Skipped files per reason
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Files or directories that failed
    pub errors: usize,
}

impl CrawlSummary {
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Fetched(_) => self.fetched += 1,
            FetchOutcome::NotFound => self.not_found += 1,
            FetchOutcome::Skipped(reason) => *self.skipped.entry(*reason).or_default() += 1,
        }
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or_default()
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

pub struct CrawlCoordinator {
    orchestrator: FetchOrchestrator,
}

impl CrawlCoordinator {
    pub fn new(orchestrator: FetchOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Crawl `root` and return the tally.
    ///
    /// # Errors
    ///
    /// [`crate::SyncError::RootInaccessible`] when `root` cannot be read.
    pub async fn run(&mut self, root: &Path) -> Result<CrawlSummary> {
        let dispatch = self.orchestrator.dispatch().clone();
        let traverser = Traverser::new(root, dispatch.clone())?;

        self.crawl(root, traverser).with_subscriber(dispatch).await
    }

    async fn crawl(&mut self, root: &Path, traverser: Traverser) -> Result<CrawlSummary> {
        info!(root = %root.display(), "Starting crawl");

        let mut summary = CrawlSummary::default();

        for entry in traverser {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory");
                    summary.errors += 1;
                    continue;
                }
            };

            match self.orchestrator.evaluate(&path).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to process file");
                    summary.errors += 1;
                }
            }
        }

        info!(
            fetched = summary.fetched,
            not_found = summary.not_found,
            skipped = summary.total_skipped(),
            errors = summary.errors,
            "Crawl complete"
        );

        Ok(summary)
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }
}
