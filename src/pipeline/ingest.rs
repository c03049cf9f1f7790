// src/pipeline/ingest.rs

//! Single-date ingestion: fetch, build, stage, promote.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    Config, Direction, EditionKey, IngestPhase, IngestReport, PhaseTracker, SourceConfig,
    Stage,
};
use crate::pipeline::staging::{LoadOptions, StagingLoader};
use crate::services::{BuildOutcome, FailureLog, PuzzleFetcher, RowBuilder};
use crate::storage::ClueStore;
use crate::utils::http::Transport;

/// Flags for one single-date run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Fetch and build only; never touch staging or promotion
    pub dry_run: bool,
    /// Leave staged rows in place after promotion
    pub keep_staging: bool,
    /// Dump every built row and build failure
    pub debug: bool,
}

/// Runs the full pipeline for one source, one date at a time.
pub struct Ingestor {
    source_slug: String,
    fetcher: PuzzleFetcher,
    builder: RowBuilder,
    loader: StagingLoader,
    failures: FailureLog,
}

impl Ingestor {
    /// Assemble an ingestor from an existing fetcher and store.
    pub fn new(source: &SourceConfig, fetcher: PuzzleFetcher, store: Arc<dyn ClueStore>) -> Self {
        let failures = FailureLog::new(Arc::clone(&store));
        Self {
            source_slug: source.slug.clone(),
            fetcher,
            builder: RowBuilder::new(source),
            loader: StagingLoader::new(store, failures.clone()),
            failures,
        }
    }

    /// Ingestor over a custom transport, e.g. a recorded or scripted one.
    pub fn with_transport(
        source: &SourceConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn ClueStore>,
    ) -> Self {
        let fetcher = PuzzleFetcher::new(
            transport,
            source.clone(),
            FailureLog::new(Arc::clone(&store)),
        );
        Self::new(source, fetcher, store)
    }

    /// Ingestor fetching over HTTP as configured.
    pub fn from_config(config: &Config, store: Arc<dyn ClueStore>) -> Result<Self> {
        let fetcher = PuzzleFetcher::from_config(&config.source, FailureLog::new(Arc::clone(&store)))?;
        Ok(Self::new(&config.source, fetcher, store))
    }

    pub fn source_slug(&self) -> &str {
        &self.source_slug
    }

    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// Ingest one date.
    ///
    /// Either every applicable clue of the puzzle is promoted or nothing is
    /// written at all; any failed clue aborts the date before staging.
    pub async fn ingest_date(&self, date: NaiveDate, options: IngestOptions) -> Result<IngestReport> {
        let key = EditionKey::new(self.source_slug.clone(), date);
        let mut tracker = PhaseTracker::new(key.clone());

        let fetched = match self.fetcher.fetch(&key).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracker.fail();
                return Err(e);
            }
        };

        tracker.advance(IngestPhase::Building);
        let outcome = self.builder.build(&key, &fetched.puzzle, &fetched.url);
        let (expected, built) = (outcome.expected, outcome.rows.len());
        self.report_build(&key, &outcome, options.debug);

        let build_details = (!outcome.is_complete()).then(|| {
            serde_json::json!({
                "expected": expected,
                "built": built,
                "failures": outcome.failures,
            })
        });

        let rows = match outcome.into_complete() {
            Ok(rows) => rows,
            Err(e) => {
                self.failures
                    .record(&key.source_slug, date, Stage::BuildRows, &e.to_string(), build_details)
                    .await;
                tracker.fail();
                return Err(e);
            }
        };

        if options.dry_run {
            log::info!(
                "Dry run for {}: {} of {} clues built, nothing staged",
                key,
                built,
                expected
            );
            tracker.advance(IngestPhase::Done);
            return Ok(IngestReport {
                key,
                expected,
                built,
                inserted: 0,
                dry_run: true,
                phase: tracker.phase(),
            });
        }

        let load_options = LoadOptions {
            keep_staging: options.keep_staging,
        };
        let loaded = match self
            .loader
            .load_tracked(&key, &rows, load_options, &mut tracker)
            .await
        {
            Ok(loaded) => loaded,
            Err(e) => {
                tracker.fail();
                return Err(e);
            }
        };

        log::info!("Ingested {}: {} clues promoted", key, loaded.inserted);
        Ok(IngestReport {
            key,
            expected,
            built,
            inserted: loaded.inserted,
            dry_run: false,
            phase: tracker.phase(),
        })
    }

    fn report_build(&self, key: &EditionKey, outcome: &BuildOutcome, debug: bool) {
        log::info!(
            "Built {} of {} clues for {}",
            outcome.rows.len(),
            outcome.expected,
            key
        );
        for failure in &outcome.failures {
            log::warn!(
                "Clue {} ({}) \"{}\" failed: {}",
                failure.label,
                failure.direction,
                failure.text,
                failure.reason
            );
        }
        if debug {
            for row in &outcome.rows {
                log::info!(
                    "  {}{} {} [{}] {} ({})",
                    row.number,
                    match row.direction {
                        Direction::Across => "A",
                        Direction::Down => "D",
                    },
                    row.answer,
                    row.enumeration,
                    row.clue_text,
                    row.slug_readable
                );
            }
        }
    }
}
