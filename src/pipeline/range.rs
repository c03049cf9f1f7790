// src/pipeline/range.rs

//! Date-range ingestion with per-date failure isolation.

use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{IngestReport, Stage};
use crate::pipeline::ingest::{IngestOptions, Ingestor};
use crate::utils::date::date_range;
use crate::utils::log;

/// Result of ingesting one date within a range.
#[derive(Debug)]
pub struct DateOutcome {
    pub date: NaiveDate,
    pub result: std::result::Result<IngestReport, AppError>,
}

impl DateOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-date outcomes of a range run, in date order.
#[derive(Debug, Default)]
pub struct RangeSummary {
    pub outcomes: Vec<DateOutcome>,
}

impl RangeSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> Vec<&DateOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    /// Process exit status: 0 when every date succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.failed().is_empty() { 0 } else { 1 }
    }

    /// Print the run summary, listing every failed date with its reason.
    pub fn print(&self) {
        log::summary(
            "Range ingest",
            &[
                ("Dates", self.total().to_string()),
                ("Succeeded", self.succeeded().to_string()),
                ("Failed", self.failed().len().to_string()),
            ],
        );
        for outcome in self.failed() {
            if let Err(e) = &outcome.result {
                log::failure(&format!("{}: {}", outcome.date, e));
            }
        }
    }
}

/// Ingests every date of an inclusive range, strictly in order.
pub struct RangeRunner<'a> {
    ingestor: &'a Ingestor,
    delay: Duration,
    options: IngestOptions,
}

impl<'a> RangeRunner<'a> {
    pub fn new(ingestor: &'a Ingestor, delay_ms: u64) -> Self {
        Self {
            ingestor,
            delay: Duration::from_millis(delay_ms),
            options: IngestOptions::default(),
        }
    }

    /// Options applied to every date.
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    /// Ingest every date from `start` to `end` inclusive.
    ///
    /// A failing date is recorded under stage `range_ingest` and the run moves
    /// on. Only an invalid range is returned as an error.
    pub async fn run(&self, start: NaiveDate, end: NaiveDate) -> Result<RangeSummary> {
        let dates = date_range(start, end)?;
        let total = dates.len();
        let mut summary = RangeSummary::default();

        log::header(&format!(
            "Ingesting {} from {} to {} ({} dates)",
            self.ingestor.source_slug(),
            start,
            end,
            total
        ));

        for (index, date) in dates.into_iter().enumerate() {
            log::step(index + 1, total, &date.to_string());

            let result = self.ingestor.ingest_date(date, self.options).await;
            match &result {
                Ok(report) => log::sub_item(&format!(
                    "{}: {} clues ({})",
                    date, report.inserted, report.phase
                )),
                Err(e) => {
                    ::log::error!("Ingest failed for {}: {}", date, e);
                    self.ingestor
                        .failures()
                        .record(
                            self.ingestor.source_slug(),
                            date,
                            Stage::RangeIngest,
                            &e.to_string(),
                            e.details(),
                        )
                        .await;
                }
            }
            summary.outcomes.push(DateOutcome { date, result });

            if index + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EditionKey, IngestPhase};

    fn outcome(day: u32, ok: bool) -> DateOutcome {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let result = if ok {
            Ok(IngestReport {
                key: EditionKey::new("daily", date),
                expected: 10,
                built: 10,
                inserted: 10,
                dry_run: false,
                phase: IngestPhase::Done,
            })
        } else {
            Err(AppError::parse("no clues"))
        };
        DateOutcome { date, result }
    }

    #[test]
    fn test_summary_counts_and_exit_code() {
        let summary = RangeSummary {
            outcomes: vec![outcome(1, true), outcome(2, false), outcome(3, true)],
        };
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed().len(), 1);
        assert_eq!(summary.failed()[0].date.to_string(), "2024-03-02");
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_all_success_exits_zero() {
        let summary = RangeSummary {
            outcomes: vec![outcome(1, true)],
        };
        assert_eq!(summary.exit_code(), 0);
    }
}
