// src/services/failures.rs

//! Failure log service.
//!
//! Records ingestion failures to the store's failure table. Recording never
//! fails from the caller's point of view: a rejected detailed write is retried
//! in minimal form, and if that is rejected too only a local warning remains.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{EditionKey, IngestFailureRecord, Stage};
use crate::storage::ClueStore;

/// Process-wide failure sink.
#[derive(Clone)]
pub struct FailureLog {
    store: Arc<dyn ClueStore>,
}

impl FailureLog {
    pub fn new(store: Arc<dyn ClueStore>) -> Self {
        Self { store }
    }

    /// Record one failure. Never returns an error.
    pub async fn record(
        &self,
        source_slug: &str,
        puzzle_date: NaiveDate,
        stage: Stage,
        message: &str,
        details: Option<serde_json::Value>,
    ) {
        let record = IngestFailureRecord::new(source_slug, puzzle_date, stage, message, details);

        let full_error = match self.store.append_failure(&record).await {
            Ok(()) => return,
            Err(e) => e,
        };
        log::debug!("Detailed failure write rejected ({full_error}); retrying minimal form");

        if let Err(minimal_error) = self.store.append_failure(&record.minimal()).await {
            log::warn!(
                "Could not record {} failure for {}@{}: {} (minimal write: {})",
                stage,
                source_slug,
                puzzle_date,
                full_error,
                minimal_error
            );
        }
    }

    /// Record an error against an edition, carrying the error's own details.
    pub async fn record_error(&self, key: &EditionKey, stage: Stage, error: &AppError) {
        self.record(
            &key.source_slug,
            key.puzzle_date,
            stage,
            &error.to_string(),
            error.details(),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_record_with_details() {
        let store = Arc::new(InMemoryStore::new());
        let log = FailureLog::new(store.clone());

        log.record(
            "daily",
            date(),
            Stage::Fetch,
            "HTTP 404",
            Some(serde_json::json!({ "status": 404 })),
        )
        .await;

        let failures = store.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, Stage::Fetch);
        assert_eq!(failures[0].details, Some(serde_json::json!({ "status": 404 })));
    }

    #[tokio::test]
    async fn test_falls_back_to_minimal_write() {
        let store = Arc::new(InMemoryStore::new());
        store.reject_failure_details(true);
        let log = FailureLog::new(store.clone());

        log.record(
            "daily",
            date(),
            Stage::Parse,
            "no clues",
            Some(serde_json::json!({ "clues": 0 })),
        )
        .await;

        let failures = store.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].details.is_none());
        assert_eq!(failures[0].message, "no clues");
        assert_eq!(store.call_counts().append_failure, 2);
    }

    #[tokio::test]
    async fn test_swallows_total_sink_failure() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_failure_writes(true);
        let log = FailureLog::new(store.clone());

        log.record("daily", date(), Stage::RpcPromote, "boom", None).await;

        assert!(store.failures().is_empty());
        assert_eq!(store.call_counts().append_failure, 2);
    }
}
