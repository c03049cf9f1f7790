// src/pipeline/staging.rs

//! Staging loader: clear, insert, promote, clean up.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{ClueOccurrence, EditionKey, IngestPhase, PhaseTracker, Stage, StagedRow};
use crate::services::FailureLog;
use crate::storage::ClueStore;

/// Options for a staging load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Leave staged rows in place after a successful promotion
    pub keep_staging: bool,
}

/// Counts from a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadResult {
    pub inserted: usize,
    /// Stale staged rows removed before the insert
    pub cleared: usize,
}

/// Writes one edition's rows through staging into the permanent store.
///
/// The loader assumes it is the only writer for the edition's staging key.
pub struct StagingLoader {
    store: Arc<dyn ClueStore>,
    failures: FailureLog,
}

impl StagingLoader {
    pub fn new(store: Arc<dyn ClueStore>, failures: FailureLog) -> Self {
        Self { store, failures }
    }

    /// Load rows for `key`. See [`StagingLoader::load_tracked`].
    pub async fn load(
        &self,
        key: &EditionKey,
        rows: &[ClueOccurrence],
        options: LoadOptions,
    ) -> Result<LoadResult> {
        let mut tracker = PhaseTracker::new(key.clone());
        tracker.advance(IngestPhase::Building);
        self.load_tracked(key, rows, options, &mut tracker).await
    }

    /// Load rows for `key`, reporting phase changes to `tracker`.
    ///
    /// Steps, in order: delete stale staged rows, insert the batch, promote,
    /// and unless `keep_staging` is set delete the staged rows again. Each
    /// failing step is recorded under its own stage. When promotion fails
    /// the staged rows are left in place for inspection.
    pub async fn load_tracked(
        &self,
        key: &EditionKey,
        rows: &[ClueOccurrence],
        options: LoadOptions,
        tracker: &mut PhaseTracker,
    ) -> Result<LoadResult> {
        tracker.advance(IngestPhase::Staging);

        let cleared = match self.store.delete_staged(key).await {
            Ok(cleared) => cleared,
            Err(e) => return Err(self.staging_failure(key, Stage::DeleteStaging, e).await),
        };
        if cleared > 0 {
            log::info!("Cleared {} stale staged rows for {}", cleared, key);
        }

        let inserted_at = Utc::now();
        let staged: Vec<StagedRow> = rows
            .iter()
            .map(|row| StagedRow::from_occurrence(row, inserted_at))
            .collect();

        let inserted = match self.store.insert_staged(&staged).await {
            Ok(inserted) => inserted,
            Err(e) => return Err(self.staging_failure(key, Stage::InsertStaging, e).await),
        };
        log::info!("Staged {} rows for {}", inserted, key);

        tracker.advance(IngestPhase::Promoting);
        if let Err(e) = self.store.promote().await {
            self.failures.record_error(key, Stage::RpcPromote, &e).await;
            log::warn!("Promotion failed for {}; staged rows left in place", key);
            return Err(AppError::Promotion(e.to_string()));
        }
        log::info!("Promoted staged rows for {}", key);

        if options.keep_staging {
            log::info!("Keeping staged rows for {}", key);
        } else {
            tracker.advance(IngestPhase::CleaningUp);
            if let Err(e) = self.store.delete_staged(key).await {
                return Err(self.staging_failure(key, Stage::CleanupStaging, e).await);
            }
        }

        tracker.advance(IngestPhase::Done);
        Ok(LoadResult { inserted, cleared })
    }

    async fn staging_failure(&self, key: &EditionKey, stage: Stage, error: AppError) -> AppError {
        self.failures.record_error(key, stage, &error).await;
        AppError::staging(stage, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use crate::storage::InMemoryStore;
    use chrono::NaiveDate;

    fn key() -> EditionKey {
        EditionKey::new("daily", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn rows(count: u32) -> Vec<ClueOccurrence> {
        (1..=count)
            .map(|n| ClueOccurrence {
                source_slug: "daily".to_string(),
                puzzle_date: key().puzzle_date,
                number: n,
                direction: Direction::Across,
                clue_text: format!("Clue {n}"),
                answer: "ABC".to_string(),
                enumeration: "3".to_string(),
                source_url: String::new(),
                slug_md5: format!("md5-{n}"),
                slug_readable: format!("clue-{n}"),
            })
            .collect()
    }

    fn loader() -> (StagingLoader, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let loader = StagingLoader::new(store.clone(), FailureLog::new(store.clone()));
        (loader, store)
    }

    #[tokio::test]
    async fn test_load_promotes_and_clears_staging() {
        let (loader, store) = loader();
        let result = loader
            .load(&key(), &rows(3), LoadOptions::default())
            .await
            .unwrap();

        assert_eq!(result.inserted, 3);
        assert_eq!(store.promoted(&key()).len(), 3);
        assert!(store.staged(&key()).is_empty());
        assert_eq!(store.call_counts().delete_staged, 2);
    }

    #[tokio::test]
    async fn test_keep_staging() {
        let (loader, store) = loader();
        loader
            .load(&key(), &rows(2), LoadOptions { keep_staging: true })
            .await
            .unwrap();

        assert_eq!(store.staged(&key()).len(), 2);
        assert_eq!(store.call_counts().delete_staged, 1);
    }

    #[tokio::test]
    async fn test_reload_clears_previous_staging() {
        let (loader, store) = loader();
        let options = LoadOptions { keep_staging: true };
        loader.load(&key(), &rows(4), options).await.unwrap();
        let second = loader.load(&key(), &rows(4), options).await.unwrap();

        assert_eq!(second.cleared, 4);
        assert_eq!(store.staged(&key()).len(), 4);
        assert_eq!(store.promoted(&key()).len(), 4);
    }

    #[tokio::test]
    async fn test_insert_failure() {
        let (loader, store) = loader();
        store.fail_inserts(true);

        let err = loader
            .load(&key(), &rows(2), LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::StagingWrite {
                stage: Stage::InsertStaging,
                ..
            }
        ));
        assert_eq!(store.call_counts().promote, 0);
        assert_eq!(store.failures()[0].stage, Stage::InsertStaging);
    }

    #[tokio::test]
    async fn test_promotion_failure_keeps_staged_rows() {
        let (loader, store) = loader();
        store.fail_promotion(true);

        let mut tracker = PhaseTracker::new(key());
        tracker.advance(IngestPhase::Building);
        let err = loader
            .load_tracked(&key(), &rows(2), LoadOptions::default(), &mut tracker)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Promotion(_)));
        assert_eq!(tracker.phase(), IngestPhase::Promoting);
        assert_eq!(store.staged(&key()).len(), 2);
        assert!(store.promoted(&key()).is_empty());
        assert_eq!(store.failures()[0].stage, Stage::RpcPromote);
    }
}
