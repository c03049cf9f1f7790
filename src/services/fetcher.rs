// src/services/fetcher.rs

//! Puzzle fetcher service.
//!
//! Retrieves one day's payload from the upstream puzzle API and maps it into
//! the typed [`RawPuzzle`] shape. There are no retries here.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{EditionKey, RawPuzzle, SourceConfig, Stage};
use crate::services::FailureLog;
use crate::utils::date::format_iso_date;
use crate::utils::http::{ReqwestTransport, Transport, body_prefix, create_async_client};
use crate::utils::url::puzzle_json_url;

/// A parsed payload together with the URL it came from.
#[derive(Debug, Clone)]
pub struct FetchedPuzzle {
    pub puzzle: RawPuzzle,
    pub url: String,
}

/// Service for fetching puzzle payloads.
pub struct PuzzleFetcher {
    transport: Arc<dyn Transport>,
    source: SourceConfig,
    failures: FailureLog,
}

impl PuzzleFetcher {
    pub fn new(transport: Arc<dyn Transport>, source: SourceConfig, failures: FailureLog) -> Self {
        Self {
            transport,
            source,
            failures,
        }
    }

    /// Create a fetcher over a `reqwest` client built from the source config.
    pub fn from_config(source: &SourceConfig, failures: FailureLog) -> Result<Self> {
        let client = create_async_client(&source.user_agent, source.timeout_secs)?;
        Ok(Self::new(
            Arc::new(ReqwestTransport::new(client)),
            source.clone(),
            failures,
        ))
    }

    /// Fetch and parse the payload for one edition.
    ///
    /// Every failure is recorded (stage `fetch` or `parse`) before it is
    /// returned.
    pub async fn fetch(&self, key: &EditionKey) -> Result<FetchedPuzzle> {
        let url = puzzle_json_url(&self.source.endpoint, key.puzzle_date);
        log::info!("Fetching {} from {}", key, url);

        let response = match self
            .transport
            .get(&url, self.source.auth_cookie.as_deref())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.failures
                    .record(
                        &key.source_slug,
                        key.puzzle_date,
                        Stage::Fetch,
                        &e.to_string(),
                        Some(serde_json::json!({ "url": url })),
                    )
                    .await;
                return Err(e);
            }
        };

        if !response.is_success() {
            let error = AppError::Fetch {
                status: response.status,
                url: url.clone(),
                body_prefix: body_prefix(&response.body),
            };
            self.failures.record_error(key, Stage::Fetch, &error).await;
            return Err(error);
        }

        let puzzle = match RawPuzzle::from_json(&response.body) {
            Ok(puzzle) => puzzle,
            Err(e) => {
                self.failures
                    .record(
                        &key.source_slug,
                        key.puzzle_date,
                        Stage::Parse,
                        &e.to_string(),
                        Some(serde_json::json!({
                            "url": url,
                            "body_prefix": body_prefix(&response.body),
                        })),
                    )
                    .await;
                return Err(e);
            }
        };

        Self::check_publication_date(key, &puzzle);
        log::debug!("Fetched {} clues for {}", puzzle.clues.len(), key);

        Ok(FetchedPuzzle { puzzle, url })
    }

    /// Warn when the payload claims a different publication day.
    fn check_publication_date(key: &EditionKey, puzzle: &RawPuzzle) {
        if let Some(published) = puzzle.publication_date.as_deref() {
            let expected = format_iso_date(key.puzzle_date);
            if !published.starts_with(&expected) {
                log::warn!(
                    "Payload for {} reports publicationDate {}",
                    key,
                    published
                );
            }
        }
    }
}
