//! PostgREST-style HTTP storage implementation.
//!
//! ## Endpoints
//!
//! ```text
//! DELETE {url}/rest/v1/{staging_table}?source_slug=eq.{slug}&puzzle_date=eq.{date}
//! POST   {url}/rest/v1/{staging_table}          (JSON array, one batch)
//! POST   {url}/rest/v1/rpc/{promote_rpc}        (body: {})
//! POST   {url}/rest/v1/{failure_table}          (one record)
//! ```
//!
//! Every request carries the service credential as both `apikey` and a
//! bearer token.

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, HeaderMap};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{EditionKey, IngestFailureRecord, StagedRow, StoreConfig};
use crate::storage::ClueStore;
use crate::utils::date::format_iso_date;
use crate::utils::http::{body_prefix, create_async_client};
use crate::utils::url::rest_url;

const USER_AGENT: &str = concat!("xword-ingest/", env!("CARGO_PKG_VERSION"));

/// HTTP data store backend.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    config: StoreConfig,
}

impl RestStore {
    /// Create a store over an existing client.
    pub fn new(client: Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    /// Create a store with its own client built from the config timeout.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let client = create_async_client(USER_AGENT, config.timeout_secs)?;
        Ok(Self::new(client, config.clone()))
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        rest_url(&self.config.url, &["rest", "v1", table])
    }

    fn rpc_url(&self, function: &str) -> Result<Url> {
        rest_url(&self.config.url, &["rest", "v1", "rpc", function])
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        operation: &str,
        url: Url,
        body: &T,
    ) -> Result<Response> {
        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;
        Self::check(operation, response).await
    }

    /// Turn a non-2xx response into [`AppError::Store`].
    async fn check(operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::store(operation, status.as_u16(), body_prefix(&body)))
    }
}

/// Total row count from a `Content-Range` header such as `*/42` or `0-9/42`.
fn content_range_total(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

/// Query filter selecting one edition's rows.
fn edition_filter(url: &mut Url, key: &EditionKey) {
    url.query_pairs_mut()
        .append_pair("source_slug", &format!("eq.{}", key.source_slug))
        .append_pair("puzzle_date", &format!("eq.{}", format_iso_date(key.puzzle_date)));
}

#[async_trait]
impl ClueStore for RestStore {
    async fn delete_staged(&self, key: &EditionKey) -> Result<usize> {
        let mut url = self.table_url(&self.config.staging_table)?;
        edition_filter(&mut url, key);

        let response = self
            .authorized(self.client.delete(url))
            .header("Prefer", "return=minimal,count=exact")
            .send()
            .await?;
        let response = Self::check("delete_staged", response).await?;
        Ok(content_range_total(response.headers()).unwrap_or(0))
    }

    async fn insert_staged(&self, rows: &[StagedRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let url = self.table_url(&self.config.staging_table)?;
        self.post_json("insert_staged", url, rows).await?;
        Ok(rows.len())
    }

    async fn promote(&self) -> Result<()> {
        let url = self.rpc_url(&self.config.promote_rpc)?;
        self.post_json("promote", url, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn append_failure(&self, record: &IngestFailureRecord) -> Result<()> {
        let url = self.table_url(&self.config.failure_table)?;
        self.post_json("append_failure", url, record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reqwest::header::HeaderValue;

    fn store() -> RestStore {
        let config = StoreConfig {
            url: "https://store.example".to_string(),
            service_key: "key".to_string(),
            ..StoreConfig::default()
        };
        RestStore::from_config(&config).unwrap()
    }

    #[test]
    fn test_table_and_rpc_urls() {
        let store = store();
        assert_eq!(
            store.table_url("clue_occurrences_staging").unwrap().as_str(),
            "https://store.example/rest/v1/clue_occurrences_staging"
        );
        assert_eq!(
            store.rpc_url("promote_staged_clues").unwrap().as_str(),
            "https://store.example/rest/v1/rpc/promote_staged_clues"
        );
    }

    #[test]
    fn test_edition_filter() {
        let mut url = store().table_url("staging").unwrap();
        let key = EditionKey::new("daily", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        edition_filter(&mut url, &key);
        assert_eq!(
            url.query(),
            Some("source_slug=eq.daily&puzzle_date=eq.2024-03-01")
        );
    }

    #[test]
    fn test_content_range_total() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_range_total(&headers), None);

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("*/42"));
        assert_eq!(content_range_total(&headers), Some(42));

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("0-9/10"));
        assert_eq!(content_range_total(&headers), Some(10));

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("*/*"));
        assert_eq!(content_range_total(&headers), None);
    }
}
