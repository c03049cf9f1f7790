//! Shared harness for pipeline integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use xword_ingest::error::Result;
use xword_ingest::models::{EditionKey, SourceConfig};
use xword_ingest::pipeline::Ingestor;
use xword_ingest::storage::InMemoryStore;
use xword_ingest::utils::http::{Transport, TransportResponse};

pub const ENDPOINT: &str = "https://puzzles.example/api/daily";
pub const SLUG: &str = "daily";

/// Number of applicable clues in the fixture payload.
pub const FIXTURE_CLUES: usize = 10;

const FIXTURE: &str = include_str!("../fixtures/puzzle.json");

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

pub fn key(day: u32) -> EditionKey {
    EditionKey::new(SLUG, date(day))
}

/// Fixture payload as JSON, for tests that need to alter it.
pub fn fixture_value() -> Value {
    serde_json::from_str(FIXTURE).unwrap()
}

/// Upstream stand-in serving the fixture for every date unless told otherwise.
#[derive(Default)]
pub struct ScriptedTransport {
    overrides: Mutex<HashMap<String, TransportResponse>>,
    payload: Mutex<Option<String>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `payload` instead of the fixture for every date.
    pub fn with_payload(self, payload: &Value) -> Self {
        *self.payload.lock().unwrap() = Some(payload.to_string());
        self
    }

    /// Answer requests for `date` with the given status and body.
    pub fn respond(self, date: NaiveDate, status: u16, body: &str) -> Self {
        self.overrides.lock().unwrap().insert(
            date.format("%Y-%m-%d").to_string(),
            TransportResponse {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, _cookie: Option<&str>) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(url.to_string());

        let date = url
            .rsplit('/')
            .next()
            .and_then(|file| file.strip_suffix(".json"))
            .unwrap_or_default()
            .to_string();

        if let Some(response) = self.overrides.lock().unwrap().get(&date) {
            return Ok(response.clone());
        }

        let payload = self
            .payload
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| FIXTURE.to_string());
        Ok(TransportResponse {
            status: 200,
            body: payload.replace("__DATE__", &date),
        })
    }
}

pub fn source() -> SourceConfig {
    SourceConfig {
        slug: SLUG.to_string(),
        endpoint: ENDPOINT.to_string(),
        ..SourceConfig::default()
    }
}

/// Ingestor wired to an in-memory store and the given transport.
pub fn ingestor(transport: ScriptedTransport) -> (Ingestor, Arc<InMemoryStore>, Arc<ScriptedTransport>) {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(transport);
    let ingestor = Ingestor::with_transport(&source(), transport.clone(), store.clone());
    (ingestor, store, transport)
}
