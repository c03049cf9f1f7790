//! Failure log records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Parse,
    BuildRows,
    DeleteStaging,
    InsertStaging,
    RpcPromote,
    CleanupStaging,
    RangeIngest,
}

impl Stage {
    /// Stable name written to the failure table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::BuildRows => "build_rows",
            Stage::DeleteStaging => "delete_staging",
            Stage::InsertStaging => "insert_staging",
            Stage::RpcPromote => "rpc_promote",
            Stage::CleanupStaging => "cleanup_staging",
            Stage::RangeIngest => "range_ingest",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only failure log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFailureRecord {
    pub source_slug: String,
    pub puzzle_date: NaiveDate,
    pub stage: Stage,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl IngestFailureRecord {
    pub fn new(
        source_slug: impl Into<String>,
        puzzle_date: NaiveDate,
        stage: Stage,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            source_slug: source_slug.into(),
            puzzle_date,
            stage,
            message: message.into(),
            details,
            occurred_at: Some(Utc::now()),
        }
    }

    /// Reduced form for tables that only carry the core columns.
    pub fn minimal(&self) -> Self {
        Self {
            details: None,
            occurred_at: None,
            ..self.clone()
        }
    }
}
