//! Storage abstractions for staged and promoted clue rows.
//!
//! Every backend exposes the same persistence boundary:
//!
//! ```text
//! staging (transient)        permanent store
//! ┌──────────────────┐  promote  ┌──────────────────┐
//! │ rows keyed by    │ ────────▶ │ one edition per  │
//! │ (source, date)   │           │ (source, date)   │
//! └──────────────────┘           └──────────────────┘
//! failure log: append-only, written independently of both
//! ```
//!
//! - `RestStore`: PostgREST-style HTTP data store (production)
//! - `LocalStore`: JSON files on disk (development)
//! - `InMemoryStore`: in-process maps with fault injection (tests)

pub mod local;
pub mod memory;
pub mod rest;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EditionKey, IngestFailureRecord, StagedRow};

// Re-export for convenience
pub use local::LocalStore;
pub use memory::InMemoryStore;
pub use rest::RestStore;

/// Trait for clue storage backends.
#[async_trait]
pub trait ClueStore: Send + Sync {
    /// Remove staged rows for one edition. Returns how many were removed,
    /// when the backend can tell.
    async fn delete_staged(&self, key: &EditionKey) -> Result<usize>;

    /// Insert rows into staging as a single batch write.
    async fn insert_staged(&self, rows: &[StagedRow]) -> Result<usize>;

    /// Merge everything currently staged into the permanent store.
    async fn promote(&self) -> Result<()>;

    /// Append one record to the failure log.
    async fn append_failure(&self, record: &IngestFailureRecord) -> Result<()>;
}
