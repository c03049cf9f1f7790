//! Service layer for the ingestion pipeline.
//!
//! This module contains the business logic for:
//! - Failure recording (`FailureLog`)
//! - Payload retrieval (`PuzzleFetcher`)
//! - Clue row construction (`RowBuilder`)

mod builder;
mod failures;
mod fetcher;

pub use builder::{BuildOutcome, RowBuilder};
pub use failures::FailureLog;
pub use fetcher::{FetchedPuzzle, PuzzleFetcher};
