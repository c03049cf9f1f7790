// src/models/mod.rs

//! Domain models for the ingestion pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod clue;
mod config;
mod failure;
mod puzzle;
mod report;

// Re-export all public types
pub use clue::{ClueBuildFailure, ClueOccurrence, Direction, ENUMERATION_DERIVED, EditionKey, StagedRow};
pub use config::{
    Config, ENV_PUZZLE_AUTH_COOKIE, ENV_STORE_SERVICE_KEY, ENV_STORE_URL, IngestConfig,
    LoggingConfig, SourceConfig, StoreConfig,
};
pub use failure::{IngestFailureRecord, Stage};
pub use puzzle::{PuzzleDocument, RawCell, RawClue, RawPuzzle, RichText, StringOrNumber};
pub use report::{IngestPhase, IngestReport, PhaseTracker};
