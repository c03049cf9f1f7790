//! Clue occurrence records produced by the row builder.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Value of `enumeration_source` for enumerations computed from the answer.
pub const ENUMERATION_DERIVED: &str = "derived";

/// Clue direction within the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// Normalize a raw direction string, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Across => "across",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one puzzle edition: a source on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditionKey {
    pub source_slug: String,
    pub puzzle_date: NaiveDate,
}

impl EditionKey {
    pub fn new(source_slug: impl Into<String>, puzzle_date: NaiveDate) -> Self {
        Self {
            source_slug: source_slug.into(),
            puzzle_date,
        }
    }
}

impl fmt::Display for EditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.source_slug, self.puzzle_date)
    }
}

/// A normalized clue built in memory, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueOccurrence {
    pub source_slug: String,
    pub puzzle_date: NaiveDate,
    pub number: u32,
    pub direction: Direction,
    pub clue_text: String,
    /// Uppercase letters only
    pub answer: String,
    /// Word lengths of the raw answer, e.g. "3,5"
    pub enumeration: String,
    pub source_url: String,
    pub slug_md5: String,
    pub slug_readable: String,
}

/// A raw clue that could not be turned into a [`ClueOccurrence`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClueBuildFailure {
    pub label: String,
    pub direction: String,
    pub text: String,
    pub reason: String,
}

/// Row shape of the staging table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRow {
    pub source_slug: String,
    pub puzzle_date: NaiveDate,
    pub number: u32,
    pub direction: Direction,
    pub clue_text: String,
    pub answer: String,
    pub enumeration: String,
    pub enumeration_source: String,
    pub source_url: String,
    pub slug_readable: String,
    pub slug_md5: String,
    pub inserted_at: DateTime<Utc>,
}

impl StagedRow {
    pub fn from_occurrence(clue: &ClueOccurrence, inserted_at: DateTime<Utc>) -> Self {
        Self {
            source_slug: clue.source_slug.clone(),
            puzzle_date: clue.puzzle_date,
            number: clue.number,
            direction: clue.direction,
            clue_text: clue.clue_text.clone(),
            answer: clue.answer.clone(),
            enumeration: clue.enumeration.clone(),
            enumeration_source: ENUMERATION_DERIVED.to_string(),
            source_url: clue.source_url.clone(),
            slug_readable: clue.slug_readable.clone(),
            slug_md5: clue.slug_md5.clone(),
            inserted_at,
        }
    }

    pub fn key(&self) -> EditionKey {
        EditionKey::new(self.source_slug.clone(), self.puzzle_date)
    }
}
