// src/services/builder.rs

//! Row builder service.
//!
//! Turns a raw puzzle into normalized clue occurrences. Each clue is built
//! independently; a clue that cannot be built is collected as a
//! [`ClueBuildFailure`] and does not affect its neighbours. Whether a
//! partially built puzzle may be staged is decided by the caller through
//! [`BuildOutcome::into_complete`].

use crate::error::{AppError, Result};
use crate::models::{
    ClueBuildFailure, ClueOccurrence, Direction, EditionKey, RawCell, RawClue, RawPuzzle,
    SourceConfig,
};
use crate::utils::slug::{derive_enumeration, normalize_answer, plain_text, slug_md5, slug_readable};
use crate::utils::url::render_puzzle_url;

/// Rows and failures produced from one puzzle.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub rows: Vec<ClueOccurrence>,
    pub failures: Vec<ClueBuildFailure>,
    /// Raw clues that passed the applicability filter
    pub expected: usize,
}

impl BuildOutcome {
    /// True when every applicable clue produced a row.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.rows.len() == self.expected
    }

    /// Release the rows only if the puzzle was built completely.
    pub fn into_complete(self) -> Result<Vec<ClueOccurrence>> {
        if self.is_complete() {
            Ok(self.rows)
        } else {
            Err(AppError::BatchAbort {
                expected: self.expected,
                built: self.rows.len(),
                failures: self.failures.len(),
            })
        }
    }
}

/// Builds clue occurrences for one source.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    puzzle_url_template: String,
}

impl RowBuilder {
    pub fn new(source: &SourceConfig) -> Self {
        Self {
            puzzle_url_template: source.puzzle_url.clone(),
        }
    }

    /// Build every applicable clue of `puzzle`.
    ///
    /// `fetch_url` becomes the rows' `source_url` when no public link
    /// template is configured.
    pub fn build(&self, key: &EditionKey, puzzle: &RawPuzzle, fetch_url: &str) -> BuildOutcome {
        let source_url = self.source_url(key, puzzle, fetch_url);
        let applicable: Vec<&RawClue> = puzzle.clues.iter().filter(|c| is_applicable(c)).collect();

        let mut outcome = BuildOutcome {
            expected: applicable.len(),
            ..BuildOutcome::default()
        };

        for clue in applicable {
            match build_one(key, clue, &puzzle.cells, &source_url) {
                Ok(row) => outcome.rows.push(row),
                Err(reason) => outcome.failures.push(ClueBuildFailure {
                    label: clue.label_str(),
                    direction: clue.direction_str().to_string(),
                    text: clue_text(clue),
                    reason,
                }),
            }
        }

        outcome
    }

    fn source_url(&self, key: &EditionKey, puzzle: &RawPuzzle, fetch_url: &str) -> String {
        if self.puzzle_url_template.trim().is_empty() {
            return fetch_url.to_string();
        }
        render_puzzle_url(
            &self.puzzle_url_template,
            key.puzzle_date,
            puzzle.id_str().as_deref(),
        )
    }
}

/// Clues missing a direction, label, or text are not counted at all.
fn is_applicable(clue: &RawClue) -> bool {
    !clue.direction_str().trim().is_empty()
        && !clue.label_str().trim().is_empty()
        && !clue_text(clue).is_empty()
}

/// Plain text of the first rich-text run.
fn clue_text(clue: &RawClue) -> String {
    let Some(run) = clue.text.first() else {
        return String::new();
    };
    match run.plain.as_deref().map(str::trim) {
        Some(plain) if !plain.is_empty() => plain.to_string(),
        _ => run.formatted.as_deref().map(plain_text).unwrap_or_default(),
    }
}

/// Leading integer of a label such as `"5D"`.
fn parse_label_number(label: &str) -> Option<u32> {
    let digits: String = label
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|n| *n > 0)
}

/// Explicit answer when present, otherwise the letters of the referenced cells.
fn resolve_answer(clue: &RawClue, cells: &[RawCell]) -> std::result::Result<String, String> {
    if let Some(answer) = clue.answer.as_deref() {
        if !answer.trim().is_empty() {
            return Ok(answer.to_string());
        }
    }

    let mut letters = String::new();
    for &index in &clue.cells {
        let cell = cells
            .get(index)
            .ok_or_else(|| format!("cell index {index} out of range ({} cells)", cells.len()))?;
        letters.push_str(cell.answer.as_deref().unwrap_or(""));
    }
    Ok(letters)
}

fn build_one(
    key: &EditionKey,
    clue: &RawClue,
    cells: &[RawCell],
    source_url: &str,
) -> std::result::Result<ClueOccurrence, String> {
    let label = clue.label_str();
    let number = parse_label_number(&label)
        .ok_or_else(|| format!("label '{label}' has no leading number"))?;

    let direction = Direction::parse(clue.direction_str())
        .ok_or_else(|| format!("unknown direction '{}'", clue.direction_str()))?;

    let clue_text = clue_text(clue);
    if clue_text.is_empty() {
        return Err("empty clue text".to_string());
    }

    let raw_answer = resolve_answer(clue, cells)?;
    let answer = normalize_answer(&raw_answer);
    if answer.is_empty() {
        return Err("empty answer".to_string());
    }

    Ok(ClueOccurrence {
        source_slug: key.source_slug.clone(),
        puzzle_date: key.puzzle_date,
        number,
        direction,
        enumeration: derive_enumeration(&raw_answer),
        source_url: source_url.to_string(),
        slug_md5: slug_md5(&clue_text),
        slug_readable: slug_readable(&clue_text),
        clue_text,
        answer,
    })
}
