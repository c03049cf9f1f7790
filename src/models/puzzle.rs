//! Typed view of the upstream puzzle payload.
//!
//! The upstream document looks like:
//!
//! ```text
//! { "body": [ { "id": ..., "publicationDate": "...",
//!               "cells": [ { "answer": "I" }, {}, ... ],
//!               "clues": [ { "label": "5D", "direction": "Down",
//!                            "text": [ { "plain": "..." } ],
//!                            "cells": [0, 5, 10], "answer": "..." } ] } ] }
//! ```
//!
//! Only the fields the row builder needs are modelled; everything else is
//! ignored during deserialization.

use serde::Deserialize;

use crate::error::{AppError, Result};

/// JSON scalar that may arrive as either a string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    pub fn as_string(&self) -> String {
        match self {
            StringOrNumber::Text(s) => s.clone(),
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

/// Outer document returned by the puzzle endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleDocument {
    #[serde(default)]
    pub body: Vec<RawPuzzle>,
}

/// One puzzle as published upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPuzzle {
    #[serde(default)]
    pub id: Option<StringOrNumber>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub cells: Vec<RawCell>,
    #[serde(default)]
    pub clues: Vec<RawClue>,
}

/// A grid cell. Block cells carry no answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClue {
    #[serde(default)]
    pub label: Option<StringOrNumber>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub text: Vec<RichText>,
    #[serde(default)]
    pub cells: Vec<usize>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// A run of clue text in plain and/or marked-up form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain: Option<String>,
    #[serde(default)]
    pub formatted: Option<String>,
}

impl RawClue {
    pub fn label_str(&self) -> String {
        self.label
            .as_ref()
            .map(StringOrNumber::as_string)
            .unwrap_or_default()
    }

    pub fn direction_str(&self) -> &str {
        self.direction.as_deref().unwrap_or("")
    }
}

impl RawPuzzle {
    /// Parse an upstream document and extract its first puzzle.
    ///
    /// Fails with [`AppError::Parse`] when the document is not the expected
    /// shape, has no puzzle object, or the puzzle has no clues.
    pub fn from_json(raw: &str) -> Result<Self> {
        let document: PuzzleDocument = serde_json::from_str(raw)
            .map_err(|e| AppError::parse(format!("unexpected payload structure: {e}")))?;

        let puzzle = document
            .body
            .into_iter()
            .next()
            .ok_or_else(|| AppError::parse("payload has no body[0] puzzle object"))?;

        if puzzle.clues.is_empty() {
            return Err(AppError::parse("puzzle has no clues"));
        }

        Ok(puzzle)
    }

    pub fn id_str(&self) -> Option<String> {
        self.id.as_ref().map(StringOrNumber::as_string)
    }
}
