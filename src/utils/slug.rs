// src/utils/slug.rs

//! Slug and text normalization helpers for clue rows.

use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Content-addressed identifier for a clue: lowercase hex MD5 of the text.
pub fn slug_md5(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}

/// Human-readable slug: lowercase, non-alphanumeric runs collapsed to `-`.
pub fn slug_readable(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Uppercase letters-only form of a raw answer.
pub fn normalize_answer(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Word lengths of a raw answer, split on runs of non-letters.
///
/// `"ICE CREAM"` becomes `"3,5"`.
pub fn derive_enumeration(raw: &str) -> String {
    raw.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.len().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Strip markup tags and collapse whitespace.
pub fn plain_text(marked_up: &str) -> String {
    let stripped = MARKUP_TAG.replace_all(marked_up, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
