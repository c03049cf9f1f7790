//! Local filesystem storage implementation.
//!
//! Mirrors the staging/promote contract on disk for development runs that
//! should not touch the real data store.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── staging/              # Transient: rows awaiting promotion
//! │   └── {source}/
//! │       └── YYYY-MM-DD.json
//! ├── clues/                # Permanent: one file per promoted edition
//! │   └── {source}/
//! │       └── YYYY-MM-DD.json
//! └── failures.jsonl        # Append-only failure log
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{EditionKey, IngestFailureRecord, StagedRow};
use crate::storage::ClueStore;
use crate::utils::date::format_iso_date;

const STAGING_DIR: &str = "staging";
const CLUES_DIR: &str = "clues";
const FAILURES_FILE: &str = "failures.jsonl";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    fn edition_key(area: &str, key: &EditionKey) -> String {
        format!(
            "{}/{}/{}.json",
            area,
            key.source_slug,
            format_iso_date(key.puzzle_date)
        )
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Staged rows for one edition.
    pub async fn load_staged(&self, key: &EditionKey) -> Result<Vec<StagedRow>> {
        Ok(self
            .read_json(&Self::edition_key(STAGING_DIR, key))
            .await?
            .unwrap_or_default())
    }

    /// Promoted rows for one edition.
    pub async fn load_promoted(&self, key: &EditionKey) -> Result<Vec<StagedRow>> {
        Ok(self
            .read_json(&Self::edition_key(CLUES_DIR, key))
            .await?
            .unwrap_or_default())
    }

    /// All failure records, oldest first.
    pub async fn load_failures(&self) -> Result<Vec<IngestFailureRecord>> {
        let Some(bytes) = self.read_bytes(FAILURES_FILE).await? else {
            return Ok(Vec::new());
        };
        let text = String::from_utf8_lossy(&bytes);
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AppError::from))
            .collect()
    }

    /// Relative keys of every staged edition file.
    async fn staged_keys(&self) -> Result<Vec<String>> {
        let staging_root = self.path(STAGING_DIR);
        let mut keys = Vec::new();

        let mut sources = match tokio::fs::read_dir(&staging_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(AppError::Io(e)),
        };

        while let Some(source) = sources.next_entry().await? {
            if !source.file_type().await?.is_dir() {
                continue;
            }
            let source_name = source.file_name().to_string_lossy().to_string();
            let mut files = tokio::fs::read_dir(source.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let file_name = file.file_name().to_string_lossy().to_string();
                if file_name.ends_with(".json") {
                    keys.push(format!("{}/{}/{}", STAGING_DIR, source_name, file_name));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl ClueStore for LocalStore {
    async fn delete_staged(&self, key: &EditionKey) -> Result<usize> {
        let existing = self.load_staged(key).await?;
        let path = self.path(&Self::edition_key(STAGING_DIR, key));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AppError::Io(e)),
        }
        Ok(existing.len())
    }

    async fn insert_staged(&self, rows: &[StagedRow]) -> Result<usize> {
        let mut by_key: BTreeMap<EditionKey, Vec<StagedRow>> = BTreeMap::new();
        for row in rows {
            by_key.entry(row.key()).or_default().push(row.clone());
        }

        for (key, new_rows) in by_key {
            let mut staged = self.load_staged(&key).await?;
            staged.extend(new_rows);
            self.write_json(&Self::edition_key(STAGING_DIR, &key), &staged)
                .await?;
        }

        Ok(rows.len())
    }

    async fn promote(&self) -> Result<()> {
        for staged_key in self.staged_keys().await? {
            let rows: Vec<StagedRow> = self.read_json(&staged_key).await?.unwrap_or_default();
            let promoted_key = staged_key.replacen(STAGING_DIR, CLUES_DIR, 1);
            // Editions are replaced wholesale, never merged row by row.
            self.write_json(&promoted_key, &rows).await?;
            log::debug!("Promoted {} rows to {}", rows.len(), promoted_key);
        }
        Ok(())
    }

    async fn append_failure(&self, record: &IngestFailureRecord) -> Result<()> {
        let path = self.path(FAILURES_FILE);
        self.ensure_dir(&path).await?;

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
