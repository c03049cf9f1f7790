//! In-memory [`ClueStore`] implementation for tests and embedding.
//!
//! Uses `BTreeMap` and `Vec` behind `std::sync::RwLock`. Promotion replaces
//! each staged edition wholesale, like the other backends. Individual
//! operations can be switched to fail so callers can exercise their error
//! paths without a live data store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{EditionKey, IngestFailureRecord, StagedRow};
use crate::storage::ClueStore;

/// Snapshot of how often each operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub delete_staged: usize,
    pub insert_staged: usize,
    pub promote: usize,
    pub append_failure: usize,
}

#[derive(Default)]
struct Counters {
    delete_staged: AtomicUsize,
    insert_staged: AtomicUsize,
    promote: AtomicUsize,
    append_failure: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    insert: AtomicBool,
    promote: AtomicBool,
    failure_writes: AtomicBool,
    failure_details: AtomicBool,
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct InMemoryStore {
    staged: RwLock<BTreeMap<EditionKey, Vec<StagedRow>>>,
    promoted: RwLock<BTreeMap<EditionKey, Vec<StagedRow>>>,
    failures: RwLock<Vec<IngestFailureRecord>>,
    counters: Counters,
    faults: Faults,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every staging insert fail.
    pub fn fail_inserts(&self, fail: bool) {
        self.faults.insert.store(fail, Ordering::SeqCst);
    }

    /// Make the promotion procedure report failure.
    pub fn fail_promotion(&self, fail: bool) {
        self.faults.promote.store(fail, Ordering::SeqCst);
    }

    /// Make every failure-log write fail.
    pub fn fail_failure_writes(&self, fail: bool) {
        self.faults.failure_writes.store(fail, Ordering::SeqCst);
    }

    /// Reject failure records that carry a details payload, as a table
    /// without a `details` column would.
    pub fn reject_failure_details(&self, reject: bool) {
        self.faults.failure_details.store(reject, Ordering::SeqCst);
    }

    pub fn staged(&self, key: &EditionKey) -> Vec<StagedRow> {
        let staged = self.staged.read().unwrap_or_else(PoisonError::into_inner);
        staged.get(key).cloned().unwrap_or_default()
    }

    pub fn promoted(&self, key: &EditionKey) -> Vec<StagedRow> {
        let promoted = self.promoted.read().unwrap_or_else(PoisonError::into_inner);
        promoted.get(key).cloned().unwrap_or_default()
    }

    /// Row count across every promoted edition.
    pub fn promoted_total(&self) -> usize {
        let promoted = self.promoted.read().unwrap_or_else(PoisonError::into_inner);
        promoted.values().map(Vec::len).sum()
    }

    pub fn failures(&self) -> Vec<IngestFailureRecord> {
        self.failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            delete_staged: self.counters.delete_staged.load(Ordering::SeqCst),
            insert_staged: self.counters.insert_staged.load(Ordering::SeqCst),
            promote: self.counters.promote.load(Ordering::SeqCst),
            append_failure: self.counters.append_failure.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl ClueStore for InMemoryStore {
    async fn delete_staged(&self, key: &EditionKey) -> Result<usize> {
        self.counters.delete_staged.fetch_add(1, Ordering::SeqCst);
        let mut staged = self.staged.write().unwrap_or_else(PoisonError::into_inner);
        Ok(staged.remove(key).map(|rows| rows.len()).unwrap_or(0))
    }

    async fn insert_staged(&self, rows: &[StagedRow]) -> Result<usize> {
        self.counters.insert_staged.fetch_add(1, Ordering::SeqCst);
        if self.faults.insert.load(Ordering::SeqCst) {
            return Err(AppError::store("insert_staged", 500, "injected insert failure"));
        }

        let mut staged = self.staged.write().unwrap_or_else(PoisonError::into_inner);
        for row in rows {
            staged.entry(row.key()).or_default().push(row.clone());
        }
        Ok(rows.len())
    }

    async fn promote(&self) -> Result<()> {
        self.counters.promote.fetch_add(1, Ordering::SeqCst);
        if self.faults.promote.load(Ordering::SeqCst) {
            return Err(AppError::store("promote", 500, "injected promotion failure"));
        }

        let staged = self.staged.read().unwrap_or_else(PoisonError::into_inner);
        let mut promoted = self.promoted.write().unwrap_or_else(PoisonError::into_inner);
        for (key, rows) in staged.iter() {
            promoted.insert(key.clone(), rows.clone());
        }
        Ok(())
    }

    async fn append_failure(&self, record: &IngestFailureRecord) -> Result<()> {
        self.counters.append_failure.fetch_add(1, Ordering::SeqCst);
        if self.faults.failure_writes.load(Ordering::SeqCst) {
            return Err(AppError::store("append_failure", 503, "injected log failure"));
        }
        if record.details.is_some() && self.faults.failure_details.load(Ordering::SeqCst) {
            return Err(AppError::store(
                "append_failure",
                400,
                "column \"details\" does not exist",
            ));
        }

        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
