//! Outcome types for single-date ingestion.

use std::fmt;

use serde::Serialize;

use super::EditionKey;

/// Lifecycle of one single-date ingestion.
///
/// `Fetching -> Building -> (Aborted | Staging) -> Promoting -> (Failed | CleaningUp) -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    Fetching,
    Building,
    Staging,
    Promoting,
    CleaningUp,
    Done,
    /// Rejected before any write
    Aborted,
    /// A write or the promotion failed
    Failed,
}

impl IngestPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestPhase::Done | IngestPhase::Aborted | IngestPhase::Failed
        )
    }

    /// Whether the store may already have been written to in this phase.
    pub fn has_written(&self) -> bool {
        matches!(
            self,
            IngestPhase::Staging | IngestPhase::Promoting | IngestPhase::CleaningUp
        )
    }

    /// Legal successor states. Dry runs go straight from building to done,
    /// and runs that keep staging skip the cleanup phase.
    pub fn can_advance_to(&self, next: IngestPhase) -> bool {
        use IngestPhase::*;
        matches!(
            (*self, next),
            (Fetching, Building)
                | (Fetching, Aborted)
                | (Building, Staging)
                | (Building, Done)
                | (Building, Aborted)
                | (Staging, Promoting)
                | (Staging, Failed)
                | (Promoting, CleaningUp)
                | (Promoting, Done)
                | (Promoting, Failed)
                | (CleaningUp, Done)
                | (CleaningUp, Failed)
        )
    }
}

impl fmt::Display for IngestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestPhase::Fetching => "fetching",
            IngestPhase::Building => "building",
            IngestPhase::Staging => "staging",
            IngestPhase::Promoting => "promoting",
            IngestPhase::CleaningUp => "cleaning_up",
            IngestPhase::Done => "done",
            IngestPhase::Aborted => "aborted",
            IngestPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks and logs the phase of one single-date ingestion.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    key: EditionKey,
    phase: IngestPhase,
}

impl PhaseTracker {
    pub fn new(key: EditionKey) -> Self {
        Self {
            key,
            phase: IngestPhase::Fetching,
        }
    }

    pub fn phase(&self) -> IngestPhase {
        self.phase
    }

    pub fn advance(&mut self, next: IngestPhase) {
        if !self.phase.can_advance_to(next) {
            log::warn!("{}: unexpected transition {} -> {}", self.key, self.phase, next);
        }
        log::debug!("{}: {} -> {}", self.key, self.phase, next);
        self.phase = next;
    }

    /// Move to the failure terminal state matching the current phase.
    pub fn fail(&mut self) -> IngestPhase {
        let terminal = if self.phase.has_written() {
            IngestPhase::Failed
        } else {
            IngestPhase::Aborted
        };
        self.advance(terminal);
        terminal
    }
}

/// Counts reported by a successful single-date ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub key: EditionKey,
    /// Raw clues that passed the applicability filter
    pub expected: usize,
    pub built: usize,
    /// Rows written to staging (0 on dry runs)
    pub inserted: usize,
    pub dry_run: bool,
    pub phase: IngestPhase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tracker() -> PhaseTracker {
        PhaseTracker::new(EditionKey::new(
            "daily",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ))
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut t = tracker();
        for next in [
            IngestPhase::Building,
            IngestPhase::Staging,
            IngestPhase::Promoting,
            IngestPhase::CleaningUp,
            IngestPhase::Done,
        ] {
            assert!(t.phase().can_advance_to(next));
            t.advance(next);
        }
        assert!(t.phase().is_terminal());
    }

    #[test]
    fn test_failure_before_write_aborts() {
        let mut t = tracker();
        t.advance(IngestPhase::Building);
        assert_eq!(t.fail(), IngestPhase::Aborted);
    }

    #[test]
    fn test_failure_after_write_fails() {
        let mut t = tracker();
        t.advance(IngestPhase::Building);
        t.advance(IngestPhase::Staging);
        t.advance(IngestPhase::Promoting);
        assert_eq!(t.fail(), IngestPhase::Failed);
    }

    #[test]
    fn test_terminal_states_have_no_successors() {
        assert!(!IngestPhase::Done.can_advance_to(IngestPhase::Fetching));
        assert!(!IngestPhase::Aborted.can_advance_to(IngestPhase::Staging));
        assert!(!IngestPhase::Failed.can_advance_to(IngestPhase::Done));
    }
}
