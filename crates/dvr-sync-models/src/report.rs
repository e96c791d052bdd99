use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of reconciling one watchlist entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciliationResult {
    pub title: String,
    pub year: Option<u32>,
    pub in_library: bool,
    pub recording_scheduled: bool,
    pub recording_schedule_created: Option<DateTime<Utc>>,
    pub newly_scheduled: bool,
    /// Set only when a submission failed and the run was allowed to continue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
}

impl ReconciliationResult {
    /// A result with every flag cleared (the "unscheduled" outcome).
    pub fn unscheduled(title: &str, year: Option<u32>) -> Self {
        Self {
            title: title.to_string(),
            year,
            in_library: false,
            recording_scheduled: false,
            recording_schedule_created: None,
            newly_scheduled: false,
            submission_error: None,
        }
    }
}

/// Top-level report printed after a run: `{"watchlist": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatchlistReport {
    pub watchlist: Vec<ReconciliationResult>,
}

impl WatchlistReport {
    pub fn in_library_count(&self) -> usize {
        self.watchlist.iter().filter(|r| r.in_library).count()
    }

    pub fn scheduled_count(&self) -> usize {
        self.watchlist.iter().filter(|r| r.recording_scheduled).count()
    }

    pub fn newly_scheduled_count(&self) -> usize {
        self.watchlist.iter().filter(|r| r.newly_scheduled).count()
    }

    pub fn failed_count(&self) -> usize {
        self.watchlist.iter().filter(|r| r.submission_error.is_some()).count()
    }
}
