use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dvr_sync_models::{DvrCandidate, LibraryItem, MediaType, Subscription, WatchlistItem};

use crate::error::SourceError;

/// The DVR guide: loose title search plus the recording side effect.
#[async_trait]
pub trait DvrCatalog: Send + Sync {
    /// Search a DVR section. May over-return (substring title matches).
    async fn search_dvr_catalog(
        &self,
        section_name: &str,
        title: &str,
        year: Option<u32>,
        media_type: MediaType,
    ) -> Result<Vec<DvrCandidate>, SourceError>;

    /// Schedule a recording of `candidate` and return when it was scheduled.
    async fn submit_recording(
        &self,
        candidate: &DvrCandidate,
        thumb: Option<&str>,
    ) -> Result<DateTime<Utc>, SourceError>;
}

/// Read-only queries the reconciler runs before deciding anything.
#[async_trait]
pub trait DvrBackend: DvrCatalog {
    fn source_name(&self) -> &str;

    async fn get_watchlist(&self, media_type: MediaType) -> Result<Vec<WatchlistItem>, SourceError>;
    async fn get_library_catalog(
        &self,
        section_name: &str,
        media_type: MediaType,
    ) -> Result<Vec<LibraryItem>, SourceError>;
    async fn get_subscriptions(&self) -> Result<Vec<Subscription>, SourceError>;

    /// Look up a DVR section by name so later searches can reuse it.
    async fn resolve_dvr_section(&self, section_name: &str) -> Result<(), SourceError>;
}
