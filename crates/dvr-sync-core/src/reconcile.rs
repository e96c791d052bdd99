use dvr_sync_config::{Config, SubmitErrorPolicy};
use dvr_sync_models::{
    LibraryItem, MediaType, ReconciliationResult, Subscription, WatchlistItem, WatchlistReport,
};
use dvr_sync_sources::{DvrBackend, DvrCatalog, SourceError};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::matching::{exact_title_matches, find_scheduled, in_library};

pub const WATCHLIST: &str = "watchlist";
pub const LIBRARY_CATALOG: &str = "library catalog";
pub const SUBSCRIPTIONS: &str = "subscriptions";
pub const DVR_SECTION: &str = "DVR section";
pub const DVR_SEARCH: &str = "DVR catalog search";

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A read collaborator failed; nothing has been decided yet for the remaining items
    #[error("Failed to read {collaborator}: {error}")]
    Collaborator {
        collaborator: &'static str,
        error: SourceError,
    },

    #[error("Failed to schedule recording for '{title}': {error}")]
    Submission { title: String, error: SourceError },
}

impl ReconcileError {
    fn read(collaborator: &'static str) -> impl FnOnce(SourceError) -> Self {
        move |error| ReconcileError::Collaborator { collaborator, error }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub media_type: MediaType,
    /// Library section holding owned items
    pub library_section: String,
    /// DVR guide section searched for new recordings
    pub dvr_section: String,
    pub on_submit_error: SubmitErrorPolicy,
}

impl ReconcileOptions {
    pub fn from_config(config: &Config, media_type: MediaType) -> Self {
        Self {
            media_type,
            library_section: config.sections.library_for(media_type).to_string(),
            dvr_section: config.sections.dvr_for(media_type).to_string(),
            on_submit_error: config.recording.on_submit_error,
        }
    }
}

/// Classify each watchlist entry and schedule recordings for the ones that are
/// neither owned nor already scheduled.
///
/// Results keep watchlist order. Submissions are issued one at a time in the
/// same order.
pub async fn reconcile<C>(
    watchlist: &[WatchlistItem],
    library: &[LibraryItem],
    subscriptions: &[Subscription],
    catalog: &C,
    options: &ReconcileOptions,
) -> Result<Vec<ReconciliationResult>, ReconcileError>
where
    C: DvrCatalog + ?Sized,
{
    let mut results = Vec::with_capacity(watchlist.len());

    for item in watchlist {
        let mut result = ReconciliationResult::unscheduled(&item.title, item.year);

        if in_library(library, item) {
            debug!(title = %item.title, "Already in library");
            result.in_library = true;
            results.push(result);
            continue;
        }

        if let Some(subscription) = find_scheduled(subscriptions, item) {
            debug!(title = %item.title, "Recording already scheduled");
            result.recording_scheduled = true;
            result.recording_schedule_created = subscription.created_at;
            results.push(result);
            continue;
        }

        let candidates = catalog
            .search_dvr_catalog(&options.dvr_section, &item.title, item.year, item.media_type)
            .await
            .map_err(ReconcileError::read(DVR_SEARCH))?;

        let Some(target) = exact_title_matches(&candidates, &item.title).into_iter().next() else {
            debug!(title = %item.title, candidates = candidates.len(), "No exact DVR match");
            results.push(result);
            continue;
        };

        match catalog.submit_recording(target, item.thumb.as_deref()).await {
            Ok(created) => {
                info!(title = %item.title, year = ?item.year, "Scheduled new recording");
                result.recording_scheduled = true;
                result.newly_scheduled = true;
                result.recording_schedule_created = Some(created);
            }
            Err(error) => match options.on_submit_error {
                SubmitErrorPolicy::Abort => {
                    return Err(ReconcileError::Submission {
                        title: item.title.clone(),
                        error,
                    });
                }
                SubmitErrorPolicy::Continue => {
                    warn!(title = %item.title, "Recording submission failed: {}", error);
                    result.submission_error = Some(error.to_string());
                }
            },
        }
        results.push(result);
    }

    Ok(results)
}

/// Runs one reconciliation pass against a backend: the three reads and the DVR
/// section lookup, then [`reconcile`].
pub struct Reconciler<'a, B: DvrBackend + ?Sized> {
    backend: &'a B,
    options: ReconcileOptions,
}

impl<'a, B: DvrBackend + ?Sized> Reconciler<'a, B> {
    pub fn new(backend: &'a B, options: ReconcileOptions) -> Self {
        Self { backend, options }
    }

    #[instrument(skip(self), fields(source = self.backend.source_name(), media_type = %self.options.media_type))]
    pub async fn run(&self) -> Result<WatchlistReport, ReconcileError> {
        let start = Instant::now();
        let media_type = self.options.media_type;

        let watchlist = self
            .backend
            .get_watchlist(media_type)
            .await
            .map_err(ReconcileError::read(WATCHLIST))?;
        let library = self
            .backend
            .get_library_catalog(&self.options.library_section, media_type)
            .await
            .map_err(ReconcileError::read(LIBRARY_CATALOG))?;
        let subscriptions = self
            .backend
            .get_subscriptions()
            .await
            .map_err(ReconcileError::read(SUBSCRIPTIONS))?;
        // Fails on a misconfigured section even when nothing needs searching
        self.backend
            .resolve_dvr_section(&self.options.dvr_section)
            .await
            .map_err(ReconcileError::read(DVR_SECTION))?;
        debug!(
            "Fetched {} watchlist items, {} library items, {} subscriptions",
            watchlist.len(),
            library.len(),
            subscriptions.len()
        );

        let report = WatchlistReport {
            watchlist: reconcile(&watchlist, &library, &subscriptions, self.backend, &self.options).await?,
        };

        info!(
            total = report.watchlist.len(),
            in_library = report.in_library_count(),
            scheduled = report.scheduled_count(),
            newly_scheduled = report.newly_scheduled_count(),
            failed = report.failed_count(),
            "Reconciliation complete in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use dvr_sync_models::{DvrCandidate, SubscribedItem};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        watchlist: Vec<WatchlistItem>,
        library: Vec<LibraryItem>,
        subscriptions: Vec<Subscription>,
        dvr: Vec<DvrCandidate>,
        failing: Option<&'static str>,
        reject_submissions: bool,
        searches: Mutex<Vec<(String, String, Option<u32>)>>,
        submitted: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakeBackend {
        fn fail_if(&self, what: &'static str) -> Result<(), SourceError> {
            match self.failing {
                Some(f) if f == what => Err(SourceError::Transport(format!("{} unavailable", what))),
                _ => Ok(()),
            }
        }

        fn submitted_titles(&self) -> Vec<String> {
            self.submitted.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
        }
    }

    #[async_trait]
    impl DvrCatalog for FakeBackend {
        async fn search_dvr_catalog(
            &self,
            section_name: &str,
            title: &str,
            year: Option<u32>,
            _media_type: MediaType,
        ) -> Result<Vec<DvrCandidate>, SourceError> {
            self.fail_if(DVR_SEARCH)?;
            self.searches
                .lock()
                .unwrap()
                .push((section_name.to_string(), title.to_string(), year));
            Ok(self.dvr.iter().filter(|c| c.title.contains(title)).cloned().collect())
        }

        async fn submit_recording(
            &self,
            candidate: &DvrCandidate,
            thumb: Option<&str>,
        ) -> Result<DateTime<Utc>, SourceError> {
            if self.reject_submissions {
                return Err(SourceError::Transport("status 500".to_string()));
            }
            self.submitted
                .lock()
                .unwrap()
                .push((candidate.title.clone(), thumb.map(str::to_string)));
            Ok(submitted_at())
        }
    }

    #[async_trait]
    impl DvrBackend for FakeBackend {
        fn source_name(&self) -> &str {
            "fake"
        }

        async fn get_watchlist(&self, _media_type: MediaType) -> Result<Vec<WatchlistItem>, SourceError> {
            self.fail_if(WATCHLIST)?;
            Ok(self.watchlist.clone())
        }

        async fn get_library_catalog(
            &self,
            _section_name: &str,
            _media_type: MediaType,
        ) -> Result<Vec<LibraryItem>, SourceError> {
            self.fail_if(LIBRARY_CATALOG)?;
            Ok(self.library.clone())
        }

        async fn get_subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
            self.fail_if(SUBSCRIPTIONS)?;
            Ok(self.subscriptions.clone())
        }

        async fn resolve_dvr_section(&self, _section_name: &str) -> Result<(), SourceError> {
            self.fail_if(DVR_SECTION)
        }
    }

    fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    }

    fn movie(title: &str, guid: &str, duration: u64) -> WatchlistItem {
        WatchlistItem {
            title: title.to_string(),
            year: Some(2021),
            media_type: MediaType::Movie,
            guid: guid.to_string(),
            duration: Some(duration),
            thumb: Some(format!("https://img/{}.jpg", guid)),
        }
    }

    fn candidate(title: &str) -> DvrCandidate {
        DvrCandidate {
            rating_key: None,
            guid: format!("plex://movie/{}", title.replace(' ', "-")),
            title: title.to_string(),
            year: Some(2021),
            media_type: MediaType::Movie,
            thumb: None,
        }
    }

    fn dune_subscription() -> Subscription {
        Subscription {
            key: Some("sub-1".to_string()),
            type_code: "1".to_string(),
            title: Some("Dune".to_string()),
            target_library_section_id: Some("70".to_string()),
            created_at: Some(t0()),
            item: SubscribedItem { title: "Dune".to_string(), year: Some(2021) },
        }
    }

    fn options(policy: SubmitErrorPolicy) -> ReconcileOptions {
        ReconcileOptions {
            media_type: MediaType::Movie,
            library_section: "Movies".to_string(),
            dvr_section: "Movies".to_string(),
            on_submit_error: policy,
        }
    }

    async fn run(backend: &FakeBackend) -> Result<WatchlistReport, ReconcileError> {
        Reconciler::new(backend, options(SubmitErrorPolicy::Abort)).run().await
    }

    #[tokio::test]
    async fn test_owned_item_is_in_library() {
        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000)],
            library: vec![LibraryItem { guid: "g1".to_string(), duration: Some(6000) }],
            dvr: vec![candidate("Dune")],
            ..Default::default()
        };

        let report = run(&backend).await.unwrap();
        let result = &report.watchlist[0];
        assert!(result.in_library);
        assert!(!result.recording_scheduled);
        assert!(!result.newly_scheduled);
        assert!(backend.searches.lock().unwrap().is_empty());
        assert!(backend.submitted_titles().is_empty());
    }

    #[tokio::test]
    async fn test_partial_copy_without_dvr_match_is_unscheduled() {
        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000)],
            library: vec![LibraryItem { guid: "g1".to_string(), duration: Some(4000) }],
            ..Default::default()
        };

        let report = run(&backend).await.unwrap();
        assert_eq!(report.watchlist, vec![ReconciliationResult::unscheduled("Dune", Some(2021))]);
    }

    #[tokio::test]
    async fn test_existing_subscription_is_reported() {
        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000)],
            subscriptions: vec![dune_subscription()],
            dvr: vec![candidate("Dune")],
            ..Default::default()
        };

        let report = run(&backend).await.unwrap();
        let result = &report.watchlist[0];
        assert!(!result.in_library);
        assert!(result.recording_scheduled);
        assert!(!result.newly_scheduled);
        assert_eq!(result.recording_schedule_created, Some(t0()));
        assert!(backend.submitted_titles().is_empty());
    }

    #[tokio::test]
    async fn test_exact_dvr_match_is_submitted() {
        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000)],
            dvr: vec![candidate("Dune Part Two"), candidate("Dune")],
            ..Default::default()
        };

        let report = run(&backend).await.unwrap();
        let result = &report.watchlist[0];
        assert!(result.recording_scheduled);
        assert!(result.newly_scheduled);
        assert_eq!(result.recording_schedule_created, Some(submitted_at()));

        let submitted = backend.submitted.lock().unwrap().clone();
        assert_eq!(submitted, vec![("Dune".to_string(), Some("https://img/g1.jpg".to_string()))]);

        let searches = backend.searches.lock().unwrap().clone();
        assert_eq!(searches, vec![("Movies".to_string(), "Dune".to_string(), Some(2021))]);
    }

    #[tokio::test]
    async fn test_substring_matches_are_not_submitted() {
        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000)],
            dvr: vec![candidate("Dune Part Two")],
            ..Default::default()
        };

        let report = run(&backend).await.unwrap();
        assert!(!report.watchlist[0].recording_scheduled);
        assert!(backend.submitted_titles().is_empty());
    }

    #[tokio::test]
    async fn test_results_keep_watchlist_order() {
        let backend = FakeBackend {
            watchlist: vec![
                movie("Arrival", "g2", 7000),
                movie("Dune", "g1", 10000),
                movie("Tenet", "g3", 9000),
                movie("Heat", "g4", 9000),
            ],
            library: vec![LibraryItem { guid: "g1".to_string(), duration: Some(10000) }],
            subscriptions: vec![Subscription {
                item: SubscribedItem { title: "tenet".to_string(), year: Some(2021) },
                ..dune_subscription()
            }],
            dvr: vec![candidate("Heat"), candidate("Arrival")],
            ..Default::default()
        };

        let report = run(&backend).await.unwrap();
        let titles: Vec<&str> = report.watchlist.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Arrival", "Dune", "Tenet", "Heat"]);

        assert!(report.watchlist[0].newly_scheduled);
        assert!(report.watchlist[1].in_library);
        assert!(report.watchlist[2].recording_scheduled && !report.watchlist[2].newly_scheduled);
        assert!(report.watchlist[3].newly_scheduled);
        assert_eq!(backend.submitted_titles(), vec!["Arrival", "Heat"]);

        for result in &report.watchlist {
            assert!(!(result.in_library && result.recording_scheduled));
            assert!(!result.newly_scheduled || result.recording_scheduled);
        }
    }

    #[tokio::test]
    async fn test_read_failures_name_the_collaborator() {
        for what in [WATCHLIST, LIBRARY_CATALOG, SUBSCRIPTIONS, DVR_SECTION, DVR_SEARCH] {
            let backend = FakeBackend {
                watchlist: vec![movie("Dune", "g1", 10000)],
                failing: Some(what),
                ..Default::default()
            };

            let err = run(&backend).await.unwrap_err();
            assert!(matches!(err, ReconcileError::Collaborator { collaborator, .. } if collaborator == what));
            assert!(err.to_string().contains(what));
        }
    }

    #[tokio::test]
    async fn test_bad_dvr_section_fails_without_searches() {
        let backend = FakeBackend {
            library: vec![LibraryItem { guid: "g1".to_string(), duration: Some(10000) }],
            failing: Some(DVR_SECTION),
            ..Default::default()
        };

        let err = run(&backend).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Collaborator { collaborator, .. } if collaborator == DVR_SECTION));

        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000)],
            ..backend
        };
        assert!(run(&backend).await.is_err());
        assert!(backend.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submission_failure_aborts_by_default() {
        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000), movie("Heat", "g4", 9000)],
            dvr: vec![candidate("Dune"), candidate("Heat")],
            reject_submissions: true,
            ..Default::default()
        };

        let err = run(&backend).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Submission { ref title, .. } if title == "Dune"));
        assert_eq!(backend.searches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submission_failure_continue_records_error() {
        let backend = FakeBackend {
            watchlist: vec![movie("Dune", "g1", 10000), movie("Heat", "g4", 9000)],
            dvr: vec![candidate("Dune"), candidate("Heat")],
            reject_submissions: true,
            ..Default::default()
        };

        let report = Reconciler::new(&backend, options(SubmitErrorPolicy::Continue))
            .run()
            .await
            .unwrap();

        assert_eq!(report.failed_count(), 2);
        for result in &report.watchlist {
            assert!(!result.recording_scheduled);
            assert!(!result.newly_scheduled);
            assert!(result.recording_schedule_created.is_none());
            assert_eq!(result.submission_error.as_deref(), Some("status 500"));
        }
    }

    #[tokio::test]
    async fn test_reconcile_with_explicit_inputs() {
        let catalog = FakeBackend {
            dvr: vec![candidate("Dune")],
            ..Default::default()
        };
        let watchlist = vec![movie("Dune", "g1", 10000)];

        let results = reconcile(&watchlist, &[], &[], &catalog, &options(SubmitErrorPolicy::Abort))
            .await
            .unwrap();
        assert!(results[0].newly_scheduled);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.sections.show_dvr = "Series".to_string();
        config.recording.on_submit_error = SubmitErrorPolicy::Continue;

        let options = ReconcileOptions::from_config(&config, MediaType::Show);
        assert_eq!(options.library_section, "TV Shows");
        assert_eq!(options.dvr_section, "Series");
        assert_eq!(options.on_submit_error, SubmitErrorPolicy::Continue);
    }
}
