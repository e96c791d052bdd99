//! First-match lookups used by the reconciler. All are single forward scans.

use dvr_sync_models::{DvrCandidate, LibraryItem, Subscription, WatchlistItem};

/// Owned share of `item` in percent: library duration over watchlist duration.
///
/// No library entry with the same guid gives 0. A missing or zero watchlist
/// duration gives 0 as well, and a library entry without a duration counts as 0 ms.
pub fn coverage_percent(library: &[LibraryItem], item: &WatchlistItem) -> f64 {
    let Some(owned) = library.iter().find(|l| l.guid == item.guid) else {
        return 0.0;
    };
    match item.duration {
        Some(total) if total > 0 => owned.duration.unwrap_or(0) as f64 * 100.0 / total as f64,
        _ => 0.0,
    }
}

/// More than half of the item is already in the library.
pub fn in_library(library: &[LibraryItem], item: &WatchlistItem) -> bool {
    coverage_percent(library, item) > 50.0
}

/// Existing subscription for the same type, title (ignoring case) and year.
pub fn find_scheduled<'a>(subscriptions: &'a [Subscription], item: &WatchlistItem) -> Option<&'a Subscription> {
    let type_code = item.media_type.type_code();
    let title = item.title.to_lowercase();
    subscriptions.iter().find(|s| {
        s.type_code == type_code && s.item.title.to_lowercase() == title && s.item.year == item.year
    })
}

/// Guide search is loose; keep only candidates whose title is exactly `title`.
pub fn exact_title_matches<'a>(candidates: &'a [DvrCandidate], title: &str) -> Vec<&'a DvrCandidate> {
    candidates.iter().filter(|c| c.title == title).collect()
}
