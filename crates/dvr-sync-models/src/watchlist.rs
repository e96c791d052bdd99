use serde::{Deserialize, Serialize};
use crate::media::MediaType;

/// An entry on the account watchlist (discover provider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistItem {
    pub title: String,
    pub year: Option<u32>,
    pub media_type: MediaType,
    pub guid: String, // Global id, e.g. "plex://movie/5d776..."
    /// Runtime in milliseconds
    pub duration: Option<u64>,
    pub thumb: Option<String>,
}
