use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An existing DVR recording rule (`MediaSubscription`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub key: Option<String>,
    /// Raw Plex type code: "1" for movies, "2" for shows
    pub type_code: String,
    pub title: Option<String>,
    pub target_library_section_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub item: SubscribedItem,
}

/// The media item a subscription records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscribedItem {
    pub title: String,
    pub year: Option<u32>,
}
