use serde::{Deserialize, Serialize};
use crate::media::MediaType;

/// A DVR device registered on the server (`/livetv/dvrs`).
#[derive(Debug, Clone, PartialEq)]
pub struct Dvr {
    pub key: String,
    pub epg_identifier: String,
}

/// A searchable section of the DVR guide, e.g. "Movies".
#[derive(Debug, Clone, PartialEq)]
pub struct DvrSection {
    pub key: String,
    pub title: String,
    pub type_: String,
}

/// A guide entry that could be recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DvrCandidate {
    pub rating_key: Option<String>,
    pub guid: String,
    pub title: String,
    pub year: Option<u32>,
    pub media_type: MediaType,
    pub thumb: Option<String>,
}

/// A media provider (`/media/providers`). The live TV provider owned by the DVR
/// is the one recordings are submitted against.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProvider {
    pub identifier: Option<String>,
    pub id: String,
    pub parent_id: Option<String>,
    pub protocols: Option<String>,
}
