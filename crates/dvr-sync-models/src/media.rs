use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media tracked on the watchlist and recorded by the DVR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Show,
}

impl MediaType {
    /// Parse the Plex `type` attribute. Anything other than movie/show is not tracked.
    pub fn from_plex_type(type_: &str) -> Option<Self> {
        match type_ {
            "movie" => Some(MediaType::Movie),
            "show" => Some(MediaType::Show),
            _ => None,
        }
    }

    /// Plex numeric type code, used for search types, subscription types and library types.
    pub fn type_code(&self) -> &'static str {
        match self {
            MediaType::Movie => "1",
            MediaType::Show => "2",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Show => "show",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
