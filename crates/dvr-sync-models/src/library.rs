use serde::{Deserialize, Serialize};

/// An item already present in a local library section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryItem {
    pub guid: String,
    /// Runtime in milliseconds
    pub duration: Option<u64>,
}

/// A library section as listed by `/library/sections`.
#[derive(Debug, Clone, PartialEq)]
pub struct LibrarySection {
    pub key: String,
    pub type_: String,
    pub title: String,
}
