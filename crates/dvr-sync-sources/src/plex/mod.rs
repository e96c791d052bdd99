pub mod api;
pub mod auth;
pub mod client;
pub mod search;
pub mod submission;

pub use api::PlexHttpClient;
pub use client::PlexClient;
pub use search::SearchQuery;
pub use submission::{build_submission, SubmissionPayload, SubmissionRequest};
