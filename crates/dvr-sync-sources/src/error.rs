use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Network, HTTP status or response decoding failure
    #[error("{0}")]
    Transport(String),

    /// Unknown section, setting key or illegal setting value
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No live TV media provider found for DVR {dvr_key}")]
    ProviderNotFound { dvr_key: String },
}

impl From<anyhow::Error> for SourceError {
    fn from(err: anyhow::Error) -> Self {
        SourceError::Transport(format!("{:#}", err))
    }
}
