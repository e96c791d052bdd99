pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, PlexConfig, RecordingConfig, SectionConfig, SubmitErrorPolicy, DEFAULT_DISCOVER_URL};
pub use credentials::CredentialStore;
pub use paths::PathManager;
