use dvr_sync_models::MediaType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_DISCOVER_URL: &str = "https://discover.provider.plex.tv";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub sections: SectionConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlexConfig {
    #[serde(default)]
    pub server_url: String,
    /// Base URL of the account-level discover provider (watchlist)
    #[serde(default = "default_discover_url")]
    pub discover_url: String,
}

/// Names of the sections the reconciler reads, per media type.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SectionConfig {
    #[serde(default = "default_movie_section")]
    pub movie_library: String,
    #[serde(default = "default_show_section")]
    pub show_library: String,
    #[serde(default = "default_movie_section")]
    pub movie_dvr: String,
    #[serde(default = "default_show_section")]
    pub show_dvr: String,
}

/// What to do when submitting a recording fails for one item.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmitErrorPolicy {
    /// Stop the run at the first failed submission
    #[default]
    Abort,
    /// Record the error on the item and keep going
    Continue,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordingConfig {
    #[serde(default = "default_target_section_id")]
    pub movie_target_section_id: String,
    #[serde(default = "default_target_section_id")]
    pub show_target_section_id: String,
    #[serde(default)]
    pub on_submit_error: SubmitErrorPolicy,
    /// Preference overrides sent with every submission, validated against the DVR settings
    #[serde(default)]
    pub prefs: BTreeMap<String, String>,
}

fn default_discover_url() -> String {
    DEFAULT_DISCOVER_URL.to_string()
}

fn default_movie_section() -> String {
    "Movies".to_string()
}

fn default_show_section() -> String {
    "TV Shows".to_string()
}

fn default_target_section_id() -> String {
    "70".to_string()
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            discover_url: default_discover_url(),
        }
    }
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            movie_library: default_movie_section(),
            show_library: default_show_section(),
            movie_dvr: default_movie_section(),
            show_dvr: default_show_section(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            movie_target_section_id: default_target_section_id(),
            show_target_section_id: default_target_section_id(),
            on_submit_error: SubmitErrorPolicy::default(),
            prefs: BTreeMap::new(),
        }
    }
}

impl SectionConfig {
    pub fn library_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Movie => &self.movie_library,
            MediaType::Show => &self.show_library,
        }
    }

    pub fn dvr_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Movie => &self.movie_dvr,
            MediaType::Show => &self.show_dvr,
        }
    }
}

impl RecordingConfig {
    pub fn target_section_for(&self, media_type: MediaType) -> &str {
        match media_type {
            MediaType::Movie => &self.movie_target_section_id,
            MediaType::Show => &self.show_target_section_id,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config if the file exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.plex.server_url.trim().is_empty() {
            return Err(anyhow::anyhow!("plex.server_url is required. Run 'watchlist-dvr config plex' or pass --server-url"));
        }
        if !self.plex.server_url.starts_with("http://") && !self.plex.server_url.starts_with("https://") {
            return Err(anyhow::anyhow!("plex.server_url must start with http:// or https://: {}", self.plex.server_url));
        }
        if self.plex.discover_url.trim().is_empty() {
            return Err(anyhow::anyhow!("plex.discover_url cannot be empty"));
        }

        let sections = [
            ("sections.movie_library", &self.sections.movie_library),
            ("sections.show_library", &self.sections.show_library),
            ("sections.movie_dvr", &self.sections.movie_dvr),
            ("sections.show_dvr", &self.sections.show_dvr),
            ("recording.movie_target_section_id", &self.recording.movie_target_section_id),
            ("recording.show_target_section_id", &self.recording.show_target_section_id),
        ];
        for (name, value) in sections {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("{} cannot be empty", name));
            }
        }

        Ok(())
    }

    /// Server URL without a trailing slash, ready for path joining.
    pub fn server_url(&self) -> &str {
        self.plex.server_url.trim_end_matches('/')
    }
}
