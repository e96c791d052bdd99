use crate::error::SourceError;
use crate::plex::api::PlexHttpClient;
use crate::plex::search::SearchQuery;
use crate::plex::submission::{build_submission, SubmissionPayload, SubmissionRequest};
use crate::traits::{DvrBackend, DvrCatalog};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dvr_sync_config::{Config, RecordingConfig};
use dvr_sync_models::{Dvr, DvrCandidate, DvrSection, LibraryItem, LibrarySection, MediaType, Subscription, WatchlistItem};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub struct PlexClient {
    api: PlexHttpClient,
    recording: RecordingConfig,
    // The DVR handle and its sections are looked up once per client
    dvr: Arc<RwLock<Option<Dvr>>>,
    dvr_sections: Arc<RwLock<HashMap<String, DvrSection>>>,
}

impl PlexClient {
    pub fn new(api: PlexHttpClient, recording: RecordingConfig) -> Self {
        Self {
            api,
            recording,
            dvr: Arc::new(RwLock::new(None)),
            dvr_sections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &Config, token: &str) -> anyhow::Result<Self> {
        let api = PlexHttpClient::new(token, config.server_url())?
            .with_discover_base_url(&config.plex.discover_url);
        Ok(Self::new(api, config.recording.clone()))
    }

    /// The server's DVR. Only the first registered DVR is used.
    pub async fn dvr(&self) -> Result<Dvr, SourceError> {
        {
            let cached = self.dvr.read().await;
            if let Some(ref dvr) = *cached {
                return Ok(dvr.clone());
            }
        }

        let dvrs = self.api.get_dvrs().await?;
        let dvr = dvrs.into_iter().next().ok_or_else(|| {
            SourceError::NotFound(format!("no DVR configured on {}", self.api.server_url()))
        })?;
        debug!("Plex: using DVR {} (epg {})", dvr.key, dvr.epg_identifier);

        *self.dvr.write().await = Some(dvr.clone());
        Ok(dvr)
    }

    pub async fn library_section(&self, name: &str) -> Result<LibrarySection, SourceError> {
        let sections = self.api.get_library_sections().await?;
        let titles: Vec<String> = sections.iter().map(|s| s.title.clone()).collect();
        sections
            .into_iter()
            .find(|s| s.title == name)
            .ok_or_else(|| SourceError::NotFound(format!("library section '{}' (available: {:?})", name, titles)))
    }

    pub async fn dvr_section(&self, name: &str) -> Result<(Dvr, DvrSection), SourceError> {
        let dvr = self.dvr().await?;
        if let Some(section) = self.dvr_sections.read().await.get(name) {
            return Ok((dvr, section.clone()));
        }

        let sections = self.api.get_dvr_sections(&dvr.epg_identifier).await?;
        let titles: Vec<String> = sections.iter().map(|s| s.title.clone()).collect();
        let section = sections
            .into_iter()
            .find(|s| s.title == name)
            .ok_or_else(|| SourceError::NotFound(format!("DVR section '{}' (available: {:?})", name, titles)))?;
        debug!("Plex: DVR section '{}' is {}", name, section.key);

        self.dvr_sections
            .write()
            .await
            .insert(name.to_string(), section.clone());
        Ok((dvr, section))
    }

    /// Build the subscription payload for `candidate` from the DVR's current settings.
    pub async fn prepare_submission(
        &self,
        candidate: &DvrCandidate,
        thumb: Option<&str>,
    ) -> Result<SubmissionPayload, SourceError> {
        let dvr = self.dvr().await?;
        let settings = self.api.get_dvr_settings(&dvr.key).await?;
        let providers = self.api.get_media_providers().await?;

        build_submission(&SubmissionRequest {
            target: candidate,
            thumb_override: thumb,
            settings: &settings,
            providers: &providers,
            dvr_key: &dvr.key,
            target_section_id: self.recording.target_section_for(candidate.media_type),
            overrides: &self.recording.prefs,
        })
    }
}

#[async_trait]
impl DvrCatalog for PlexClient {
    async fn search_dvr_catalog(
        &self,
        section_name: &str,
        title: &str,
        year: Option<u32>,
        media_type: MediaType,
    ) -> Result<Vec<DvrCandidate>, SourceError> {
        let (dvr, section) = self.dvr_section(section_name).await?;

        let mut query = SearchQuery::new().title(title).media_type(media_type);
        if let Some(year) = year {
            query = query.year(year);
        }
        debug!("Plex DVR search: {}", query.key(&dvr.epg_identifier, &section.key));

        let results = self
            .api
            .search_dvr_section(&dvr.epg_identifier, &section.key, &query, media_type)
            .await?;
        debug!("Plex DVR search: {} results for '{}'", results.len(), title);
        Ok(results)
    }

    async fn submit_recording(
        &self,
        candidate: &DvrCandidate,
        thumb: Option<&str>,
    ) -> Result<DateTime<Utc>, SourceError> {
        let payload = self.prepare_submission(candidate, thumb).await?;
        self.api.post_subscription(&payload).await?;

        let scheduled_at = Utc::now();
        info!(title = %candidate.title, year = ?candidate.year, "Recording scheduled");
        Ok(scheduled_at)
    }
}

#[async_trait]
impl DvrBackend for PlexClient {
    fn source_name(&self) -> &str {
        "Plex"
    }

    async fn get_watchlist(&self, media_type: MediaType) -> Result<Vec<WatchlistItem>, SourceError> {
        Ok(self.api.get_watchlist(media_type).await?)
    }

    async fn get_library_catalog(
        &self,
        section_name: &str,
        media_type: MediaType,
    ) -> Result<Vec<LibraryItem>, SourceError> {
        let section = self.library_section(section_name).await?;
        Ok(self.api.get_library_items(&section.key, media_type).await?)
    }

    async fn get_subscriptions(&self) -> Result<Vec<Subscription>, SourceError> {
        Ok(self.api.get_subscriptions().await?)
    }

    async fn resolve_dvr_section(&self, section_name: &str) -> Result<(), SourceError> {
        self.dvr_section(section_name).await.map(|_| ())
    }
}
