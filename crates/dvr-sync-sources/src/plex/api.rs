use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use dvr_sync_models::{
    parse_enum_values, Dvr, DvrCandidate, DvrSection, LibraryItem, LibrarySection, MediaProvider,
    MediaType, PrefValue, Setting, SettingType, SubscribedItem, Subscription, WatchlistItem,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, trace};

use crate::plex::search::SearchQuery;
use crate::plex::submission::SubmissionPayload;
use dvr_sync_config::DEFAULT_DISCOVER_URL;

const CLIENT_IDENTIFIER: &str = "watchlist-dvr";
const CONTAINER_SIZE: usize = 100;

pub struct PlexHttpClient {
    client: Client,
    server_url: String,
    discover_base_url: String,
}

impl PlexHttpClient {
    pub fn new(token: &str, server_url: &str) -> Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
                headers.insert(
                    HeaderName::from_static("x-plex-token"),
                    HeaderValue::from_str(token).context("Invalid token format")?,
                );
                headers.insert(
                    HeaderName::from_static("x-plex-client-identifier"),
                    HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers.insert(
                    HeaderName::from_static("x-plex-product"),
                    HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            discover_base_url: DEFAULT_DISCOVER_URL.to_string(),
        })
    }

    /// Override the discover provider base URL (watchlist endpoint).
    pub fn with_discover_base_url(mut self, url: &str) -> Self {
        self.discover_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn get_json(&self, url: &str, query: &[(String, String)], what: &str) -> Result<Value> {
        trace!("Plex GET {} query={:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to get {}", what))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Plex {} request failed with status {}: {}",
                what,
                status,
                error_text
            ));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }

    /// Fetch every page of a container, following `totalSize` when the server reports it.
    async fn get_paged(
        &self,
        url: &str,
        query: &[(String, String)],
        keys: &[&str],
        what: &str,
    ) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut start = 0usize;

        loop {
            let mut page_query = query.to_vec();
            page_query.push(("X-Plex-Container-Start".to_string(), start.to_string()));
            page_query.push(("X-Plex-Container-Size".to_string(), CONTAINER_SIZE.to_string()));

            let json = self.get_json(url, &page_query, what).await?;
            let page = container_items(&json, keys);
            let fetched = page.len();
            items.extend(page.into_iter().cloned());
            start += fetched;

            let total = json
                .get("MediaContainer")
                .and_then(|mc| mc.get("totalSize"))
                .and_then(|t| t.as_u64())
                .and_then(|t| usize::try_from(t).ok());

            match total {
                Some(total) if fetched > 0 && start < total => {
                    debug!("Plex {}: fetched {}/{} items, requesting next page", what, start, total);
                }
                _ => break,
            }
        }

        Ok(items)
    }

    pub async fn get_watchlist(&self, media_type: MediaType) -> Result<Vec<WatchlistItem>> {
        let url = format!("{}/library/sections/watchlist/all", self.discover_base_url);
        let query = vec![
            ("type".to_string(), media_type.type_code().to_string()),
            ("includeGuids".to_string(), "1".to_string()),
        ];
        let raw = self.get_paged(&url, &query, &["Metadata"], "watchlist").await?;
        debug!("Plex watchlist API returned {} items", raw.len());

        let mut watchlist = Vec::new();
        for item in &raw {
            match parse_watchlist_item(item) {
                Some(parsed) if parsed.media_type == media_type => watchlist.push(parsed),
                Some(parsed) => {
                    debug!("Plex watchlist: skipping '{}' ({}), not a {}", parsed.title, parsed.media_type, media_type);
                }
                None => {
                    debug!("Plex watchlist: skipping entry missing guid/title/type: {:?}", item.get("title"));
                }
            }
        }

        Ok(watchlist)
    }

    pub async fn get_library_sections(&self) -> Result<Vec<LibrarySection>> {
        let url = format!("{}/library/sections", self.server_url);
        let json = self.get_json(&url, &[], "library sections").await?;
        Ok(container_items(&json, &["Directory"])
            .into_iter()
            .filter_map(parse_library_section)
            .collect())
    }

    pub async fn get_library_items(&self, section_key: &str, media_type: MediaType) -> Result<Vec<LibraryItem>> {
        let url = format!("{}/library/sections/{}/all", self.server_url, section_key);
        let query = vec![
            ("type".to_string(), media_type.type_code().to_string()),
            ("includeGuids".to_string(), "1".to_string()),
        ];
        let raw = self
            .get_paged(&url, &query, &["Metadata", "Video", "Directory"], "library items")
            .await?;

        let items: Vec<LibraryItem> = raw.iter().filter_map(parse_library_item).collect();
        debug!("Plex library section {}: {} items ({} without guid skipped)", section_key, items.len(), raw.len() - items.len());
        Ok(items)
    }

    pub async fn get_dvrs(&self) -> Result<Vec<Dvr>> {
        let url = format!("{}/livetv/dvrs", self.server_url);
        let json = self.get_json(&url, &[], "DVRs").await?;
        Ok(container_items(&json, &["Dvr"]).into_iter().filter_map(parse_dvr).collect())
    }

    pub async fn get_dvr_settings(&self, dvr_key: &str) -> Result<Vec<Setting>> {
        let url = format!("{}/livetv/dvrs/{}", self.server_url, dvr_key);
        let json = self.get_json(&url, &[], "DVR settings").await?;

        let settings = container_items(&json, &["Dvr"])
            .first()
            .and_then(|dvr| dvr.get("Setting"))
            .and_then(|s| s.as_array())
            .map(|arr| arr.iter().filter_map(parse_setting).collect())
            .unwrap_or_default();
        Ok(settings)
    }

    pub async fn get_dvr_sections(&self, epg_identifier: &str) -> Result<Vec<DvrSection>> {
        let url = format!("{}/{}/sections", self.server_url, epg_identifier);
        let json = self.get_json(&url, &[], "DVR sections").await?;
        Ok(container_items(&json, &["Directory"])
            .into_iter()
            .filter_map(parse_dvr_section)
            .collect())
    }

    pub async fn search_dvr_section(
        &self,
        epg_identifier: &str,
        section_key: &str,
        query: &SearchQuery,
        fallback_type: MediaType,
    ) -> Result<Vec<DvrCandidate>> {
        let url = format!("{}/{}/sections/{}/all", self.server_url, epg_identifier, section_key);
        let raw = self
            .get_paged(&url, &query.to_pairs(), &["Metadata", "Video", "Directory"], "DVR search")
            .await?;

        Ok(raw
            .iter()
            .filter_map(|item| parse_dvr_candidate(item, fallback_type))
            .collect())
    }

    pub async fn get_media_providers(&self) -> Result<Vec<MediaProvider>> {
        let url = format!("{}/media/providers", self.server_url);
        let json = self.get_json(&url, &[], "media providers").await?;
        Ok(container_items(&json, &["MediaProvider"])
            .into_iter()
            .filter_map(parse_media_provider)
            .collect())
    }

    pub async fn get_subscriptions(&self) -> Result<Vec<Subscription>> {
        let url = format!("{}/media/subscriptions", self.server_url);
        let json = self.get_json(&url, &[], "subscriptions").await?;
        Ok(container_items(&json, &["MediaSubscription"])
            .into_iter()
            .filter_map(parse_subscription)
            .collect())
    }

    pub async fn post_subscription(&self, payload: &SubmissionPayload) -> Result<()> {
        let url = format!("{}/media/subscriptions", self.server_url);
        let response = self
            .client
            .post(&url)
            .query(payload.pairs())
            .send()
            .await
            .context("Failed to submit recording")?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            Err(anyhow::anyhow!(
                "Plex recording submission failed with status {}: {}",
                status,
                error_text
            ))
        }
    }
}

/// Items of the first array found under `MediaContainer` for any of `keys`.
fn container_items<'a>(json: &'a Value, keys: &[&str]) -> Vec<&'a Value> {
    let Some(media_container) = json.get("MediaContainer") else {
        return Vec::new();
    };
    keys.iter()
        .filter_map(|key| media_container.get(*key))
        .find_map(|v| v.as_array())
        .map(|arr| arr.iter().collect())
        .unwrap_or_default()
}

// Plex is inconsistent about quoting ids and numbers in JSON, so accept both.
fn string_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn u64_field(item: &Value, key: &str) -> Option<u64> {
    match item.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn u32_field(item: &Value, key: &str) -> Option<u32> {
    u64_field(item, key).and_then(|v| u32::try_from(v).ok())
}

fn parse_timestamp(item: &Value, key: &str) -> Option<DateTime<Utc>> {
    let secs = match item.get(key)? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };
    Utc.timestamp_opt(secs, 0).single()
}

/// First nested media item: subscriptions wrap it as Video, Directory or Metadata,
/// either as an object or a one-element array.
fn nested_item(item: &Value) -> Option<&Value> {
    ["Video", "Directory", "Metadata"].iter().find_map(|key| match item.get(*key)? {
        Value::Array(arr) => arr.first(),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    })
}

pub(crate) fn parse_watchlist_item(item: &Value) -> Option<WatchlistItem> {
    let guid = string_field(item, "guid")?;
    let title = string_field(item, "title")?;
    let media_type = MediaType::from_plex_type(item.get("type")?.as_str()?)?;

    Some(WatchlistItem {
        title,
        year: u32_field(item, "year"),
        media_type,
        guid,
        duration: u64_field(item, "duration"),
        thumb: string_field(item, "thumb"),
    })
}

pub(crate) fn parse_library_item(item: &Value) -> Option<LibraryItem> {
    Some(LibraryItem {
        guid: string_field(item, "guid")?,
        duration: u64_field(item, "duration"),
    })
}

pub(crate) fn parse_library_section(dir: &Value) -> Option<LibrarySection> {
    Some(LibrarySection {
        key: string_field(dir, "key")?,
        type_: string_field(dir, "type").unwrap_or_default(),
        title: string_field(dir, "title")?,
    })
}

pub(crate) fn parse_dvr(item: &Value) -> Option<Dvr> {
    Some(Dvr {
        key: string_field(item, "key")?,
        epg_identifier: string_field(item, "epgIdentifier")?,
    })
}

pub(crate) fn parse_dvr_section(dir: &Value) -> Option<DvrSection> {
    Some(DvrSection {
        key: string_field(dir, "key")?,
        title: string_field(dir, "title")?,
        type_: string_field(dir, "type").unwrap_or_default(),
    })
}

pub(crate) fn parse_dvr_candidate(item: &Value, fallback_type: MediaType) -> Option<DvrCandidate> {
    let media_type = item
        .get("type")
        .and_then(|t| t.as_str())
        .and_then(MediaType::from_plex_type)
        .unwrap_or(fallback_type);

    Some(DvrCandidate {
        rating_key: string_field(item, "ratingKey"),
        guid: string_field(item, "guid")?,
        title: string_field(item, "title")?,
        year: u32_field(item, "year"),
        media_type,
        thumb: string_field(item, "thumb"),
    })
}

fn pref_value(setting_type: SettingType, value: &Value) -> Option<PrefValue> {
    match (setting_type, value) {
        (_, Value::Null) => None,
        (SettingType::Bool, Value::Bool(b)) => Some(PrefValue::Bool(*b)),
        (SettingType::Bool, Value::Number(n)) => n.as_i64().map(|n| PrefValue::Bool(n != 0)),
        (SettingType::Bool, Value::String(s)) => match s.as_str() {
            "true" | "1" => Some(PrefValue::Bool(true)),
            "false" | "0" => Some(PrefValue::Bool(false)),
            _ => None,
        },
        (SettingType::Int, Value::Number(n)) => n.as_i64().map(PrefValue::Int),
        (SettingType::Int, Value::String(s)) => s.parse().ok().map(PrefValue::Int),
        (SettingType::Double, Value::Number(n)) => n.as_f64().map(PrefValue::Double),
        (SettingType::Double, Value::String(s)) => s.parse().ok().map(PrefValue::Double),
        (_, Value::String(s)) => Some(PrefValue::Text(s.clone())),
        (_, Value::Number(n)) => Some(PrefValue::Text(n.to_string())),
        (_, Value::Bool(b)) => Some(PrefValue::Bool(*b)),
        _ => None,
    }
}

pub(crate) fn parse_setting(item: &Value) -> Option<Setting> {
    let id = string_field(item, "id")?;
    let setting_type = item
        .get("type")
        .and_then(|t| t.as_str())
        .map(SettingType::from_plex_type)
        .unwrap_or(SettingType::Text);

    Some(Setting {
        id,
        setting_type,
        value: item.get("value").and_then(|v| pref_value(setting_type, v)),
        default: item.get("default").and_then(|v| pref_value(setting_type, v)),
        enum_values: string_field(item, "enumValues").map(|raw| parse_enum_values(&raw)),
    })
}

pub(crate) fn parse_media_provider(item: &Value) -> Option<MediaProvider> {
    Some(MediaProvider {
        identifier: string_field(item, "identifier"),
        id: string_field(item, "id")?,
        parent_id: string_field(item, "parentID"),
        protocols: string_field(item, "protocols"),
    })
}

pub(crate) fn parse_subscription(item: &Value) -> Option<Subscription> {
    let type_code = string_field(item, "type")?;
    let nested = nested_item(item)?;

    Some(Subscription {
        key: string_field(item, "key"),
        type_code,
        title: string_field(item, "title"),
        target_library_section_id: string_field(item, "targetLibrarySectionID"),
        created_at: parse_timestamp(item, "createdAt"),
        item: SubscribedItem {
            title: string_field(nested, "title")?,
            year: u32_field(nested, "year"),
        },
    })
}
