use dvr_sync_models::MediaType;

/// Query for a DVR (or library) section `all` endpoint.
///
/// Plain arguments (`includeGuids`, `title`, `sort`, `type`, `limit`) come first,
/// followed by filter fields such as `year` in insertion order.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    title: Option<String>,
    media_type: Option<MediaType>,
    sort: Option<String>,
    limit: Option<u32>,
    include_guids: bool,
    filters: Vec<(String, String)>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self {
            title: None,
            media_type: None,
            sort: None,
            limit: None,
            include_guids: true,
            filters: Vec::new(),
        }
    }

    /// Title search. The server matches loosely (substring), callers filter exact hits.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn year(self, year: u32) -> Self {
        self.filter("year", year.to_string())
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_guids(mut self, include: bool) -> Self {
        self.include_guids = include;
        self
    }

    /// Add a filter field, e.g. `("year", "2021")` or `("genre", "12")`.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![(
            "includeGuids".to_string(),
            if self.include_guids { "1" } else { "0" }.to_string(),
        )];
        if let Some(ref title) = self.title {
            pairs.push(("title".to_string(), title.clone()));
        }
        if let Some(ref sort) = self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(media_type) = self.media_type {
            pairs.push(("type".to_string(), media_type.type_code().to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }

    /// Relative request key, e.g. `/tv.plex.providers.epg.cloud:7/sections/3/all?includeGuids=1&title=Dune`.
    pub fn key(&self, epg_identifier: &str, section_key: &str) -> String {
        let params = self
            .to_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("/{}/sections/{}/all?{}", epg_identifier, section_key, params)
    }
}
