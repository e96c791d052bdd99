//! Builds the form payload for `POST /media/subscriptions` ("record this item").

use std::collections::BTreeMap;

use dvr_sync_models::{DvrCandidate, MediaProvider, PrefValue, Setting, SettingType};
use tracing::debug;

use crate::error::SourceError;

const LIVE_TV_PROTOCOL: &str = "livetv";

/// Recording preferences sent when the DVR does not report its own value.
pub fn default_preferences() -> Vec<(&'static str, PrefValue)> {
    vec![
        ("minVideoQuality", PrefValue::Int(0)),
        ("replaceLowerQuality", PrefValue::Bool(false)),
        ("recordPartials", PrefValue::Bool(false)),
        ("startOffsetMinutes", PrefValue::Int(0)),
        ("endOffsetMinutes", PrefValue::Int(0)),
        ("lineupChannel", PrefValue::Text(String::new())),
        ("startTimeslot", PrefValue::Int(-1)),
        ("comskipEnabled", PrefValue::Int(-1)),
        ("comskipMethod", PrefValue::Int(2)),
        ("oneShot", PrefValue::Bool(true)),
        ("remoteMedia", PrefValue::Bool(false)),
    ]
}

/// Overlay server-reported values onto the defaults. Only keys present in
/// `defaults` are emitted, in the order of `defaults`.
pub fn merge_preferences(defaults: &[(&str, PrefValue)], settings: &[Setting]) -> Vec<(String, PrefValue)> {
    defaults
        .iter()
        .map(|(id, default)| {
            let value = settings
                .iter()
                .find(|s| s.id == *id)
                .and_then(|s| s.value.clone())
                .unwrap_or_else(|| default.clone());
            (id.to_string(), value)
        })
        .collect()
}

/// The live TV provider that belongs to the DVR with `dvr_key`.
pub fn resolve_live_tv_provider<'a>(providers: &'a [MediaProvider], dvr_key: &str) -> Result<&'a MediaProvider, SourceError> {
    providers
        .iter()
        .find(|p| p.parent_id.as_deref() == Some(dvr_key) && p.protocols.as_deref() == Some(LIVE_TV_PROTOCOL))
        .ok_or_else(|| SourceError::ProviderNotFound { dvr_key: dvr_key.to_string() })
}

/// Check a caller override against the DVR's settings and return the value to send.
pub fn validate_override(settings: &[Setting], id: &str, value: &str) -> Result<String, SourceError> {
    let Some(setting) = settings.iter().find(|s| s.id == id) else {
        let known: Vec<&str> = settings.iter().map(|s| s.id.as_str()).collect();
        return Err(SourceError::NotFound(format!("{} not found in {:?}", id, known)));
    };

    if setting.setting_type == SettingType::Bool {
        return match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(PrefValue::Bool(true).to_param()),
            "false" | "0" => Ok(PrefValue::Bool(false).to_param()),
            _ => Err(SourceError::NotFound(format!("{} not found in [false, true] for {}", value, id))),
        };
    }

    match setting.enum_values {
        Some(ref legal) if !legal.iter().any(|v| v == value) => Err(SourceError::NotFound(format!(
            "{} not found in {:?} for {}",
            value, legal, id
        ))),
        _ => Ok(value.to_string()),
    }
}

/// `hints[ratingKey]`: the rating key when the guide entry has one, else the escaped guid.
pub fn rating_key_hint(candidate: &DvrCandidate) -> String {
    match candidate.rating_key.as_deref() {
        Some(key) if !key.trim().is_empty() => key.to_string(),
        _ => urlencoding::encode(&candidate.guid).into_owned(),
    }
}

/// Ordered key/value pairs for one subscription request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionPayload {
    pairs: Vec<(String, String)>,
}

impl SubmissionPayload {
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Replace the value of an existing key, or append it.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }
}

fn pref_key(id: &str) -> String {
    format!("prefs[{}]", id)
}

fn hint_key(id: &str) -> String {
    format!("hints[{}]", id)
}

fn param_key(id: &str) -> String {
    format!("params[{}]", id)
}

/// Everything the builder needs about one recording.
#[derive(Debug, Clone)]
pub struct SubmissionRequest<'a> {
    pub target: &'a DvrCandidate,
    pub thumb_override: Option<&'a str>,
    pub settings: &'a [Setting],
    pub providers: &'a [MediaProvider],
    pub dvr_key: &'a str,
    pub target_section_id: &'a str,
    pub overrides: &'a BTreeMap<String, String>,
}

/// Assemble the subscription payload.
///
/// # Errors
///
/// `ProviderNotFound` when the DVR has no live TV provider, `NotFound` when an
/// override names an unknown setting or an illegal value.
pub fn build_submission(request: &SubmissionRequest<'_>) -> Result<SubmissionPayload, SourceError> {
    let target = request.target;
    let type_code = target.media_type.type_code();
    let mut payload = SubmissionPayload::default();

    for (id, value) in merge_preferences(&default_preferences(), request.settings) {
        payload.set(pref_key(&id), value.to_param());
    }

    payload.set(hint_key("title"), target.title.clone());
    if let Some(year) = target.year {
        payload.set(hint_key("year"), year.to_string());
    }
    payload.set(hint_key("ratingKey"), rating_key_hint(target));
    payload.set(hint_key("guid"), target.guid.clone());
    payload.set(hint_key("type"), type_code);
    let thumb = request
        .thumb_override
        .filter(|t| !t.is_empty())
        .or(target.thumb.as_deref());
    if let Some(thumb) = thumb {
        payload.set(hint_key("thumb"), thumb);
    }

    payload.set(param_key("libraryType"), type_code);
    let provider = resolve_live_tv_provider(request.providers, request.dvr_key)?;
    payload.set(param_key("mediaProviderID"), provider.id.clone());

    payload.set("targetLibrarySectionID", request.target_section_id);
    payload.set("type", type_code);

    for (id, value) in request.overrides {
        let value = validate_override(request.settings, id, value)?;
        debug!("Recording preference override {}={}", id, value);
        payload.set(pref_key(id), value);
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvr_sync_models::MediaType;

    fn candidate() -> DvrCandidate {
        DvrCandidate {
            rating_key: Some("plex://movie/abc".to_string()),
            guid: "plex://movie/abc".to_string(),
            title: "Dune".to_string(),
            year: Some(2021),
            media_type: MediaType::Movie,
            thumb: Some("/library/metadata/1/thumb".to_string()),
        }
    }

    fn setting(id: &str, setting_type: SettingType, value: Option<PrefValue>, enum_values: Option<&[&str]>) -> Setting {
        Setting {
            id: id.to_string(),
            setting_type,
            value,
            default: None,
            enum_values: enum_values.map(|v| v.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn providers() -> Vec<MediaProvider> {
        vec![
            MediaProvider {
                identifier: Some("com.plexapp.plugins.library".to_string()),
                id: "1".to_string(),
                parent_id: None,
                protocols: Some("stream,download".to_string()),
            },
            MediaProvider {
                identifier: Some("tv.plex.providers.epg.cloud:7".to_string()),
                id: "12".to_string(),
                parent_id: Some("7".to_string()),
                protocols: Some("livetv".to_string()),
            },
        ]
    }

    fn build(
        target: &DvrCandidate,
        thumb: Option<&str>,
        settings: &[Setting],
        overrides: &BTreeMap<String, String>,
    ) -> Result<SubmissionPayload, SourceError> {
        let providers = providers();
        build_submission(&SubmissionRequest {
            target,
            thumb_override: thumb,
            settings,
            providers: &providers,
            dvr_key: "7",
            target_section_id: "70",
            overrides,
        })
    }

    #[test]
    fn test_defaults_when_server_reports_nothing() {
        let payload = build(&candidate(), None, &[], &BTreeMap::new()).unwrap();

        assert_eq!(payload.get("prefs[minVideoQuality]"), Some("0"));
        assert_eq!(payload.get("prefs[replaceLowerQuality]"), Some("false"));
        assert_eq!(payload.get("prefs[recordPartials]"), Some("false"));
        assert_eq!(payload.get("prefs[lineupChannel]"), Some(""));
        assert_eq!(payload.get("prefs[startTimeslot]"), Some("-1"));
        assert_eq!(payload.get("prefs[comskipEnabled]"), Some("-1"));
        assert_eq!(payload.get("prefs[comskipMethod]"), Some("2"));
        assert_eq!(payload.get("prefs[oneShot]"), Some("true"));
        assert_eq!(payload.get("prefs[remoteMedia]"), Some("false"));
    }

    #[test]
    fn test_payload_order_and_fixed_fields() {
        let payload = build(&candidate(), None, &[], &BTreeMap::new()).unwrap();
        let keys: Vec<&str> = payload.pairs().iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(keys[0], "prefs[minVideoQuality]");
        assert_eq!(keys[10], "prefs[remoteMedia]");
        assert_eq!(
            &keys[11..],
            &[
                "hints[title]",
                "hints[year]",
                "hints[ratingKey]",
                "hints[guid]",
                "hints[type]",
                "hints[thumb]",
                "params[libraryType]",
                "params[mediaProviderID]",
                "targetLibrarySectionID",
                "type",
            ]
        );
        assert_eq!(payload.get("params[mediaProviderID]"), Some("12"));
        assert_eq!(payload.get("targetLibrarySectionID"), Some("70"));
        assert_eq!(payload.get("type"), Some("1"));
        assert_eq!(payload.get("params[libraryType]"), Some("1"));
    }

    #[test]
    fn test_server_settings_override_defaults() {
        let settings = vec![
            setting("minVideoQuality", SettingType::Int, Some(PrefValue::Int(720)), Some(&["0", "720", "1080"])),
            setting("recordPartials", SettingType::Bool, Some(PrefValue::Bool(true)), None),
            setting("startOffsetMinutes", SettingType::Int, None, None),
            setting("unrelated", SettingType::Text, Some(PrefValue::Text("x".to_string())), None),
        ];
        let payload = build(&candidate(), None, &settings, &BTreeMap::new()).unwrap();

        assert_eq!(payload.get("prefs[minVideoQuality]"), Some("720"));
        assert_eq!(payload.get("prefs[recordPartials]"), Some("true"));
        assert_eq!(payload.get("prefs[startOffsetMinutes]"), Some("0"));
        assert_eq!(payload.get("prefs[unrelated]"), None);
    }

    #[test]
    fn test_rating_key_falls_back_to_escaped_guid() {
        let mut target = candidate();
        target.rating_key = None;
        assert_eq!(rating_key_hint(&target), "plex%3A%2F%2Fmovie%2Fabc");

        target.rating_key = Some(String::new());
        assert_eq!(rating_key_hint(&target), "plex%3A%2F%2Fmovie%2Fabc");

        target.rating_key = Some("5d776".to_string());
        assert_eq!(rating_key_hint(&target), "5d776");
    }

    #[test]
    fn test_thumb_override_and_fallback() {
        let payload = build(&candidate(), Some("https://img/override.jpg"), &[], &BTreeMap::new()).unwrap();
        assert_eq!(payload.get("hints[thumb]"), Some("https://img/override.jpg"));

        let payload = build(&candidate(), None, &[], &BTreeMap::new()).unwrap();
        assert_eq!(payload.get("hints[thumb]"), Some("/library/metadata/1/thumb"));

        let mut bare = candidate();
        bare.thumb = None;
        bare.year = None;
        let payload = build(&bare, None, &[], &BTreeMap::new()).unwrap();
        assert_eq!(payload.get("hints[thumb]"), None);
        assert_eq!(payload.get("hints[year]"), None);
    }

    #[test]
    fn test_show_type_codes() {
        let mut show = candidate();
        show.media_type = MediaType::Show;
        let payload = build(&show, None, &[], &BTreeMap::new()).unwrap();
        assert_eq!(payload.get("hints[type]"), Some("2"));
        assert_eq!(payload.get("params[libraryType]"), Some("2"));
        assert_eq!(payload.get("type"), Some("2"));
    }

    #[test]
    fn test_provider_not_found() {
        let target = candidate();
        let providers = providers();
        let overrides = BTreeMap::new();
        let result = build_submission(&SubmissionRequest {
            target: &target,
            thumb_override: None,
            settings: &[],
            providers: &providers,
            dvr_key: "99",
            target_section_id: "70",
            overrides: &overrides,
        });
        assert!(matches!(result, Err(SourceError::ProviderNotFound { ref dvr_key }) if dvr_key == "99"));
    }

    #[test]
    fn test_provider_requires_livetv_protocol() {
        let mut providers = providers();
        providers[1].protocols = Some("stream".to_string());
        assert!(resolve_live_tv_provider(&providers, "7").is_err());
    }

    #[test]
    fn test_valid_overrides_replace_prefs() {
        let settings = vec![
            setting("minVideoQuality", SettingType::Int, Some(PrefValue::Int(0)), Some(&["0", "720"])),
            setting("oneShot", SettingType::Bool, Some(PrefValue::Bool(true)), None),
            setting("lineupChannel", SettingType::Text, None, None),
        ];
        let mut overrides = BTreeMap::new();
        overrides.insert("minVideoQuality".to_string(), "720".to_string());
        overrides.insert("oneShot".to_string(), "0".to_string());
        overrides.insert("lineupChannel".to_string(), "5.1".to_string());

        let payload = build(&candidate(), None, &settings, &overrides).unwrap();
        assert_eq!(payload.get("prefs[minVideoQuality]"), Some("720"));
        assert_eq!(payload.get("prefs[oneShot]"), Some("false"));
        assert_eq!(payload.get("prefs[lineupChannel]"), Some("5.1"));
    }

    #[test]
    fn test_unknown_override_key() {
        let settings = vec![setting("oneShot", SettingType::Bool, None, None)];
        let mut overrides = BTreeMap::new();
        overrides.insert("bogus".to_string(), "1".to_string());

        let err = build(&candidate(), None, &settings, &overrides).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(ref msg) if msg.contains("bogus") && msg.contains("oneShot")));
    }

    #[test]
    fn test_illegal_override_value() {
        let settings = vec![
            setting("minVideoQuality", SettingType::Int, None, Some(&["0", "720"])),
            setting("oneShot", SettingType::Bool, None, None),
        ];

        let err = validate_override(&settings, "minVideoQuality", "480").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(ref msg) if msg.contains("480")));

        let err = validate_override(&settings, "oneShot", "maybe").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(ref msg) if msg.contains("maybe")));

        assert_eq!(validate_override(&settings, "oneShot", "TRUE").unwrap(), "true");
    }
}
