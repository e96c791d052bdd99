use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a server setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Bool,
    Int,
    Double,
    Text,
}

impl SettingType {
    pub fn from_plex_type(type_: &str) -> Self {
        match type_ {
            "bool" => SettingType::Bool,
            "int" => SettingType::Int,
            "double" => SettingType::Double,
            _ => SettingType::Text,
        }
    }
}

/// A recording preference value as it goes out on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
}

impl PrefValue {
    /// Form-encoded representation. Booleans are the literals "true"/"false".
    pub fn to_param(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            PrefValue::Int(i) => write!(f, "{}", i),
            PrefValue::Double(d) => write!(f, "{}", d),
            PrefValue::Text(s) => f.write_str(s),
        }
    }
}

/// A DVR setting reported by `/livetv/dvrs/<key>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub id: String,
    pub setting_type: SettingType,
    pub value: Option<PrefValue>,
    pub default: Option<PrefValue>,
    /// Legal values when the setting is an enumeration
    pub enum_values: Option<Vec<String>>,
}

/// Parse a Plex `enumValues` attribute into the list of legal values.
///
/// Plex sends either `value:Label|value:Label` or a bare `a|b|c` list.
pub fn parse_enum_values(raw: &str) -> Vec<String> {
    raw.split('|')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once(':') {
            Some((value, _label)) => value.to_string(),
            None => part.to_string(),
        })
        .collect()
}
