use crate::builder::BuildError;
use crate::config::BackfillSettings;
use serde_json::{Map, Value};

/// A row of the `form` table, as far as the backfill cares.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRecord {
    pub form_id: String,
    /// Raw `name_in_apply_json` text: a JSON object keyed by language code.
    pub name_in_apply_json: Option<String>,
    pub section_id: Option<String>,
    pub runner_publish_name: Option<String>,
    pub form_json: Option<Value>,
}

impl FormRecord {
    /// Localized name, or the placeholder when the language key is absent.
    /// A missing or malformed mapping is an error.
    pub fn display_name(&self, settings: &BackfillSettings) -> Result<String, RecordError> {
        let raw = self
            .name_in_apply_json
            .as_deref()
            .ok_or_else(|| RecordError::Name("form has no name_in_apply_json".into()))?;
        let mapping = parse_mapping(raw)
            .map_err(RecordError::Name)?
            .ok_or_else(|| RecordError::Name("name_in_apply_json is null".into()))?;
        let name = pick(&mapping, &settings.language).map_err(RecordError::Name)?;
        Ok(name.unwrap_or_else(|| settings.placeholder_name.clone()))
    }
}

/// Failure confined to one form. The runner counts it and moves on.
#[derive(Debug)]
pub enum RecordError {
    Name(String),
    Title(String),
    Lookup(rusqlite::Error),
    Build(BuildError),
    Json(serde_json::Error),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::Name(msg) => write!(f, "name: {msg}"),
            RecordError::Title(msg) => write!(f, "fund title: {msg}"),
            RecordError::Lookup(e) => write!(f, "fund title lookup: {e}"),
            RecordError::Build(e) => write!(f, "build: {e}"),
            RecordError::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Lookup(e)
    }
}

impl From<BuildError> for RecordError {
    fn from(e: BuildError) -> Self {
        RecordError::Build(e)
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Json(e)
    }
}

/// Parse a multilingual JSON column. JSON `null` means no mapping.
pub fn parse_mapping(raw: &str) -> Result<Option<Map<String, Value>>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(format!("expected an object keyed by language, got {other}")),
    }
}

/// Value for `language`; absent or null keys are `None`, anything but a string is an error.
pub fn pick(mapping: &Map<String, Value>, language: &str) -> Result<Option<String>, String> {
    match mapping.get(language) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!("{language:?} entry is not a string: {other}")),
    }
}

/// Title for `language` from a fund's raw `title_json`. Absence at any level is `None`.
pub fn localized_title(raw: Option<&str>, language: &str) -> Result<Option<String>, RecordError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match parse_mapping(raw).map_err(RecordError::Title)? {
        Some(mapping) => pick(&mapping, language).map_err(RecordError::Title),
        None => Ok(None),
    }
}
