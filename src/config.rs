use crate::FormfillError;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LANGUAGE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})?$").unwrap()
});

#[derive(Debug, Deserialize, Default)]
pub struct FormfillConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backfill: BackfillConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackfillConfig {
    /// Language key read from `name_in_apply_json` and fund `title_json`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Display name used when a form has no name in `language`.
    #[serde(default = "default_placeholder_name")]
    pub placeholder_name: String,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            placeholder_name: default_placeholder_name(),
        }
    }
}

fn default_language() -> String {
    "en".into()
}

fn default_placeholder_name() -> String {
    "Unnamed".into()
}

/// Settings handed to the runner. Built once from config, passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillSettings {
    pub language: String,
    pub placeholder_name: String,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        BackfillSettings::from(&BackfillConfig::default())
    }
}

impl From<&BackfillConfig> for BackfillSettings {
    fn from(config: &BackfillConfig) -> Self {
        Self {
            language: config.language.clone(),
            placeholder_name: config.placeholder_name.clone(),
        }
    }
}

/// Load config from an explicit path, FORMFILL_CONFIG, ~/.formfill/config.toml, or defaults.
///
/// An explicit path that does not exist is an error; the implicit locations
/// fall back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<FormfillConfig, FormfillError> {
    if let Some(p) = explicit {
        if !p.exists() {
            return Err(FormfillError::Config(format!(
                "config file not found: {}",
                p.display()
            )));
        }
        return read_config(p);
    }
    match config_path() {
        Some(p) if p.exists() => read_config(&p),
        _ => Ok(FormfillConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<FormfillConfig, FormfillError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)
        .map_err(|e| FormfillError::Config(format!("{}: {e}", path.display())))?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<FormfillConfig, String> {
    let config: FormfillConfig = toml::from_str(content).map_err(|e| e.to_string())?;
    validate_config(&config)?;
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("FORMFILL_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".formfill").join("config.toml"))
}

fn validate_config(config: &FormfillConfig) -> Result<(), String> {
    if !LANGUAGE_CODE.is_match(&config.backfill.language) {
        return Err(format!(
            "backfill.language {:?} is not a language code",
            config.backfill.language
        ));
    }
    if config.backfill.placeholder_name.trim().is_empty() {
        return Err("backfill.placeholder_name must not be empty".into());
    }
    Ok(())
}

pub fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".formfill").join("formfill.db")
}

/// `--db` / FORMFILL_DB wins, then `database.path`, then ~/.formfill/formfill.db.
pub fn resolve_db_path(cli_db: Option<PathBuf>, config: &FormfillConfig) -> PathBuf {
    cli_db
        .or_else(|| config.database.path.clone())
        .unwrap_or_else(default_db_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_no_file() {
        let config = FormfillConfig::default();
        assert_eq!(config.backfill.language, "en");
        assert_eq!(config.backfill.placeholder_name, "Unnamed");
        assert!(config.database.path.is_none());
    }

    #[test]
    fn parse_full_config() {
        let config = parse_config(
            r#"
[database]
path = "/srv/forms/app.db"

[backfill]
language = "cy"
placeholder_name = "Di-enw"
"#,
        )
        .unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/srv/forms/app.db")));
        let settings = BackfillSettings::from(&config.backfill);
        assert_eq!(settings.language, "cy");
        assert_eq!(settings.placeholder_name, "Di-enw");
    }

    #[test]
    fn partial_backfill_section_keeps_defaults() {
        let config = parse_config("[backfill]\nlanguage = \"en-GB\"\n").unwrap();
        assert_eq!(config.backfill.language, "en-GB");
        assert_eq!(config.backfill.placeholder_name, "Unnamed");
    }

    #[test]
    fn invalid_language_rejected() {
        let err = parse_config("[backfill]\nlanguage = \"English please\"\n").unwrap_err();
        assert!(err.contains("not a language code"), "{err}");
    }

    #[test]
    fn blank_placeholder_rejected() {
        assert!(parse_config("[backfill]\nplaceholder_name = \"  \"\n").is_err());
    }

    #[test]
    fn explicit_missing_config_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_config(Some(missing.as_path())),
            Err(FormfillError::Config(_))
        ));
    }

    #[test]
    fn explicit_config_file_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backfill]\nplaceholder_name = \"Untitled\"\n").unwrap();
        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.backfill.placeholder_name, "Untitled");
    }

    #[test]
    fn db_path_precedence() {
        let config = parse_config("[database]\npath = \"/from/config.db\"\n").unwrap();
        assert_eq!(
            resolve_db_path(Some(PathBuf::from("/from/cli.db")), &config),
            PathBuf::from("/from/cli.db")
        );
        assert_eq!(
            resolve_db_path(None, &config),
            PathBuf::from("/from/config.db")
        );
        assert_eq!(
            resolve_db_path(None, &FormfillConfig::default()),
            default_db_path()
        );
    }
}
