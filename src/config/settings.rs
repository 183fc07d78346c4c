use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::llm::Provider;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Assistant settings, stored as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "lenient_provider")]
    pub provider: Provider,
    #[serde(deserialize_with = "lenient_string")]
    pub gemini_key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub open_router_key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub model: String,
}

impl Settings {
    /// Key for the selected provider, if one has been entered.
    pub fn api_key(&self) -> Option<&str> {
        let key = match self.provider {
            Provider::Gemini => &self.gemini_key,
            Provider::OpenRouter => &self.open_router_key,
        };
        let key = key.trim();
        (!key.is_empty()).then_some(key)
    }

    /// Set a single field by its JSON key name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "provider" => {
                self.provider = Provider::from_name(value)
                    .ok_or_else(|| format!("Unknown provider: {}", value))?;
            }
            "gemini_key" => self.gemini_key = value.to_string(),
            "open_router_key" => self.open_router_key = value.to_string(),
            "model" => self.model = value.to_string(),
            other => return Err(format!("Unknown setting: {}", other)),
        }
        Ok(())
    }

    /// Copy with API keys masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            gemini_key: mask(&self.gemini_key),
            open_router_key: mask(&self.open_router_key),
            ..self.clone()
        }
    }
}

fn mask(key: &str) -> String {
    let n = key.chars().count();
    if n <= 4 {
        return "*".repeat(n);
    }
    let tail: String = key.chars().skip(n - 4).collect();
    format!("{}{}", "*".repeat(n - 4), tail)
}

/// A string field; `null` or any other JSON type reads as empty so one bad
/// value does not discard the rest of the file.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => {
            tracing::warn!("Ignoring non-string settings value {}", other);
            String::new()
        }
    })
}

fn lenient_provider<'de, D>(deserializer: D) -> Result<Provider, D::Error>
where
    D: Deserializer<'de>,
{
    let name = lenient_string(deserializer)?;
    Ok(Provider::from_name(&name).unwrap_or_else(|| {
        if !name.is_empty() {
            tracing::warn!("Unknown provider {:?} in settings, using default", name);
        }
        Provider::default()
    }))
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    config_path: PathBuf,
}

impl SettingsStore {
    /// Store in the platform config directory, or the working directory
    /// when the platform has none.
    pub fn new() -> Self {
        Self::platform().unwrap_or_else(|e| {
            tracing::warn!("{}; keeping settings in the working directory", e);
            Self::at("settings.json")
        })
    }

    pub fn platform() -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from("com", "mdpress", "mdpress")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::at(dirs.config_dir().join("settings.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Missing, unreadable or malformed files yield default settings.
    pub fn load(&self) -> Settings {
        fs::read_to_string(&self.config_path)
            .ok()
            .and_then(|s| match serde_json::from_str(&s) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable settings {:?}: {}", self.config_path, e);
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(dir) = self.config_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, json).map_err(|source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        })
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("nope.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_empty_and_malformed_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        fs::write(&path, "").unwrap();
        assert_eq!(SettingsStore::at(&path).load(), Settings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(SettingsStore::at(&path).load(), Settings::default());

        fs::write(&path, "{}").unwrap();
        assert_eq!(SettingsStore::at(&path).load(), Settings::default());
    }

    #[test]
    fn test_round_trip_uses_flat_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("nested/settings.json"));
        let settings = Settings {
            provider: Provider::OpenRouter,
            gemini_key: String::new(),
            open_router_key: "sk-or-123".into(),
            model: "openai/gpt-4o-mini".into(),
        };

        store.save(&settings).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["provider"], "OpenRouter");
        assert_eq!(raw["open_router_key"], "sk-or-123");
        assert_eq!(raw["model"], "openai/gpt-4o-mini");
        assert_eq!(raw["gemini_key"], "");

        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_reads_files_written_by_older_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"provider": "Google Gemini", "gemini_key": "g-key", "model": "x"}"#,
        )
        .unwrap();

        let settings = SettingsStore::at(&path).load();
        assert_eq!(settings.provider, Provider::Gemini);
        assert_eq!(settings.api_key(), Some("g-key"));
        assert_eq!(settings.open_router_key, "");
    }

    #[test]
    fn test_unknown_provider_falls_back_to_default() {
        let settings: Settings =
            serde_json::from_str(r#"{"provider": "Somebody Else", "gemini_key": "k"}"#).unwrap();
        assert_eq!(settings.provider, Provider::Gemini);
        assert_eq!(settings.gemini_key, "k");
    }

    #[test]
    fn test_bad_field_only_resets_itself() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"provider": 7, "gemini_key": null, "open_router_key": "or-key", "model": ["x"]}"#,
        )
        .unwrap();

        let settings = SettingsStore::at(&path).load();
        assert_eq!(settings.provider, Provider::Gemini);
        assert_eq!(settings.gemini_key, "");
        assert_eq!(settings.open_router_key, "or-key");
        assert_eq!(settings.model, "");
    }

    #[test]
    fn test_api_key_follows_provider() {
        let mut settings = Settings {
            gemini_key: "  ".into(),
            open_router_key: "or".into(),
            ..Settings::default()
        };
        assert_eq!(settings.api_key(), None);

        settings.provider = Provider::OpenRouter;
        assert_eq!(settings.api_key(), Some("or"));
    }

    #[test]
    fn test_set_by_key() {
        let mut settings = Settings::default();
        settings.set("provider", "OpenRouter").unwrap();
        settings.set("model", "meta/llama").unwrap();
        assert_eq!(settings.provider, Provider::OpenRouter);
        assert_eq!(settings.model, "meta/llama");
        assert!(settings.set("provider", "Nope").is_err());
        assert!(settings.set("colour", "blue").is_err());
    }

    #[test]
    fn test_redacted_masks_keys() {
        let settings = Settings {
            gemini_key: "abcdefgh".into(),
            open_router_key: "xyz".into(),
            ..Settings::default()
        };
        let shown = settings.redacted();
        assert_eq!(shown.gemini_key, "****efgh");
        assert_eq!(shown.open_router_key, "***");
    }
}
