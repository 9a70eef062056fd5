use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "landing.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("base url '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("typewriter needs at least one word")]
    NoWords,
    #[error("typewriter word {index} is empty")]
    EmptyWord { index: usize },
    #[error("failed to parse {path}: {source}")]
    File {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub typing_speed_ms: u64,
    pub deleting_speed_ms: u64,
    pub pause_ms: u64,
    pub words: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            typing_speed_ms: 150,
            deleting_speed_ms: 100,
            pause_ms: 1000,
            words: vec!["COMING SOON".into()],
        }
    }
}

/// Keys accepted in `landing.toml`; every one is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    base_url: Option<String>,
    typing_speed_ms: Option<u64>,
    deleting_speed_ms: Option<u64>,
    pause_ms: Option<u64>,
    words: Option<Vec<String>>,
}

impl Settings {
    pub fn typing_speed(&self) -> Duration {
        Duration::from_millis(self.typing_speed_ms)
    }

    pub fn deleting_speed(&self) -> Duration {
        Duration::from_millis(self.deleting_speed_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_base_url(&self.base_url)?;
        if self.words.is_empty() {
            return Err(ConfigError::NoWords);
        }
        if let Some(index) = self.words.iter().position(String::is_empty) {
            return Err(ConfigError::EmptyWord { index });
        }
        Ok(())
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if let Some(v) = file.typing_speed_ms {
            self.typing_speed_ms = v;
        }
        if let Some(v) = file.deleting_speed_ms {
            self.deleting_speed_ms = v;
        }
        if let Some(v) = file.pause_ms {
            self.pause_ms = v;
        }
        if let Some(v) = file.words {
            self.words = v;
        }
    }
}

/// Defaults, then `landing.toml` in the working directory, then the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg = toml::from_str::<FileSettings>(&raw).map_err(|source| ConfigError::File {
            path: path.display().to_string(),
            source,
        })?;
        settings.apply_file(file_cfg);
    }

    if let Some(v) = env("LANDING_API_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.base_url = v;
    }

    settings.base_url = normalize_base_url(&settings.base_url)?;
    settings.validate()?;
    Ok(settings)
}

/// Endpoint paths start with `/`, so the base keeps no trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
