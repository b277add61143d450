use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::panel::MAX_REPLACEMENTS;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/proofpad/config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to create config directory")]
    CreateDirError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub endpoint: String,
    pub language: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.languagetool.org/v2/check".to_string(),
            language: "en-US".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    pub max_replacements: usize,
    pub message_timeout_secs: u64,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            max_replacements: MAX_REPLACEMENTS,
            message_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub checker: CheckerConfig,
    pub ui: UIConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let path = Path::new(path);

        // If the file doesn't exist, return default config
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let path = Path::new(path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::CreateDirError)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Command-line overrides win over the file.
    pub fn with_overrides(mut self, endpoint: Option<String>, language: Option<String>) -> Self {
        if let Some(endpoint) = endpoint {
            self.checker.endpoint = endpoint;
        }
        if let Some(language) = language {
            self.checker.language = language;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.checker.language, "en-US");
        assert_eq!(config.ui.max_replacements, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.checker.endpoint = "http://localhost:8081/v2/check".to_string();
        config.ui.max_replacements = 3;
        config.save(path).unwrap();

        assert_eq!(Config::load(path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"checker": {"language": "de-DE"}}"#).unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.checker.language, "de-DE");
        assert_eq!(config.checker.endpoint, CheckerConfig::default().endpoint);
        assert_eq!(config.ui, UIConfig::default());
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Config::load(path.to_str().unwrap()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(None, Some("fr".to_string()));
        assert_eq!(config.checker.language, "fr");
        assert_eq!(config.checker.endpoint, CheckerConfig::default().endpoint);
    }
}
