use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::RepartitionPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub defaults: Defaults,
    pub window: Window,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Defaults {
    pub word_count: usize,
    /// Selector label preselected in the form. An empty label leaves every
    /// option unchecked.
    pub repartition: Option<String>,
    pub rules_file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Window {
    pub width: f32,
    pub height: f32,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            word_count: 10,
            repartition: Some(RepartitionPolicy::LessFrequent.label().to_string()),
            rules_file: None,
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Window {
            width: 1400.0,
            height: 860.0,
        }
    }
}

impl Config {
    pub fn default_policy(&self) -> Option<RepartitionPolicy> {
        self.defaults
            .repartition
            .as_deref()
            .and_then(RepartitionPolicy::from_label)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Unknown repartition '{label}' in {path}")]
    UnknownRepartition { path: String, label: String },
}

/// Loads the configuration. A missing file is not an error: defaults apply.
pub fn load_config_from_file(file_path: &Path) -> Result<Config, ConfigError> {
    let path = file_path.display().to_string();
    let contents = match fs::read_to_string(file_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    parse_config(&path, &contents)
}

pub fn parse_config(path: &str, contents: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    if let Some(label) = &config.defaults.repartition {
        if !label.is_empty() && RepartitionPolicy::from_label(label).is_none() {
            return Err(ConfigError::UnknownRepartition {
                path: path.to_string(),
                label: label.clone(),
            });
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_policy(), Some(RepartitionPolicy::LessFrequent));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse_config("config.toml", "[defaults]\nword_count = 25\nrepartition = \"Rare\"\n").unwrap();
        assert_eq!(config.defaults.word_count, 25);
        assert_eq!(config.default_policy(), Some(RepartitionPolicy::Rare));
        assert_eq!(config.window, Window::default());
    }

    #[test]
    fn empty_repartition_selects_nothing() {
        let config = parse_config("config.toml", "[defaults]\nrepartition = \"\"\n").unwrap();
        assert_eq!(config.default_policy(), None);
    }

    #[test]
    fn unknown_repartition_is_rejected() {
        let err = parse_config("config.toml", "[defaults]\nrepartition = \"Often\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRepartition { .. }));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[defaults\n").unwrap();
        assert!(matches!(
            load_config_from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
