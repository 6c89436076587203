use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::Path;
use std::time::Duration;
use log::warn;

use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Translation service URL, one POST per cue
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Language selected for every newly added file
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Extra languages offered for selection
    #[serde(default = "default_available_languages")]
    pub available_languages: Vec<String>,

    /// Cues per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause before the second batch of a run, in milliseconds
    #[serde(default = "default_throttle_delay_ms")]
    pub throttle_delay_ms: u64,

    /// Per-request timeout in seconds, 0 disables it
    #[serde(default)]
    pub timeout_secs: u64,

    /// What happens to existing tasks when a file's language set changes
    #[serde(default)]
    pub language_change_policy: LanguageChangePolicy,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Handling of existing translation tasks when the language set changes
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LanguageChangePolicy {
    /// Every task of the file is re-created, even for languages that stay selected
    #[default]
    ResetAll,
    /// Tasks of languages that stay selected keep their progress and content
    PreserveExisting,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_endpoint() -> String {
    "https://b8oyl0b1p9.execute-api.us-east-1.amazonaws.com/prod/api/messages".to_string()
}

fn default_language() -> String {
    "Spanish".to_string()
}

fn default_available_languages() -> Vec<String> {
    vec!["French".to_string(), "German".to_string()]
}

fn default_batch_size() -> usize {
    100
}

fn default_throttle_delay_ms() -> u64 {
    600
}

impl Config {
    /// Load the configuration from `path`, writing the defaults there first if
    /// the file does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow!("batch_size must be at least 1"));
        }

        url::Url::parse(&self.endpoint)
            .map_err(|e| anyhow!("Invalid endpoint '{}': {}", self.endpoint, e))?;

        language_utils::validate_language_name(&self.default_language)?;
        for language in &self.available_languages {
            language_utils::validate_language_name(language)?;
        }

        Ok(())
    }

    /// Default language followed by the other selectable languages, without duplicates
    pub fn selectable_languages(&self) -> Vec<String> {
        let mut languages = vec![self.default_language.clone()];
        for language in &self.available_languages {
            if !languages.iter().any(|l| language_utils::language_names_match(l, language)) {
                languages.push(language.clone());
            }
        }
        languages
    }

    /// Per-request timeout, if one is configured
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: default_endpoint(),
            default_language: default_language(),
            available_languages: default_available_languages(),
            batch_size: default_batch_size(),
            throttle_delay_ms: default_throttle_delay_ms(),
            timeout_secs: 0,
            language_change_policy: LanguageChangePolicy::default(),
            log_level: LogLevel::default(),
        }
    }
}
