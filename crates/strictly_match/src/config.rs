//! Application configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strictly_chess::{Color, Difficulty};
use tracing::{debug, info, instrument};

use crate::error::located_error;

/// Environment variable that overrides [`AppConfig::bot_url`].
pub const BOT_URL_ENV: &str = "STRICTLY_MATCH_BOT_URL";

/// Runtime settings for the match binary.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Move service endpoint. Without one every bot move is a random fallback.
    #[serde(default)]
    bot_url: Option<String>,

    /// Bound on each remote move request, in seconds.
    #[serde(default = "default_bot_timeout_secs")]
    bot_timeout_secs: u64,

    /// Difficulty for new matches.
    #[serde(default)]
    difficulty: Difficulty,

    /// Side the human plays in new matches.
    #[serde(default = "default_human_color")]
    human_color: Color,

    /// SQLite database file for saved sessions.
    #[serde(default = "default_db_path")]
    db_path: String,
}

#[instrument]
fn default_bot_timeout_secs() -> u64 {
    8
}

#[instrument]
fn default_human_color() -> Color {
    Color::White
}

#[instrument]
fn default_db_path() -> String {
    "strictly_match.db".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_url: None,
            bot_timeout_secs: default_bot_timeout_secs(),
            difficulty: Difficulty::default(),
            human_color: default_human_color(),
            db_path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(bot_url = ?config.bot_url, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads `path` if it exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_bot_url_override(std::env::var(BOT_URL_ENV).ok())
    }

    /// Replaces the bot endpoint when `bot_url` is a non-empty value.
    #[instrument(skip(self))]
    pub fn with_bot_url_override(mut self, bot_url: Option<String>) -> Self {
        if let Some(url) = bot_url.filter(|u| !u.trim().is_empty()) {
            info!(bot_url = %url, "Bot endpoint overridden");
            self.bot_url = Some(url);
        }
        self
    }

    /// Replaces the database path.
    pub fn with_db_path(mut self, db_path: String) -> Self {
        self.db_path = db_path;
        self
    }

    /// Remote call bound as a [`Duration`].
    pub fn bot_timeout(&self) -> Duration {
        Duration::from_secs(self.bot_timeout_secs)
    }
}

located_error!(
    /// Configuration error.
    pub struct ConfigError,
    "Config error"
);
