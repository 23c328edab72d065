//! Server configuration and game rules.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Tunable rules for every session the server hosts.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct GameRules {
    /// How long a player may hold the turn before it is skipped.
    turn_timeout: Duration,
    /// Silent full rounds after which the game ends.
    idle_rounds_to_end: usize,
    /// Lobby capacity.
    max_players: usize,
    /// Lobby code attempts before giving up.
    code_attempts: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(default_turn_timeout_secs()),
            idle_rounds_to_end: default_idle_rounds(),
            max_players: default_max_players(),
            code_attempts: default_code_attempts(),
        }
    }
}

/// Server settings, loadable from TOML. Every field has a default.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database file for match history.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Newline-separated word list. Without one any alphabetic word is accepted.
    #[serde(default)]
    dictionary_path: Option<PathBuf>,

    /// Required substring of the WebSocket `Origin` header, if set.
    #[serde(default)]
    allowed_origin: Option<String>,

    /// Seconds before an idle turn is skipped.
    #[serde(default = "default_turn_timeout_secs")]
    turn_timeout_secs: u64,

    /// Silent full rounds before the game ends.
    #[serde(default = "default_idle_rounds")]
    idle_rounds_to_end: usize,

    /// Lobby capacity.
    #[serde(default = "default_max_players")]
    max_players: usize,

    /// Lobby code attempts before giving up.
    #[serde(default = "default_code_attempts")]
    code_attempts: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "strictly_grams.db".to_string()
}

fn default_turn_timeout_secs() -> u64 {
    30
}

fn default_idle_rounds() -> usize {
    3
}

fn default_max_players() -> usize {
    5
}

fn default_code_attempts() -> usize {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            dictionary_path: None,
            allowed_origin: None,
            turn_timeout_secs: default_turn_timeout_secs(),
            idle_rounds_to_end: default_idle_rounds(),
            max_players: default_max_players(),
            code_attempts: default_code_attempts(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line and environment overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        database_path: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(path) = database_path {
            self.database_path = path;
        }
        self
    }

    /// Game rules derived from this configuration.
    pub fn rules(&self) -> GameRules {
        GameRules::default()
            .with_turn_timeout(Duration::from_secs(self.turn_timeout_secs))
            .with_idle_rounds_to_end(self.idle_rounds_to_end)
            .with_max_players(self.max_players)
            .with_code_attempts(self.code_attempts)
    }

    #[instrument(skip(self))]
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_players < 2 {
            return Err(ConfigError::new(format!(
                "max_players must be at least 2, got {}",
                self.max_players
            )));
        }
        if self.idle_rounds_to_end == 0 || self.code_attempts == 0 || self.turn_timeout_secs == 0 {
            return Err(ConfigError::new(
                "idle_rounds_to_end, code_attempts and turn_timeout_secs must be positive",
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
