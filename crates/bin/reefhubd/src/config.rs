//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `reefhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use reefhub_app::macro_engine::MacroEngine;
use reefhub_app::scheduler::SchedulerConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Timer scheduler settings.
    pub scheduler: SchedulerSettings,
    /// Macro engine settings.
    pub macros: MacroSettings,
    /// Virtual hardware settings.
    pub hardware: HardwareConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Scheduler cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Milliseconds between two evaluations of the jobs.
    pub tick_millis: u64,
    /// Match job fields against UTC instead of local time.
    pub utc: bool,
}

/// Macro engine settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MacroSettings {
    /// Upper bound of a temperature wait without its own timeout.
    /// Unbounded when absent.
    pub waittemp_timeout_secs: Option<u64>,
}

/// Virtual hardware behaviour.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Block for the whole dose duration like a real pump would.
    pub realtime: bool,
    /// Relay channels that refuse to switch.
    pub faulty_channels: Vec<u32>,
}

impl Config {
    /// Load configuration from `reefhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("reefhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("REEFHUB_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("REEFHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("REEFHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("REEFHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("REEFHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.scheduler.tick_millis == 0 {
            return Err(ConfigError::Validation(
                "scheduler tick must be non-zero".to_string(),
            ));
        }
        if self.scheduler.tick_millis >= 1000 {
            return Err(ConfigError::Validation(
                "scheduler tick must be shorter than one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick: Duration::from_millis(self.scheduler.tick_millis),
            utc: self.scheduler.utc,
        }
    }

    #[must_use]
    pub fn macro_engine(&self) -> MacroEngine {
        MacroEngine::new()
            .with_waittemp_timeout(self.macros.waittemp_timeout_secs.map(Duration::from_secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:reefhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "reefhubd=info,reefhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_millis: 500,
            utc: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
