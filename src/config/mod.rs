//! Configuration management for floorwatch
//!
//! This module handles loading, parsing, and validating application
//! configuration from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Sync pipeline configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Ordered list of collection slugs to track
    #[serde(default)]
    pub collections: Vec<String>,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // First, expand environment variables in the YAML string
        let expanded = expand_env_vars(yaml);
        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables with prefix FLOORWATCH_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Server config from env
        if let Ok(host) = std::env::var("FLOORWATCH_SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("FLOORWATCH_SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid port number".to_string()))?;
        }

        // API config from env
        if let Ok(key) = std::env::var("FLOORWATCH_API_KEY") {
            config.api.api_key = Some(key);
        }
        if let Ok(base_url) = std::env::var("FLOORWATCH_API_BASE_URL") {
            config.api.base_url = base_url;
        }

        // Sync config from env
        if let Ok(rps) = std::env::var("FLOORWATCH_REQUESTS_PER_SECOND") {
            config.sync.requests_per_second = rps
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid requests per second".to_string()))?;
        }
        if let Ok(interval) = std::env::var("FLOORWATCH_PASS_INTERVAL_SECS") {
            config.sync.pass_interval_secs = interval
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid pass interval".to_string()))?;
        }

        // Collections from env, comma-separated
        if let Ok(slugs) = std::env::var("FLOORWATCH_COLLECTIONS") {
            config.collections = slugs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        // Database config from env
        if let Ok(path) = std::env::var("FLOORWATCH_DATABASE_PATH") {
            config.database.path = path;
        }

        // Logging config from env
        if let Ok(level) = std::env::var("FLOORWATCH_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.requests_per_second < 1 {
            return Err(ConfigError::InvalidValue(
                "sync.requests_per_second must be at least 1".to_string(),
            ));
        }
        if let Some(capacity) = self.sync.burst_capacity {
            if capacity < 1 {
                return Err(ConfigError::InvalidValue(
                    "sync.burst_capacity must be at least 1".to_string(),
                ));
            }
        }
        if self.sync.pass_interval_secs < 1 {
            return Err(ConfigError::InvalidValue(
                "sync.pass_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.sync.request_timeout_secs < 1 {
            return Err(ConfigError::InvalidValue(
                "sync.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the collection API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent in the X-API-KEY header; requests are sent without the
    /// header when absent and rely on the upstream rejecting them
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.opensea.io".to_string()
}

/// Sync pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Outbound API calls permitted per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Burst ceiling for the token bucket; defaults to requests_per_second
    pub burst_capacity: Option<u32>,

    /// Seconds between sync passes
    #[serde(default = "default_pass_interval")]
    pub pass_interval_secs: u64,

    /// Timeout for a single upstream request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_capacity: None,
            pass_interval_secs: default_pass_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_pass_interval() -> u64 {
    3600 // 1 hour
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "floorwatch.db".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format ("json" or "pretty")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
