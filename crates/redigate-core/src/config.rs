//! Store configuration properties
//!
//! Properties are bound once at startup from three layers, each overriding the
//! previous one: built-in defaults, an optional YAML document, and `REDIGATE_*`
//! environment variables.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default Redis host
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default Redis port
pub const DEFAULT_PORT: u16 = 6379;
/// Default connect timeout (20 seconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 20_000;
/// Default per-command response timeout (100 seconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 100_000;
/// Default number of reconnect attempts
pub const DEFAULT_RETRIES: usize = 6;
/// Default upper bound for the reconnect backoff
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 2_000;

/// Name of the optional top-level YAML section holding the properties
pub const YAML_SECTION: &str = "redigate";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "REDIGATE_";

/// Connection-level knobs handed to the Redis connection manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Timeout for establishing a connection, in milliseconds
    pub connect_timeout_ms: u64,
    /// Timeout for a single command response, in milliseconds
    pub response_timeout_ms: u64,
    /// Reconnect attempts before a command fails
    pub retries: usize,
    /// Upper bound for the delay between reconnect attempts, in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
        }
    }
}

impl ConnectionSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Properties of the key-value store integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreProperties {
    /// Master switch; when false every operation returns its safe default
    pub enabled: bool,
    /// Log every store operation at info level
    pub debugging: bool,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Logical database index
    pub database: i64,
    pub connection: ConnectionSettings,
}

impl Default for StoreProperties {
    fn default() -> Self {
        Self {
            enabled: false,
            debugging: false,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            database: 0,
            connection: ConnectionSettings::default(),
        }
    }
}

impl StoreProperties {
    /// Parse properties from a YAML document.
    ///
    /// The properties may sit under a top-level `redigate:` key or at the root.
    /// Missing fields keep their defaults; an empty document yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let document: serde_yaml::Value = serde_yaml::from_str(content)?;
        let section = match document.get(YAML_SECTION) {
            Some(section) => section.clone(),
            None => document,
        };

        if section.is_null() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_value(section)?)
    }

    /// Read and parse a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `REDIGATE_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `REDIGATE_*` overrides from an arbitrary variable source.
    ///
    /// Recognised names: `ENABLED`, `DEBUGGING`, `HOST`, `PORT`, `USERNAME`,
    /// `PASSWORD`, `DATABASE` (each prefixed with `REDIGATE_`).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(value) = var("ENABLED") {
            self.enabled = parse_flag("enabled", &value)?;
        }
        if let Some(value) = var("DEBUGGING") {
            self.debugging = parse_flag("debugging", &value)?;
        }
        if let Some(value) = var("HOST") {
            self.host = value;
        }
        if let Some(value) = var("PORT") {
            self.port = value.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "port".to_string(),
                message: format!("'{}' is not a valid port", value),
            })?;
        }
        if let Some(value) = var("USERNAME") {
            self.username = Some(value).filter(|v| !v.is_empty());
        }
        if let Some(value) = var("PASSWORD") {
            self.password = Some(value).filter(|v| !v.is_empty());
        }
        if let Some(value) = var("DATABASE") {
            self.database = value.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "database".to_string(),
                message: format!("'{}' is not a valid database index", value),
            })?;
        }

        Ok(self)
    }

    /// Reject properties no connection could be built from
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "must be greater than zero"));
        }
        if self.database < 0 {
            return Err(invalid("database", "must not be negative"));
        }
        if self.connection.connect_timeout_ms == 0 {
            return Err(invalid("connection.connect_timeout_ms", "must be greater than zero"));
        }
        if self.connection.response_timeout_ms == 0 {
            return Err(invalid("connection.response_timeout_ms", "must be greater than zero"));
        }
        Ok(())
    }

    /// Build the `redis://` URL for these properties
    pub fn connection_url(&self) -> String {
        self.render_url(|password| urlencoding::encode(password).into_owned())
    }

    /// Same as [`connection_url`](Self::connection_url) with the password replaced, for logs
    pub fn redacted_url(&self) -> String {
        self.render_url(|_| "***".to_string())
    }

    fn render_url<F>(&self, password: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let username = self.username.as_deref().filter(|u| !u.is_empty());
        let secret = self.password.as_deref().filter(|p| !p.is_empty());

        let auth = match (username, secret) {
            (Some(user), Some(pass)) => {
                format!("{}:{}@", urlencoding::encode(user), password(pass))
            }
            (None, Some(pass)) => format!(":{}@", password(pass)),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            (None, None) => String::new(),
        };

        format!(
            "redis://{}{}:{}/{}",
            auth,
            self.host.trim(),
            self.port,
            self.database
        )
    }
}

impl fmt::Display for StoreProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Redigate {{ enabled: {}, debugging: {}, endpoint: {} }}",
            self.enabled,
            self.debugging,
            self.redacted_url()
        )
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(invalid(field, &format!("'{}' is not a boolean", other))),
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
