//! Configuration management for PropDesk clients

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (native targets only)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Refresh the access token when it expires within this many seconds
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: u64,
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Session file; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_refresh_skew_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            refresh_skew_secs: default_refresh_skew_secs(),
        }
    }
}

impl ApiConfig {
    /// API configuration pointing at `base_url` with default timings
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Check that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the base URL is not an absolute
    /// http(s) URL.
    pub fn validate(&self) -> crate::Result<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| crate::Error::Configuration {
            message: format!("invalid api.base_url '{}': {e}", self.base_url),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(crate::Error::Configuration {
                message: format!("api.base_url must use http or https, got '{}'", url.scheme()),
            });
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether structured JSON output was requested
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionConfig {
    /// Resolved session file path
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no path is configured and the
    /// platform has no data directory.
    pub fn resolve_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        directories::ProjectDirs::from("dev", "propdesk", "propdesk")
            .map(|dirs| dirs.data_dir().join("session.json"))
            .ok_or_else(|| crate::Error::Configuration {
                message: "no data directory available; set session.path".to_string(),
            })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// Without an explicit `path`, a `propdesk.{toml,yaml,json}` in the working
    /// directory is used when present. Environment variables use the
    /// `PROPDESK_` prefix with `__` between sections, e.g.
    /// `PROPDESK_API__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load(path: Option<&std::path::Path>) -> crate::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("propdesk").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("PROPDESK").separator("__"))
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid value.
    pub fn validate(&self) -> crate::Result<()> {
        self.api.validate()?;

        if self.api.timeout_secs == 0 {
            return Err(crate::Error::Configuration {
                message: "api.timeout_secs must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
