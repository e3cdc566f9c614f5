//! Client configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `LOSTFOUND__*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "lostfound";

/// Environment variable prefix (`LOSTFOUND__BASE_URL`, `LOSTFOUND__LOGGING__LEVEL`, ...).
pub const ENV_PREFIX: &str = "LOSTFOUND";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; endpoint paths such as `/agent/stream` are appended to it.
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Whole-request timeout for regular calls. Streams are not subject to it.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("connect_timeout_secs", defaults.connect_timeout_secs as i64)?
            .set_default("logging.level", defaults.logging.level)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let built = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: ClientConfig = built.try_deserialize()?;
        config.base_url = config.base_url.trim().trim_end_matches('/').to_string();
        config.auth_token = config
            .auth_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        Ok(config)
    }

    /// Default config file location (`<config dir>/lostfound/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Render as a commented TOML document.
    pub fn to_toml(&self, path: &Path) -> Result<String, toml::ser::Error> {
        let body = toml::to_string_pretty(self)?;
        let mut buffer = String::new();
        buffer.push_str("# Configuration for ");
        buffer.push_str(APP_NAME);
        buffer.push('\n');
        buffer.push_str("# File: ");
        buffer.push_str(&path.display().to_string());
        buffer.push_str("\n\n");
        buffer.push_str(&body);
        Ok(buffer)
    }
}
