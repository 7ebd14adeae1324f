//! Client configuration management

use crate::error::{ErrorContext, MentorlinkError, MentorlinkResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "MENTORLINK_API_URL";

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Remote service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the remote service, e.g. `http://localhost:5000/api`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_seconds: 30,
            user_agent: format!("mentorlink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Local persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    /// Directory holding the device-local key/value store.
    /// Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mentorlink")
            .join("config.toml")
    }

    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> MentorlinkResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MentorlinkError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ClientConfig = toml::from_str(&content).map_err(|e| MentorlinkError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Load from `path` (or the default path) if it exists, otherwise use defaults.
    /// Environment overrides are applied and the result is validated.
    pub fn load_or_default(path: Option<&Path>) -> MentorlinkResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            tracing::debug!(path = %path.display(), "Loading configuration");
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> MentorlinkResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| MentorlinkError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| MentorlinkError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
    }

    /// Directory for the device-local key/value store
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mentorlink")
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> MentorlinkResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::config_error!(
                "api.base_url must not be empty",
                "config",
                "Set api.base_url to the service address"
            ));
        }

        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(MentorlinkError::Config {
                message: format!("api.base_url is not a valid URL: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_metadata("base_url", &self.api.base_url),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(crate::config_error!(
                "api.timeout_seconds must be greater than 0",
                "config",
                "Set api.timeout_seconds to a positive value"
            ));
        }

        Ok(())
    }
}
