use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::api::client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_VIEWER_URL};
use crate::error::{GatewayError, Result};

const CONFIG_DIR_NAME: &str = ".dart-gateway";
const CONFIG_FILE_NAME: &str = "config.yaml";
const ENV_PREFIX: &str = "DART_GATEWAY";
const MASK: &str = "********";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dart: DartConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DartConfig {
    /// OpenDART API key; upstream calls fail while it is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub viewer_url: String,
    /// Request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
    /// Concurrent profile requests per company lookup
    pub max_concurrent: usize,
    /// Corporate code registry lifetime in seconds
    pub registry_ttl: u64,
}

impl Default for DartConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            api_key: None,
            base_url: client.base_url,
            viewer_url: client.viewer_url,
            timeout: client.timeout,
            user_agent: client.user_agent,
            max_concurrent: client.max_concurrent,
            registry_ttl: client.registry_ttl,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Shared secret callers send as `auth_key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

fn config_error(e: config::ConfigError) -> GatewayError {
    GatewayError::Config(e.to_string())
}

impl Config {
    /// Get the configuration directory path
    pub fn config_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| GatewayError::Config("Could not determine home directory".to_string()))?;

        Ok(home_dir.join(CONFIG_DIR_NAME))
    }

    /// Get the default configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_path()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration.
    ///
    /// Sources, lowest precedence first: defaults, the YAML file (`path`, or
    /// the default location when it exists), `DART_GATEWAY__*` variables,
    /// then `DART_API_KEY` and `PORT`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("server.host", defaults.server.host)
            .and_then(|b| b.set_default("server.port", i64::from(defaults.server.port)))
            .and_then(|b| b.set_default("dart.base_url", DEFAULT_BASE_URL))
            .and_then(|b| b.set_default("dart.viewer_url", DEFAULT_VIEWER_URL))
            .and_then(|b| b.set_default("dart.timeout", defaults.dart.timeout as i64))
            .and_then(|b| b.set_default("dart.user_agent", defaults.dart.user_agent))
            .and_then(|b| b.set_default("dart.max_concurrent", defaults.dart.max_concurrent as i64))
            .and_then(|b| b.set_default("dart.registry_ttl", defaults.dart.registry_ttl as i64))
            .map_err(config_error)?;

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Ok(default_file) = Self::config_file_path() {
                    builder = builder.add_source(config::File::from(default_file).required(false));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        if let Ok(api_key) = env::var("DART_API_KEY") {
            builder = builder
                .set_override("dart.api_key", api_key)
                .map_err(config_error)?;
        }
        if let Ok(port) = env::var("PORT") {
            builder = builder
                .set_override("server.port", port)
                .map_err(config_error)?;
        }

        builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(config_error)
    }

    /// Check settings the server cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.auth_key().is_none() {
            return Err(GatewayError::Config(format!(
                "auth.key is not set. Set {}__AUTH__KEY or add auth.key to {}",
                ENV_PREFIX, CONFIG_FILE_NAME
            )));
        }
        if self.dart.timeout == 0 {
            return Err(GatewayError::Config("dart.timeout must be positive".to_string()));
        }
        if self.dart.max_concurrent == 0 {
            return Err(GatewayError::Config("dart.max_concurrent must be positive".to_string()));
        }
        Ok(())
    }

    /// Non-blank shared secret
    pub fn auth_key(&self) -> Option<&str> {
        self.auth.key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Upstream client settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_key: self.dart.api_key.clone().unwrap_or_default(),
            base_url: self.dart.base_url.clone(),
            viewer_url: self.dart.viewer_url.clone(),
            timeout: self.dart.timeout,
            user_agent: self.dart.user_agent.clone(),
            max_concurrent: self.dart.max_concurrent,
            registry_ttl: self.dart.registry_ttl,
        }
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.dart.api_key.is_some() {
            copy.dart.api_key = Some(MASK.to_string());
        }
        if copy.auth.key.is_some() {
            copy.auth.key = Some(MASK.to_string());
        }
        copy
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config: {}", e)))
    }
}
