//! Configuration management.

use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Transactional-email provider configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// File store configuration
    #[serde(default)]
    pub files: FilesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
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

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend ("memory" is the only built-in; hosted backends plug in
    /// behind the `DocumentStore` port)
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Namespace prefix for collections (multi-environment separation)
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            namespace: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Provider endpoint URL; when unset, notifications are logged instead of sent
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Provider API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address on outgoing notifications
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Request timeout in seconds
    #[serde(default = "default_email_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            from_address: default_from_address(),
            timeout_secs: default_email_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Public base URL for uploaded files
    #[serde(default = "default_files_base_url")]
    pub public_base_url: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_files_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON logs (pretty format when false)
    #[serde(default = "default_json_logging")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_store_backend() -> String {
    "memory".to_string()
}
fn default_from_address() -> String {
    "no-reply@meridian.example".to_string()
}
fn default_email_timeout_secs() -> u64 {
    10
}
fn default_files_base_url() -> String {
    "http://localhost:8080/files".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_json_logging() -> bool {
    true
}

impl Config {
    /// Load configuration from the optional `config/default.toml`, layered
    /// under `MERIDIAN_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, layered under environment variables.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, "memory");
        assert!(config.email.endpoint.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_without_config_file_uses_defaults() {
        // config/default.toml is optional; load() must not fail without it.
        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, "memory");
    }
}
