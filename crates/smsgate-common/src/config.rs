//! Configuration for smsgate

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// SMS dispatch configuration
    #[serde(default)]
    pub sms: SmsConfig,

    /// Campaign worker configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            bind_address: default_bind_address(),
        }
    }
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database backend: only "postgres" is supported
    #[serde(default = "default_db_backend")]
    pub backend: String,

    /// Database URL
    pub url: Option<String>,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_db_backend() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Port for the REST API and hardware webhook
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

fn default_api_port() -> u16 {
    8080
}

/// SMS dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Default anti-spam interval in seconds. The live value is read from
    /// the settings table; this is the fallback when no row exists.
    #[serde(default = "default_spam_interval_secs")]
    pub spam_interval_secs: i64,

    /// Fixed pause between messages of a bulk send, in milliseconds
    #[serde(default = "default_bulk_send_delay_ms")]
    pub bulk_send_delay_ms: u64,

    /// Gateway connect timeout, seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Gateway total request timeout, seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory for the day-keyed gateway traffic logs
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            spam_interval_secs: default_spam_interval_secs(),
            bulk_send_delay_ms: default_bulk_send_delay_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_spam_interval_secs() -> i64 {
    60
}

fn default_bulk_send_delay_ms() -> u64 {
    100
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    35
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

/// Campaign worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the server-side campaign worker runs
    #[serde(default = "default_worker_enabled")]
    pub enabled: bool,

    /// Interval between polls for running campaigns, seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_worker_enabled(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_worker_enabled() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    5
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter, e.g. "info,smsgate=debug"
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info,smsgate=debug".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            PathBuf::from("./config.toml"),
            PathBuf::from("/etc/smsgate/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sections() {
        let sms = SmsConfig::default();
        assert_eq!(sms.spam_interval_secs, 60);
        assert_eq!(sms.connect_timeout_secs, 10);
        assert_eq!(sms.request_timeout_secs, 35);

        let worker = WorkerConfig::default();
        assert!(worker.enabled);
        assert_eq!(worker.poll_interval_secs, 5);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/smsgate"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, "postgres");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.sms.bulk_send_delay_ms, 100);
    }
}
