//! Configuration types for image-dl

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

/// Fetch behavior configuration (timeouts, scan cadence, concurrency, retry policy)
///
/// Groups settings for how pending records are discovered and retrieved.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Interval between pending-record scans in seconds (default: 5)
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Maximum concurrent fetch tasks (default: 8)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_fetches: usize,

    /// Maximum payload size in bytes (None = uncapped)
    #[serde(default)]
    pub max_image_bytes: Option<u64>,

    /// Maximum fetch attempts before a record is considered failed
    ///
    /// `None` (the default) retries forever: a record whose source stays
    /// unreachable remains pending indefinitely and is re-attempted every
    /// scan cycle.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl FetchConfig {
    /// Per-request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Scan interval as a [`Duration`]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            scan_interval_secs: default_scan_interval_secs(),
            max_concurrent_fetches: default_max_concurrent(),
            max_image_bytes: None,
            max_attempts: None,
        }
    }
}

/// Blob storage configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory fetched images are written to (default: "./images")
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Base URL under which stored images are served to external consumers
    /// (default: "http://localhost:3000/images-data")
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// Data persistence configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Path to the SQLite database file (default: "./data/image-dl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Whether to enable CORS (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins ("*" allows any; default)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether to serve the interactive Swagger UI (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Main configuration for [`ImageFetcher`](crate::ImageFetcher)
///
/// Fields are organized into logical sub-configs:
/// - [`fetch`](FetchConfig) — timeouts, scan cadence, concurrency, retry policy
/// - [`storage`](StorageConfig) — blob directory and public base URL
/// - [`persistence`](PersistenceConfig) — database location
/// - [`api`](ApiConfig) — REST server settings
///
/// Sub-config fields are flattened for serialization, so the JSON/TOML format
/// stays flat with no nesting.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Fetch behavior settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// Blob storage settings
    #[serde(flatten)]
    pub storage: StorageConfig,

    /// Data persistence settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Validate the configuration, returning a descriptive error for the
    /// first invalid setting found
    pub fn validate(&self) -> crate::Result<()> {
        if self.fetch.scan_interval_secs == 0 {
            return Err(crate::Error::Config {
                message: "scan interval must be at least 1 second".to_string(),
                key: Some("scan_interval_secs".to_string()),
            });
        }
        if self.fetch.request_timeout_secs == 0 {
            return Err(crate::Error::Config {
                message: "request timeout must be at least 1 second".to_string(),
                key: Some("request_timeout_secs".to_string()),
            });
        }
        if self.fetch.max_concurrent_fetches == 0 {
            return Err(crate::Error::Config {
                message: "at least one concurrent fetch is required".to_string(),
                key: Some("max_concurrent_fetches".to_string()),
            });
        }
        if url::Url::parse(&self.storage.public_base_url).is_err() {
            return Err(crate::Error::Config {
                message: format!(
                    "public base URL '{}' is not a valid URL",
                    self.storage.public_base_url
                ),
                key: Some("public_base_url".to_string()),
            });
        }
        Ok(())
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_scan_interval_secs() -> u64 {
    5
}

fn default_max_concurrent() -> usize {
    8
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("./images")
}

fn default_public_base_url() -> String {
    "http://localhost:3000/images-data".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/image-dl.db")
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:3000".parse().unwrap_or_else(|_| {
        // Infallible for a literal, but avoid a panic path in library code
        SocketAddr::from(([127, 0, 0, 1], 3000))
    })
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch.scan_interval_secs, 5);
        assert_eq!(config.fetch.request_timeout_secs, 30);
        assert_eq!(config.fetch.max_concurrent_fetches, 8);
        assert_eq!(config.fetch.max_attempts, None);
    }

    #[test]
    fn zero_scan_interval_is_rejected() {
        let mut config = Config::default();
        config.fetch.scan_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scan interval"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = Config::default();
        config.fetch.max_concurrent_fetches = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let mut config = Config::default();
        config.storage.public_base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("public base URL"));
    }

    #[test]
    fn config_deserializes_from_flat_json() {
        let json = r#"{
            "request_timeout_secs": 10,
            "scan_interval_secs": 2,
            "image_dir": "/tmp/imgs",
            "persistence": { "database_path": "/tmp/test.db" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.fetch.request_timeout_secs, 10);
        assert_eq!(config.fetch.scan_interval_secs, 2);
        assert_eq!(config.storage.image_dir, PathBuf::from("/tmp/imgs"));
        assert_eq!(
            config.persistence.database_path,
            PathBuf::from("/tmp/test.db")
        );
        // Untouched fields keep their defaults
        assert_eq!(config.fetch.max_concurrent_fetches, 8);
    }

    #[test]
    fn empty_json_uses_all_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api.bind_address.port(), 3000);
        assert!(config.api.cors_enabled);
        assert!(!config.api.swagger_ui);
    }
}
