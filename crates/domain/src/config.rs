//! Configuration structures
//!
//! Loaded by `bookdesk_infra::config`; every section has serde defaults so a
//! config file only needs to name what it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_EXPIRED_STATUS, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_LOGIN_PATH,
    DEFAULT_LOGOUT_PATH, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_REFRESH_PATH,
    DEFAULT_REFRESH_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_STORAGE_FILE,
    DEFAULT_STORAGE_KEY,
};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Remote API transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is appended to (no trailing slash needed)
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Transport attempts for idempotent requests (initial try + retries)
    pub max_attempts: usize,
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            user_agent: None,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Session protocol settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub login_path: String,
    pub refresh_path: String,
    pub logout_path: String,
    /// HTTP status the API uses for "credential expired"
    pub expired_status: u16,
    /// Upper bound on a refresh episode, in milliseconds
    pub refresh_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            expired_status: DEFAULT_EXPIRED_STATUS,
            refresh_timeout_ms: DEFAULT_REFRESH_TIMEOUT_MS,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }
}

/// Where the credential survives a restart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keychain,
    Memory,
}

crate::impl_session_enum_conversions!(StorageBackend {
    File => "file",
    Keychain => "keychain",
    Memory => "memory",
});

/// Durable credential storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Well-known key the credential is stored under
    pub key: String,
    /// File path for the `file` backend
    pub path: String,
    /// Service name for the `keychain` backend
    pub service: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            key: DEFAULT_STORAGE_KEY.to_string(),
            path: DEFAULT_STORAGE_FILE.to_string(),
            service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

crate::impl_session_enum_conversions!(LogFormat {
    Text => "text",
    Json => "json",
});

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `bookdesk_infra=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), format: LogFormat::default() }
    }
}
