//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `BOOKDESK_API_BASE_URL` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `BOOKDESK_API_BASE_URL`: API base URL (required for env loading)
//! - `BOOKDESK_REQUEST_TIMEOUT_MS`: Per-request timeout in milliseconds
//! - `BOOKDESK_MAX_ATTEMPTS`: Transport attempts for idempotent requests
//! - `BOOKDESK_USER_AGENT`: User agent header
//! - `BOOKDESK_LOGIN_PATH` / `BOOKDESK_REFRESH_PATH` / `BOOKDESK_LOGOUT_PATH`:
//!   Session endpoint paths
//! - `BOOKDESK_EXPIRED_STATUS`: Status signalling an expired credential
//! - `BOOKDESK_REFRESH_TIMEOUT_MS`: Refresh episode bound in milliseconds
//! - `BOOKDESK_STORAGE_BACKEND`: `file`, `keychain` or `memory`
//! - `BOOKDESK_STORAGE_KEY`: Key the credential is persisted under
//! - `BOOKDESK_STORAGE_PATH`: File used by the `file` backend
//! - `BOOKDESK_KEYCHAIN_SERVICE`: Service used by the `keychain` backend
//! - `BOOKDESK_LOG_LEVEL`: `EnvFilter` directive
//! - `BOOKDESK_LOG_FORMAT`: `text` or `json`
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./bookdesk.json` or `./bookdesk.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bookdesk_domain::{BookdeskError, Config, Result};

use crate::errors::InfraError;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `BookdeskError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value has the wrong type
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `BOOKDESK_API_BASE_URL` must be present; every other variable is
/// optional.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `BookdeskError::Config` if the base URL is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("BOOKDESK_API_BASE_URL")?;
    set_parsed(&mut config.api.request_timeout_ms, "BOOKDESK_REQUEST_TIMEOUT_MS")?;
    set_parsed(&mut config.api.max_attempts, "BOOKDESK_MAX_ATTEMPTS")?;
    if let Some(agent) = env_opt("BOOKDESK_USER_AGENT") {
        config.api.user_agent = Some(agent);
    }

    set_parsed(&mut config.session.login_path, "BOOKDESK_LOGIN_PATH")?;
    set_parsed(&mut config.session.refresh_path, "BOOKDESK_REFRESH_PATH")?;
    set_parsed(&mut config.session.logout_path, "BOOKDESK_LOGOUT_PATH")?;
    set_parsed(&mut config.session.expired_status, "BOOKDESK_EXPIRED_STATUS")?;
    set_parsed(&mut config.session.refresh_timeout_ms, "BOOKDESK_REFRESH_TIMEOUT_MS")?;

    set_parsed(&mut config.storage.backend, "BOOKDESK_STORAGE_BACKEND")?;
    set_parsed(&mut config.storage.key, "BOOKDESK_STORAGE_KEY")?;
    set_parsed(&mut config.storage.path, "BOOKDESK_STORAGE_PATH")?;
    set_parsed(&mut config.storage.service, "BOOKDESK_KEYCHAIN_SERVICE")?;

    set_parsed(&mut config.logging.level, "BOOKDESK_LOG_LEVEL")?;
    set_parsed(&mut config.logging.format, "BOOKDESK_LOG_FORMAT")?;

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `BookdeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BookdeskError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BookdeskError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BookdeskError::from(InfraError::from(e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `BookdeskError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BookdeskError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BookdeskError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(BookdeskError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./bookdesk.{json,toml}`,
///    `./config.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("bookdesk.json"),
        dir.join("bookdesk.toml"),
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `BookdeskError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        BookdeskError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Non-empty value of an optional environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Overwrite `target` if `key` is set
///
/// # Errors
/// Returns `BookdeskError::Config` if the value does not parse as `T`.
fn set_parsed<T>(target: &mut T, key: &str) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = env_opt(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| BookdeskError::Config(format!("Invalid value for {}: {}", key, e)))?;
    }
    Ok(())
}
