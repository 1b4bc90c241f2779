//! Session constants
//!
//! Defaults shared by the configuration structures and the session layer.

// Remote API endpoints (relative to the API base URL)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";

/// Status the API uses to signal an expired access credential.
pub const DEFAULT_EXPIRED_STATUS: u16 = 401;

// Timeouts
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

// Durable storage
pub const DEFAULT_STORAGE_KEY: &str = "access_token";
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Bookdesk.session";
pub const DEFAULT_STORAGE_FILE: &str = "bookdesk-session.json";

/// Capacity of the session event broadcast channel.
pub const SESSION_EVENT_CAPACITY: usize = 16;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
