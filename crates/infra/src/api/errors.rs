//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata.

use bookdesk_common::RefreshDenied;
use bookdesk_domain::BookdeskError;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403) that the gateway did not absorb
    Authentication,
    /// The session ended or the request already used its one replay
    Session,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Configuration errors - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The refresh episode this request waited on failed; the session has
    /// been terminated.
    #[error("Session ended: {0}")]
    RefreshDenied(#[from] RefreshDenied),

    /// The request expired again after being replayed with a refreshed
    /// credential.
    #[error("Credential rejected after refresh (status {status})")]
    RetryExhausted { status: u16 },

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::RefreshDenied(_) | Self::RetryExhausted { .. } => ApiErrorCategory::Session,
            Self::RateLimit(_) => ApiErrorCategory::RateLimit,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried by the caller
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    /// Get suggested retry delay in seconds
    pub fn retry_delay_secs(&self) -> u64 {
        match self.category() {
            ApiErrorCategory::RateLimit => 60, // Wait for rate limit window
            ApiErrorCategory::Server => 10,    // Moderate delay for server issues
            ApiErrorCategory::Network => 5,    // Quick retry for network
            ApiErrorCategory::Authentication
            | ApiErrorCategory::Session
            | ApiErrorCategory::Client
            | ApiErrorCategory::Config => 0, // No retry
        }
    }

    /// `true` if the user must sign in again before this call can succeed
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::RefreshDenied(_))
    }
}

impl From<BookdeskError> for ApiError {
    fn from(err: BookdeskError) -> Self {
        match err {
            BookdeskError::Network(message) => Self::Network(message),
            BookdeskError::Auth(message) => Self::Auth(message),
            BookdeskError::Config(message) => Self::Config(message),
            BookdeskError::InvalidInput(message) => Self::Client(message),
            BookdeskError::Storage(message) | BookdeskError::Internal(message) => {
                Self::Server(message)
            }
        }
    }
}
