//! Error types for the session core

use std::time::Duration;

use thiserror::Error;

/// The refresh channel could not produce a new credential.
///
/// Terminal for the session: it is never retried and always ends in
/// termination. `Clone` because every waiter of a refresh episode receives
/// the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshDenied {
    /// The refresh endpoint could not be reached.
    #[error("refresh request failed: {0}")]
    Network(String),

    /// The server refused the session proof.
    #[error("refresh rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// The server answered 2xx but without a usable credential.
    #[error("malformed refresh response: {0}")]
    Malformed(String),

    /// The episode did not resolve within the configured bound.
    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),

    /// The session was terminated and nothing has been stored since, so
    /// there is no session left to refresh.
    #[error("session has ended; sign in again")]
    SessionEnded,

    /// The episode task ended without producing an outcome.
    #[error("refresh episode aborted: {0}")]
    Aborted(String),
}

/// Durable credential storage failure.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vault document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("vault access failed: {0}")]
    AccessFailed(String),
}

impl From<VaultError> for bookdesk_domain::BookdeskError {
    fn from(err: VaultError) -> Self {
        Self::Storage(err.to_string())
    }
}
