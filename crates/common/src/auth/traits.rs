//! Traits at the session core's I/O seams
//!
//! These traits enable dependency injection and testing by abstracting the
//! two things the core cannot do itself: talk to the refresh endpoint and
//! persist the credential across restarts.

use async_trait::async_trait;
use bookdesk_domain::Credential;

use super::error::{RefreshDenied, VaultError};

/// Transport that exchanges the long-lived session proof for a credential
///
/// Implementations carry the proof implicitly (e.g. in a cookie jar that
/// only this transport uses) and must never send the expired bearer
/// credential. They must not touch the credential store; the
/// [`RefreshChannel`](super::RefreshChannel) owns that write.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Call the refresh endpoint once
    ///
    /// # Errors
    /// Returns [`RefreshDenied`] on network failure, explicit rejection, or
    /// a response without a usable credential.
    async fn exchange(&self) -> Result<Credential, RefreshDenied>;
}

/// Durable storage for the credential
///
/// Synchronous: the store reads it once at start-up and writes
/// it on login, refresh and termination, never on the request path.
pub trait CredentialVault: Send + Sync {
    /// Read the value stored under `key`, `Ok(None)` if absent
    ///
    /// # Errors
    /// Returns [`VaultError`] if the backing storage cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, VaultError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns [`VaultError`] if the backing storage cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), VaultError>;

    /// Remove `key` (idempotent)
    ///
    /// # Errors
    /// Returns [`VaultError`] if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), VaultError>;
}
