//! Mock implementations of the auth seams
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bookdesk_domain::Credential;
use parking_lot::Mutex;

use crate::auth::{CredentialVault, RefreshDenied, RefreshTransport, VaultError};

/// In-memory credential vault
///
/// Writes can be made to fail with [`MemoryVault::fail_writes`] to exercise
/// the store's behaviour when persistence is unavailable.
///
/// # Examples
///
/// ```
/// use bookdesk_common::testing::MemoryVault;
/// use bookdesk_common::CredentialVault;
///
/// let vault = MemoryVault::with_entry("access_token", "A");
/// assert_eq!(vault.load("access_token").unwrap().as_deref(), Some("A"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryVault {
    /// Create an empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vault holding one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let vault = Self::new();
        vault.entries.lock().insert(key.to_string(), value.to_string());
        vault
    }

    /// Inspect a stored value without going through the trait
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Make subsequent `save`/`remove` calls fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), VaultError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(VaultError::AccessFailed("memory vault is read-only".into()));
        }
        Ok(())
    }
}

impl CredentialVault for MemoryVault {
    fn load(&self, key: &str) -> Result<Option<String>, VaultError> {
        Ok(self.value(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), VaultError> {
        self.check_writable()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), VaultError> {
        self.check_writable()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Scripted refresh transport
///
/// Responses are consumed in order. Once the script runs out the fallback
/// response is returned: the credential given to
/// [`MockRefreshTransport::succeeding_with`], or a 401 rejection.
///
/// # Examples
///
/// ```
/// use bookdesk_common::testing::MockRefreshTransport;
///
/// let transport = MockRefreshTransport::succeeding_with("B");
/// assert_eq!(transport.calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockRefreshTransport {
    script: Mutex<VecDeque<Result<Credential, RefreshDenied>>>,
    fallback: Option<Credential>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockRefreshTransport {
    /// Transport that rejects every exchange unless responses are pushed
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that always issues `token`
    pub fn succeeding_with(token: &str) -> Self {
        Self { fallback: Some(Credential::new(token)), ..Self::default() }
    }

    /// Delay every exchange by `delay`
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response for the next exchange
    pub fn push_response(&self, response: Result<Credential, RefreshDenied>) {
        self.script.lock().push_back(response);
    }

    /// Number of exchanges performed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshTransport for MockRefreshTransport {
    async fn exchange(&self) -> Result<Credential, RefreshDenied> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(response) = self.script.lock().pop_front() {
            return response;
        }

        match &self.fallback {
            Some(credential) => Ok(credential.clone()),
            None => Err(RefreshDenied::Rejected {
                status: 401,
                detail: "no refresh proof".into(),
            }),
        }
    }
}
