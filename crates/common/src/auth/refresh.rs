//! Refresh channel
//!
//! Exchanges the session proof for a new credential and writes it to the
//! store before handing it back, so every waiter that resumes afterwards
//! observes the same value in the store.

use std::sync::Arc;

use bookdesk_domain::Credential;
use tracing::debug;

use super::error::RefreshDenied;
use super::store::CredentialStore;
use super::traits::RefreshTransport;

/// Store-writing wrapper around a [`RefreshTransport`]
pub struct RefreshChannel {
    transport: Arc<dyn RefreshTransport>,
    store: Arc<CredentialStore>,
}

impl RefreshChannel {
    #[must_use]
    pub fn new(transport: Arc<dyn RefreshTransport>, store: Arc<CredentialStore>) -> Self {
        Self { transport, store }
    }

    /// Obtain and store a new credential
    ///
    /// Nothing is written unless the transport returns a non-blank
    /// credential.
    ///
    /// # Errors
    /// Returns [`RefreshDenied`] if the transport fails or returns a blank
    /// credential.
    pub async fn refresh(&self) -> Result<Credential, RefreshDenied> {
        let credential = self.transport.exchange().await?;
        if credential.is_blank() {
            return Err(RefreshDenied::Malformed("refresh returned an empty credential".into()));
        }

        let revision = self.store.set(credential.clone());
        debug!(credential = %credential, revision, "Refreshed credential stored");
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::traits::CredentialVault;
    use crate::testing::{MemoryVault, MockRefreshTransport};

    fn store() -> Arc<CredentialStore> {
        Arc::new(CredentialStore::new(
            Arc::new(MemoryVault::new()) as Arc<dyn CredentialVault>,
            "access_token",
        ))
    }

    #[tokio::test]
    async fn success_writes_store() {
        let store = store();
        let transport = Arc::new(MockRefreshTransport::succeeding_with("fresh"));
        let channel = RefreshChannel::new(transport.clone(), Arc::clone(&store));

        let credential = channel.refresh().await.unwrap();

        assert_eq!(credential, Credential::new("fresh"));
        assert_eq!(store.get(), Some(credential));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn failure_leaves_store_untouched() {
        let store = store();
        store.set(Credential::new("old"));
        let transport = Arc::new(MockRefreshTransport::new());
        transport.push_response(Err(RefreshDenied::Network("connection reset".into())));
        let channel = RefreshChannel::new(transport, Arc::clone(&store));

        let result = channel.refresh().await;

        assert_eq!(result, Err(RefreshDenied::Network("connection reset".into())));
        assert_eq!(store.get(), Some(Credential::new("old")));
        assert_eq!(store.revision(), 1);
    }

    #[tokio::test]
    async fn blank_credential_is_malformed() {
        let store = store();
        let channel =
            RefreshChannel::new(Arc::new(MockRefreshTransport::succeeding_with("")), store.clone());

        assert!(matches!(channel.refresh().await, Err(RefreshDenied::Malformed(_))));
        assert!(store.get().is_none());
    }
}
