//! Session client
//!
//! Wires the credential store, refresh coordination, terminator and
//! transports into one handle per signed-in user, and exposes the session
//! lifecycle (bootstrap, login, logout) on top of the request gateway.

use std::path::PathBuf;
use std::sync::Arc;

use bookdesk_common::{
    CredentialStore, CredentialVault, EphemeralVault, FileVault, KeychainVault, RefreshChannel,
    RefreshCoordinator, SessionEvents, SessionTerminator,
};
use bookdesk_domain::{
    Config, EndReason, Identity, SessionEvent, SessionState, StorageBackend, StorageConfig,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::auth::SessionTransport;
use super::client::{ApiClient, ApiClientConfig};
use super::errors::ApiError;

/// Authenticated session handle
pub struct SessionClient {
    store: Arc<CredentialStore>,
    events: SessionEvents,
    terminator: Arc<SessionTerminator>,
    coordinator: Arc<RefreshCoordinator>,
    transport: Arc<SessionTransport>,
    api: ApiClient,
}

impl SessionClient {
    /// Create a session using the vault named by `config.storage`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if a transport cannot be built or the
    /// expired status is invalid.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_vault(config, vault_from_config(&config.storage))
    }

    /// Create a session persisting the credential in `vault`
    ///
    /// # Errors
    ///
    /// See [`SessionClient::new`].
    pub fn with_vault(config: &Config, vault: Arc<dyn CredentialVault>) -> Result<Self, ApiError> {
        let store = Arc::new(CredentialStore::new(vault, config.storage.key.clone()));
        let events = SessionEvents::default();
        let transport = Arc::new(SessionTransport::new(&config.api, &config.session)?);

        let channel = Arc::new(RefreshChannel::new(transport.clone(), Arc::clone(&store)));
        let terminator = Arc::new(SessionTerminator::new(Arc::clone(&store), events.clone()));
        let coordinator = Arc::new(RefreshCoordinator::new(
            channel,
            Arc::clone(&store),
            Arc::clone(&terminator),
            events.clone(),
            config.session.refresh_timeout(),
        ));

        let api = ApiClient::builder()
            .config(ApiClientConfig::from_config(&config.api, &config.session)?)
            .store(Arc::clone(&store))
            .coordinator(Arc::clone(&coordinator))
            .build()?;

        Ok(Self { store, events, terminator, coordinator, transport, api })
    }

    /// Restore a persisted credential
    ///
    /// Returns `true` if one was found. A blank persisted value is removed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Server`] if the vault cannot be read.
    pub fn initialize(&self) -> Result<bool, ApiError> {
        let restored = self.store.initialize().map_err(|e| ApiError::Server(e.to_string()))?;
        if restored {
            let subject = self.identity().map(|identity| identity.subject);
            self.events.publish(SessionEvent::Started { subject });
        }
        Ok(restored)
    }

    /// Sign in and store the issued credential
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`] if the server rejects the credentials; the
    /// store is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ApiError> {
        let credential = self.transport.login(username, password).await?;

        let identity = Identity::from_credential(&credential).unwrap_or_else(|e| {
            warn!(error = %e, "Credential is not a decodable JWT, using login name");
            Identity { subject: username.to_string(), role: None, account_id: None, expires_at: None }
        });

        self.store.set(credential);
        info!(subject = %identity.subject, "Session started");
        self.events.publish(SessionEvent::Started { subject: Some(identity.subject.clone()) });
        Ok(identity)
    }

    /// Sign out
    ///
    /// The server call is best-effort. Local state is always cleared and
    /// the session ends with [`EndReason::LoggedOut`].
    pub async fn logout(&self) {
        if let Err(e) = self.transport.logout().await {
            warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        self.terminator.terminate(EndReason::LoggedOut, "signed out");
    }

    /// Request gateway bound to this session.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        if self.coordinator.is_refreshing() {
            SessionState::Refreshing
        } else if self.store.is_present() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Display claims of the current credential, if it decodes.
    pub fn identity(&self) -> Option<Identity> {
        self.store.get().and_then(|credential| Identity::from_credential(&credential).ok())
    }
}

fn vault_from_config(storage: &StorageConfig) -> Arc<dyn CredentialVault> {
    match storage.backend {
        StorageBackend::File => Arc::new(FileVault::new(PathBuf::from(&storage.path))),
        StorageBackend::Keychain => {
            if !KeychainVault::is_durable() {
                warn!("No platform keychain on this target, credential will not survive a restart");
            }
            Arc::new(KeychainVault::new(storage.service.clone()))
        }
        StorageBackend::Memory => Arc::new(EphemeralVault),
    }
}
