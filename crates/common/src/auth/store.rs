//! Credential store
//!
//! The single owner of the current bearer credential. Reads are synchronous
//! so the request path can attach the credential without suspending; writes
//! replace the value atomically and mirror it to the durable vault. Vault
//! I/O happens after the in-memory swap, so readers never wait on disk.

use std::sync::Arc;

use bookdesk_domain::Credential;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::error::VaultError;
use super::traits::CredentialVault;

/// Process-wide holder of the current credential
///
/// Every mutation bumps a revision counter, which lets the terminator tell
/// "already terminated" apart from "terminated, then logged in again".
pub struct CredentialStore {
    state: RwLock<StoreState>,
    // Held across the memory swap and the vault write so the vault sees
    // writes in revision order.
    persist: Mutex<()>,
    vault: Arc<dyn CredentialVault>,
    key: String,
}

#[derive(Default)]
struct StoreState {
    current: Option<Credential>,
    revision: u64,
}

impl CredentialStore {
    /// Create an empty store persisting under `key` in `vault`.
    pub fn new(vault: Arc<dyn CredentialVault>, key: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            persist: Mutex::new(()),
            vault,
            key: key.into(),
        }
    }

    /// Restore the credential persisted by a previous process
    ///
    /// Should be called on start-up. A blank persisted value is discarded
    /// and removed from the vault.
    ///
    /// # Returns
    /// `true` if a credential was restored
    ///
    /// # Errors
    /// Returns error if the vault cannot be read
    pub fn initialize(&self) -> Result<bool, VaultError> {
        let Some(raw) = self.vault.load(&self.key)? else {
            debug!(key = %self.key, "No persisted credential");
            return Ok(false);
        };

        let credential = Credential::new(raw);
        if credential.is_blank() {
            warn!(key = %self.key, "Discarding blank persisted credential");
            self.vault.remove(&self.key)?;
            return Ok(false);
        }

        info!(credential = %credential, "Credential restored from vault");
        let mut state = self.state.write();
        state.current = Some(credential);
        state.revision += 1;
        Ok(true)
    }

    /// Current credential, if any.
    #[must_use]
    pub fn get(&self) -> Option<Credential> {
        self.state.read().current.clone()
    }

    /// `true` if a credential is held.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.state.read().current.is_some()
    }

    /// Replace the credential and persist it
    ///
    /// The in-memory value is authoritative: a vault failure is logged and
    /// the new credential stays in effect for this process.
    ///
    /// # Returns
    /// The store revision after the write
    pub fn set(&self, credential: Credential) -> u64 {
        let _persist = self.persist.lock();
        let revision = {
            let mut state = self.state.write();
            state.current = Some(credential.clone());
            state.revision += 1;
            state.revision
        };
        debug!(credential = %credential, "Credential stored");

        if let Err(e) = self.vault.save(&self.key, credential.as_str()) {
            warn!(error = %e, "Failed to persist credential; keeping it in memory only");
        }
        revision
    }

    /// Drop the credential from memory and the vault
    ///
    /// # Returns
    /// The store revision after the write
    pub fn clear(&self) -> u64 {
        let _persist = self.persist.lock();
        let revision = {
            let mut state = self.state.write();
            state.current = None;
            state.revision += 1;
            state.revision
        };
        debug!("Credential cleared");

        if let Err(e) = self.vault.remove(&self.key) {
            warn!(error = %e, "Failed to remove persisted credential");
        }
        revision
    }

    /// Number of mutations since construction.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Storage key the credential is persisted under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryVault;

    fn store_with(vault: &Arc<MemoryVault>) -> CredentialStore {
        CredentialStore::new(Arc::clone(vault) as Arc<dyn CredentialVault>, "access_token")
    }

    #[test]
    fn starts_empty() {
        let store = store_with(&Arc::new(MemoryVault::new()));
        assert!(store.get().is_none());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn set_persists_and_bumps_revision() {
        let vault = Arc::new(MemoryVault::new());
        let store = store_with(&vault);

        assert_eq!(store.set(Credential::new("a")), 1);
        assert_eq!(store.get(), Some(Credential::new("a")));
        assert_eq!(vault.value("access_token").as_deref(), Some("a"));
    }

    #[test]
    fn clear_removes_persisted_value() {
        let vault = Arc::new(MemoryVault::new());
        let store = store_with(&vault);
        store.set(Credential::new("a"));

        assert_eq!(store.clear(), 2);
        assert!(!store.is_present());
        assert!(vault.value("access_token").is_none());
    }

    #[test]
    fn initialize_restores_persisted_credential() {
        let vault = Arc::new(MemoryVault::with_entry("access_token", "persisted"));
        let store = store_with(&vault);

        assert!(store.initialize().unwrap());
        assert_eq!(store.get(), Some(Credential::new("persisted")));
    }

    #[test]
    fn initialize_discards_blank_value() {
        let vault = Arc::new(MemoryVault::with_entry("access_token", "   "));
        let store = store_with(&vault);

        assert!(!store.initialize().unwrap());
        assert!(store.get().is_none());
        assert!(vault.value("access_token").is_none());
    }

    /// Vault whose `save` parks until released.
    struct ParkedVault {
        entered: std::sync::mpsc::SyncSender<()>,
        release: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl CredentialVault for ParkedVault {
        fn load(&self, _key: &str) -> Result<Option<String>, VaultError> {
            Ok(None)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), VaultError> {
            self.entered.send(()).ok();
            self.release.lock().recv().ok();
            Ok(())
        }

        fn remove(&self, _key: &str) -> Result<(), VaultError> {
            Ok(())
        }
    }

    #[test]
    fn reads_do_not_wait_on_vault_io() {
        use std::sync::mpsc;
        use std::time::Duration;

        let (entered_tx, entered_rx) = mpsc::sync_channel(1);
        let (release_tx, release_rx) = mpsc::channel();
        let vault = ParkedVault { entered: entered_tx, release: Mutex::new(release_rx) };
        let store = Arc::new(CredentialStore::new(Arc::new(vault), "access_token"));

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.set(Credential::new("b")))
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let (read_tx, read_rx) = mpsc::channel();
        {
            let store = Arc::clone(&store);
            std::thread::spawn(move || read_tx.send(store.get()).ok());
        }
        let seen = read_rx.recv_timeout(Duration::from_secs(1));

        release_tx.send(()).unwrap();
        assert_eq!(writer.join().unwrap(), 1);
        assert_eq!(seen.expect("get() blocked behind the vault write"), Some(Credential::new("b")));
    }

    #[test]
    fn vault_failure_keeps_credential_in_memory() {
        let vault = Arc::new(MemoryVault::new());
        vault.fail_writes(true);
        let store = store_with(&vault);

        store.set(Credential::new("a"));
        assert_eq!(store.get(), Some(Credential::new("a")));
        assert!(vault.value("access_token").is_none());
    }
}
