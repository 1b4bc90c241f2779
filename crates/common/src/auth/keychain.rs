//! Credential vault backed by the platform keychain
//!
//! Thin wrapper over the `keyring` crate: macOS Keychain, Windows Credential
//! Manager, the Linux kernel keyring. Each storage key becomes one keychain
//! entry under the configured service name. On Linux entries last until
//! reboot; use the file backend where that is not enough.

use keyring::credential::{CredentialBuilderApi, CredentialPersistence};
use keyring::Entry;
use tracing::debug;

use super::error::VaultError;
use super::traits::CredentialVault;

/// Platform keychain credential vault
pub struct KeychainVault {
    service_name: String,
}

impl KeychainVault {
    /// Create a vault for a keychain service (e.g. `"Bookdesk.session"`).
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// `true` if entries outlive the process on this platform.
    ///
    /// `false` when `keyring` fell back to its in-memory mock store.
    pub fn is_durable() -> bool {
        !matches!(
            keyring::default::default_credential_builder().persistence(),
            CredentialPersistence::EntryOnly | CredentialPersistence::ProcessOnly
        )
    }

    fn entry(&self, key: &str) -> Result<Entry, VaultError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            VaultError::AccessFailed(format!("Failed to open keychain entry {key}: {e}"))
        })
    }
}

impl CredentialVault for KeychainVault {
    fn load(&self, key: &str) -> Result<Option<String>, VaultError> {
        debug!(service = %self.service_name, key = %key, "Reading credential from keychain");

        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(VaultError::AccessFailed(format!(
                "Failed to retrieve credential for {key}: {e}"
            ))),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), VaultError> {
        debug!(service = %self.service_name, key = %key, "Storing credential in keychain");

        self.entry(key)?.set_password(value).map_err(|e| {
            VaultError::AccessFailed(format!("Failed to store credential for {key}: {e}"))
        })
    }

    fn remove(&self, key: &str) -> Result<(), VaultError> {
        debug!(service = %self.service_name, key = %key, "Deleting credential from keychain");

        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(VaultError::AccessFailed(format!(
                "Failed to delete credential for {key}: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn platform_store_is_durable() {
        assert!(KeychainVault::is_durable());
    }

    #[test]
    fn separate_vaults_share_saved_entry() {
        let service = format!("bookdesk.test.{}", std::process::id());
        let writer = KeychainVault::new(service.clone());
        if let Err(e) = writer.save("access_token", "A") {
            // Sandboxed runners often deny keychain access.
            eprintln!("skipping, platform keychain unavailable: {e}");
            return;
        }

        let reader = KeychainVault::new(service);
        let loaded = reader.load("access_token");
        writer.remove("access_token").unwrap();

        assert_eq!(loaded.unwrap().as_deref(), Some("A"));
        assert_eq!(reader.load("access_token").unwrap(), None);
    }
}
