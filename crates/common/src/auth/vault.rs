//! Credential vaults without platform dependencies
//!
//! Stores a small JSON object (`{ "<key>": "<value>" }`) so several keys can
//! share one file. Writes go to a sibling temp file that is renamed over the
//! target, so a crash never leaves a half-written document.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::error::VaultError;
use super::traits::CredentialVault;

type Document = BTreeMap<String, String>;

/// Credential vault persisted as a JSON file
pub struct FileVault {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl FileVault {
    /// Create a vault backed by `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), io_lock: Mutex::new(()) }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, VaultError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Document::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, document: &Document) -> Result<(), VaultError> {
        if document.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialVault for FileVault {
    fn load(&self, key: &str) -> Result<Option<String>, VaultError> {
        let _guard = self.io_lock.lock();
        Ok(self.read_document()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), VaultError> {
        let _guard = self.io_lock.lock();
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value.to_string());
        self.write_document(&document)?;
        debug!(path = %self.path.display(), key = %key, "credential persisted");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), VaultError> {
        let _guard = self.io_lock.lock();
        let mut document = self.read_document()?;
        if document.remove(key).is_none() {
            return Ok(());
        }
        self.write_document(&document)?;
        debug!(path = %self.path.display(), key = %key, "credential removed");
        Ok(())
    }
}

/// Vault that persists nothing
///
/// Used for the `memory` storage backend: the credential store's in-memory
/// value is the only copy and does not survive a restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralVault;

impl CredentialVault for EphemeralVault {
    fn load(&self, _key: &str) -> Result<Option<String>, VaultError> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), VaultError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), VaultError> {
        Ok(())
    }
}
