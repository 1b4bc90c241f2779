//! Session plumbing shared across Bookdesk crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - (always on) `auth`: credential store, refresh coordination, session
//!   termination, file-backed credential vault
//! - `platform`: platform keychain credential vault
//! - `test-utils`: in-memory vault and scripted refresh transport

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{
    CredentialStore, CredentialVault, EphemeralVault, FileVault, RefreshChannel, RefreshCoordinator,
    RefreshDenied, RefreshTransport, SessionEvents, SessionTerminator, VaultError,
};
#[cfg(feature = "platform")]
pub use auth::KeychainVault;
