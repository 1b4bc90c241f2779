//! Testing utilities and helpers
//!
//! - **[`mocks`]**: in-memory [`CredentialVault`](crate::auth::CredentialVault)
//!   and scripted [`RefreshTransport`](crate::auth::RefreshTransport)
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bookdesk_common::testing::{MemoryVault, MockRefreshTransport};
//! use bookdesk_common::{CredentialStore, RefreshChannel};
//!
//! let vault = Arc::new(MemoryVault::with_entry("access_token", "A"));
//! let store = Arc::new(CredentialStore::new(vault, "access_token"));
//! let transport = Arc::new(MockRefreshTransport::succeeding_with("B"));
//! let _channel = RefreshChannel::new(transport, store);
//! ```

pub mod mocks;

pub use mocks::{MemoryVault, MockRefreshTransport};
