//! Authenticated session core
//!
//! Everything an outbound API call needs to stay authenticated: the current
//! bearer credential, the single-flight refresh coordination that replaces it
//! when the server reports expiry, and the terminator that ends the session
//! when a refresh is denied.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ RefreshCoordinator │  One Refresh Episode at a time, shared by all waiters
//! └─────────┬──────────┘
//!           │
//!           ├──► RefreshChannel      (exchange proof → credential, write store)
//!           │         │
//!           │         ├──► RefreshTransport  (HTTP side, implemented in infra)
//!           │         └──► CredentialStore   (in-memory value + vault)
//!           │                   │
//!           │                   └──► CredentialVault (file / keychain / memory)
//!           │
//!           └──► SessionTerminator   (clear store + vault, emit "session ended")
//!                     │
//!                     └──► SessionEvents (broadcast to the presentation layer)
//! ```
//!
//! # Invariants
//!
//! - The refresh transport is invoked at most once for every set of
//!   requests that observe expiry before the active episode resolves.
//! - A refresh writes the store before any waiter resumes.
//! - A failed episode terminates the session exactly once.

mod episode;
mod error;
mod events;
#[cfg(feature = "platform")]
mod keychain;
mod refresh;
mod store;
mod terminator;
pub mod traits;
mod vault;

pub use episode::RefreshCoordinator;
pub use error::{RefreshDenied, VaultError};
pub use events::SessionEvents;
#[cfg(feature = "platform")]
pub use keychain::KeychainVault;
pub use refresh::RefreshChannel;
pub use store::CredentialStore;
pub use terminator::SessionTerminator;
pub use traits::{CredentialVault, RefreshTransport};
pub use vault::{EphemeralVault, FileVault};
