//! Domain types for the session layer

pub mod credential;
pub mod identity;
pub mod session;

pub use credential::Credential;
pub use identity::{Identity, IdentityError};
pub use session::{EndReason, SessionEvent, SessionState};
