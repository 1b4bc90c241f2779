//! Session lifecycle types
//!
//! ```text
//! Unauthenticated ──login──► Authenticated ──expiry──► Refreshing
//!        ▲                        ▲                        │
//!        │                        └──────refresh ok────────┤
//!        └──────────────refresh denied / logout────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Observable state of the logical session.
///
/// `Refreshing` is session-wide: it means a refresh episode is in flight,
/// not that a particular request is waiting on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Refreshing,
}

crate::impl_session_enum_conversions!(SessionState {
    Unauthenticated => "unauthenticated",
    Authenticated => "authenticated",
    Refreshing => "refreshing",
});

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The refresh channel could not produce a new credential.
    RefreshDenied,
    /// The user signed out.
    LoggedOut,
}

crate::impl_session_enum_conversions!(EndReason {
    RefreshDenied => "refresh_denied",
    LoggedOut => "logged_out",
});

/// Event published to the presentation layer.
///
/// The UI subscribes and decides how to react (e.g. navigate to the login
/// screen on [`SessionEvent::Ended`]); the session layer never navigates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A login or start-up restore put a credential in the store.
    Started { subject: Option<String> },
    /// A refresh episode stored a new credential.
    Refreshed { fingerprint: String },
    /// The credential was cleared; the user must re-authenticate.
    Ended { reason: EndReason, detail: String },
}

impl SessionEvent {
    /// `true` for [`SessionEvent::Ended`].
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }
}
