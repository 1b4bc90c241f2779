//! Session terminator
//!
//! Ends the session when a refresh episode fails or the user logs out:
//! clears the credential store (memory and vault) and tells the
//! presentation layer, once.

use std::sync::Arc;

use bookdesk_domain::{EndReason, SessionEvent};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::events::SessionEvents;
use super::store::CredentialStore;

/// Idempotent session teardown
///
/// "Already terminated" means the store has not been written since the last
/// termination. Any later login or successful refresh re-arms it.
pub struct SessionTerminator {
    store: Arc<CredentialStore>,
    events: SessionEvents,
    ended_at_revision: Mutex<Option<u64>>,
}

impl SessionTerminator {
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, events: SessionEvents) -> Self {
        Self { store, events, ended_at_revision: Mutex::new(None) }
    }

    /// End the session
    ///
    /// Clears the store and vault, then publishes
    /// [`SessionEvent::Ended`]. No-op if the session is already terminated.
    ///
    /// # Returns
    /// `true` if this call performed the termination
    pub fn terminate(&self, reason: EndReason, detail: impl Into<String>) -> bool {
        let mut ended_at = self.ended_at_revision.lock();
        if *ended_at == Some(self.store.revision()) {
            debug!(%reason, "Session already terminated");
            return false;
        }

        *ended_at = Some(self.store.clear());
        drop(ended_at);

        let detail = detail.into();
        info!(%reason, %detail, "Session terminated");
        self.events.publish(SessionEvent::Ended { reason, detail });
        true
    }

    /// `true` if nothing has been stored since the last termination.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        *self.ended_at_revision.lock() == Some(self.store.revision())
    }
}
