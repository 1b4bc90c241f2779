//! Session event broadcast
//!
//! The one observable surface the presentation layer needs: it subscribes
//! and reacts to [`SessionEvent::Ended`] by routing to re-authentication.

use bookdesk_domain::constants::SESSION_EVENT_CAPACITY;
use bookdesk_domain::SessionEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Cloneable handle to the session event channel
#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create a channel buffering up to `capacity` events per slow receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; having no subscribers is not an error.
    ///
    /// # Returns
    /// Number of subscribers the event was delivered to
    pub fn publish(&self, event: SessionEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "Session event published with no subscribers");
                0
            }
        }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(SESSION_EVENT_CAPACITY)
    }
}
