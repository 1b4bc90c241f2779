//! Refresh episode coordination
//!
//! A Refresh Episode is one refresh attempt shared by every request that
//! observes an expired credential while it is in flight. The episode runs as
//! a spawned task whose outcome is a [`Shared`] future: the first request to
//! see expiry starts it, later ones clone the handle and await the same
//! result. A caller abandoning its request therefore never cancels a refresh
//! other callers are waiting on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bookdesk_domain::{Credential, EndReason, SessionEvent};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::RefreshDenied;
use super::events::SessionEvents;
use super::refresh::RefreshChannel;
use super::store::CredentialStore;
use super::terminator::SessionTerminator;

type EpisodeOutcome = Result<Credential, RefreshDenied>;
type SharedEpisode = Shared<BoxFuture<'static, EpisodeOutcome>>;

struct ActiveEpisode {
    id: u64,
    outcome: SharedEpisode,
}

enum Join {
    /// The credential the caller sent has already been replaced.
    Replaced(Credential),
    /// The session was terminated; only a login revives it.
    Ended,
    Episode(u64, SharedEpisode),
}

/// Single-flight refresh coordinator
pub struct RefreshCoordinator {
    channel: Arc<RefreshChannel>,
    store: Arc<CredentialStore>,
    terminator: Arc<SessionTerminator>,
    events: SessionEvents,
    timeout: Duration,
    active: Arc<Mutex<Option<ActiveEpisode>>>,
    episodes_started: AtomicU64,
}

impl RefreshCoordinator {
    /// Create a coordinator
    ///
    /// # Arguments
    /// * `channel` - Refresh channel that writes the store on success
    /// * `store` - Store the channel writes to, read to detect replacement
    /// * `terminator` - Invoked once per failed episode
    /// * `events` - Receives [`SessionEvent::Refreshed`] on success
    /// * `timeout` - Upper bound on one episode; exceeding it fails the
    ///   episode with [`RefreshDenied::Timeout`]
    #[must_use]
    pub fn new(
        channel: Arc<RefreshChannel>,
        store: Arc<CredentialStore>,
        terminator: Arc<SessionTerminator>,
        events: SessionEvents,
        timeout: Duration,
    ) -> Self {
        Self {
            channel,
            store,
            terminator,
            events,
            timeout,
            active: Arc::new(Mutex::new(None)),
            episodes_started: AtomicU64::new(0),
        }
    }

    /// Obtain a credential to replace `stale`, the one an expired request
    /// was sent with (`None` if it was sent unauthenticated)
    ///
    /// Joins the active episode if there is one. Otherwise, if the store
    /// already holds a different credential (an episode finished after the
    /// request was sent), returns it without refreshing. Otherwise starts a
    /// new episode, unless the session has been terminated and nothing has
    /// been stored since. Must be called within a Tokio runtime.
    ///
    /// # Errors
    /// Returns the episode's [`RefreshDenied`]; by then the session has
    /// been terminated. Returns [`RefreshDenied::SessionEnded`] without
    /// contacting the server if it already was.
    pub async fn await_fresh(&self, stale: Option<&Credential>) -> Result<Credential, RefreshDenied> {
        match self.join_or_start(stale) {
            Join::Replaced(credential) => Ok(credential),
            Join::Ended => {
                debug!("Session ended, refusing to refresh");
                Err(RefreshDenied::SessionEnded)
            }
            Join::Episode(id, outcome) => {
                debug!(episode = id, "Awaiting refresh episode");
                outcome.await
            }
        }
    }

    /// `true` while an episode is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Number of episodes started since construction.
    #[must_use]
    pub fn episodes_started(&self) -> u64 {
        self.episodes_started.load(Ordering::SeqCst)
    }

    /// Configured episode bound.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn join_or_start(&self, stale: Option<&Credential>) -> Join {
        let mut active = self.active.lock();

        if let Some(episode) = active.as_ref() {
            debug!(episode = episode.id, "Joining in-flight refresh episode");
            return Join::Episode(episode.id, episode.outcome.clone());
        }

        if let Some(current) = self.store.get() {
            if stale != Some(&current) {
                debug!(credential = %current, "Credential already replaced, skipping refresh");
                return Join::Replaced(current);
            }
        }

        if self.terminator.is_terminated() {
            return Join::Ended;
        }

        let id = self.episodes_started.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self.spawn_episode(id);
        *active = Some(ActiveEpisode { id, outcome: outcome.clone() });
        Join::Episode(id, outcome)
    }

    // Called with `active` locked; the task's own slot cleanup waits for
    // the caller to publish the episode before it can run.
    fn spawn_episode(&self, id: u64) -> SharedEpisode {
        let channel = Arc::clone(&self.channel);
        let terminator = Arc::clone(&self.terminator);
        let events = self.events.clone();
        let active = Arc::clone(&self.active);
        let timeout = self.timeout;

        info!(episode = id, "Refresh episode started");

        let task = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, channel.refresh()).await {
                Ok(result) => result,
                Err(_) => Err(RefreshDenied::Timeout(timeout)),
            };

            match &outcome {
                Ok(credential) => {
                    info!(episode = id, credential = %credential, "Refresh episode succeeded");
                    events.publish(SessionEvent::Refreshed { fingerprint: credential.fingerprint() });
                }
                Err(denied) => {
                    warn!(episode = id, error = %denied, "Refresh episode failed");
                    terminator.terminate(EndReason::RefreshDenied, denied.to_string());
                }
            }

            let mut slot = active.lock();
            if slot.as_ref().is_some_and(|episode| episode.id == id) {
                *slot = None;
            }
            outcome
        });

        task.map(|joined| joined.unwrap_or_else(|e| Err(RefreshDenied::Aborted(e.to_string()))))
            .boxed()
            .shared()
    }
}
