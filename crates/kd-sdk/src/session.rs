//! Session termination
//!
//! Ending a session clears every stored credential and broadcasts a
//! [`SessionEvent::Terminated`] so the surrounding shell can drop its
//! in-memory state and return to the login route.
//!
//! A stored session is announced as terminated once. Requests that fail
//! after the store was already cleared (replays rejected together, late
//! 401s from before the failure) clear it again but stay silent until a
//! new login fills the store.

use crate::credentials::CredentialStore;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 16;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Explicit logout
    UserLogout,
    /// The refresh endpoint itself answered 401
    RefreshRejected,
    /// A request still got 401 after being replayed with a fresh token
    RetryRejected,
    /// The refresh could not complete (no refresh token, network, bad response)
    RefreshFailed,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TerminationReason::UserLogout => "user logout",
            TerminationReason::RefreshRejected => "refresh token rejected",
            TerminationReason::RetryRejected => "refreshed token rejected",
            TerminationReason::RefreshFailed => "token refresh failed",
        };
        f.write_str(text)
    }
}

/// Lifecycle notifications for the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Terminated {
        reason: TerminationReason,
        redirect_to: String,
    },
}

/// Owns session termination for one client
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
    login_route: String,
    // Serializes the "was anything stored" check with the clear
    ending: Arc<Mutex<()>>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>, login_route: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            events,
            login_route: login_route.into(),
            ending: Arc::new(Mutex::new(())),
        }
    }

    /// Receive termination events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Clear all credentials and announce the termination.
    ///
    /// An explicit logout is always announced, even with nothing stored.
    /// Any other reason is announced only if it ended a stored session.
    /// Returns whether the termination was announced.
    pub fn terminate(&self, reason: TerminationReason) -> bool {
        let _ending = self.ending.lock();

        let had_session = !self.store.credentials().is_empty();
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear credentials during logout");
        }

        if !had_session && reason != TerminationReason::UserLogout {
            debug!(%reason, "Session already ended");
            return false;
        }

        match reason {
            TerminationReason::UserLogout => info!(%reason, "Session ended"),
            _ => warn!(%reason, "Session terminated"),
        }

        // No subscribers is fine: nothing is listening for the redirect
        let _ = self.events.send(SessionEvent::Terminated {
            reason,
            redirect_to: self.login_route.clone(),
        });
        true
    }
}
