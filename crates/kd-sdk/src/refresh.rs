//! Single-flight token refresh coordination
//!
//! At most one refresh runs per client. The first request to hit a 401
//! becomes the leader and performs the refresh; requests that hit a 401
//! while it is running queue up as followers and are released together,
//! in arrival order, when the leader settles.
//!
//! The queue only exists inside [`RefreshState::Refreshing`], so it cannot
//! be non-empty while idle.

use crate::error::RefreshError;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// What a settled refresh hands to each waiter: the new access token, or
/// the reason it failed
pub type RefreshOutcome = Result<String, RefreshError>;

#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Per-client refresh state machine
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Result of [`RefreshCoordinator::acquire`]
#[derive(Debug)]
pub enum Ticket<'a> {
    /// No refresh was running; the holder must perform it and settle
    Leader(RefreshLease<'a>),
    /// A refresh is running; await its outcome
    Follower(Waiter),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the refresh leader, or join the queue of the running refresh
    pub fn acquire(&self) -> Ticket<'_> {
        let mut state = self.state.lock();
        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            debug!(position = waiters.len(), "Queued behind running refresh");
            return Ticket::Follower(Waiter { rx });
        }

        *state = RefreshState::Refreshing { waiters: Vec::new() };
        debug!("Refresh started");
        Ticket::Leader(RefreshLease {
            coordinator: self,
            settled: false,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Number of requests queued behind the running refresh
    pub fn pending(&self) -> usize {
        match &*self.state.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Release every waiter with `outcome`, then return to idle. Both happen
    /// under one lock, so no new refresh can start before the queue drains.
    fn settle(&self, outcome: RefreshOutcome) -> usize {
        let mut state = self.state.lock();
        let released = match std::mem::take(&mut *state) {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => {
                let count = waiters.len();
                for waiter in waiters {
                    // A waiter whose request was dropped is simply skipped
                    let _ = waiter.send(outcome.clone());
                }
                count
            }
        };
        debug!(released, success = outcome.is_ok(), "Refresh settled");
        released
    }
}

/// Leadership of the running refresh.
///
/// Dropping it without calling [`RefreshLease::settle`] releases the queue
/// with [`RefreshError::Abandoned`] and returns the coordinator to idle.
#[derive(Debug)]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Publish the refresh outcome to every queued request. Returns how many
    /// were released.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.settle(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(Err(RefreshError::Abandoned));
        }
    }
}

/// A queued follower
#[derive(Debug)]
pub struct Waiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl Waiter {
    pub async fn wait(self) -> RefreshOutcome {
        self.rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(ticket: Ticket<'_>) -> RefreshLease<'_> {
        match ticket {
            Ticket::Leader(lease) => lease,
            Ticket::Follower(_) => panic!("expected leader"),
        }
    }

    fn follower(ticket: Ticket<'_>) -> Waiter {
        match ticket {
            Ticket::Follower(waiter) => waiter,
            Ticket::Leader(_) => panic!("expected follower"),
        }
    }

    #[tokio::test]
    async fn test_first_caller_leads_rest_follow() {
        let coordinator = RefreshCoordinator::new();
        assert!(!coordinator.is_refreshing());

        let lease = leader(coordinator.acquire());
        let a = follower(coordinator.acquire());
        let b = follower(coordinator.acquire());
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 2);

        assert_eq!(lease.settle(Ok("T2".to_string())), 2);
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 0);

        assert_eq!(a.wait().await, Ok("T2".to_string()));
        assert_eq!(b.wait().await, Ok("T2".to_string()));
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(coordinator.acquire());
        let waiters: Vec<Waiter> = (0..3).map(|_| follower(coordinator.acquire())).collect();

        let err = RefreshError::Rejected { status: 401, message: "expired".into() };
        lease.settle(Err(err.clone()));

        for waiter in waiters {
            assert_eq!(waiter.wait().await, Err(err.clone()));
        }
    }

    #[tokio::test]
    async fn test_dropped_lease_abandons_queue_and_resets() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(coordinator.acquire());
        let waiter = follower(coordinator.acquire());

        drop(lease);

        assert!(!coordinator.is_refreshing());
        assert_eq!(waiter.wait().await, Err(RefreshError::Abandoned));
    }

    #[tokio::test]
    async fn test_new_refresh_can_start_after_settle() {
        let coordinator = RefreshCoordinator::new();
        leader(coordinator.acquire()).settle(Ok("T2".into()));

        let second = leader(coordinator.acquire());
        assert!(coordinator.is_refreshing());
        second.settle(Ok("T3".into()));
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_block_settle() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(coordinator.acquire());
        drop(follower(coordinator.acquire()));
        let kept = follower(coordinator.acquire());

        assert_eq!(lease.settle(Ok("T2".into())), 2);
        assert_eq!(kept.wait().await, Ok("T2".to_string()));
    }
}
