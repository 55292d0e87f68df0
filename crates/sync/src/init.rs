//! Lazy create-or-fetch coordination.
//!
//! Exactly one initialization sequence runs at a time, no matter how many
//! callers ask for the wishlist. The first caller of an uninitialized session
//! becomes the *leader* and receives an [`InitAttempt`]; callers arriving while
//! it runs are queued and settle with the leader's outcome.
//!
//! Every attempt is numbered. [`InitCoordinator::reset`] forgets the running
//! attempt and rejects its queue, so a late settle from before a reset is
//! ignored instead of marking the new session initialized.

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use wishlist_core::WishlistId;

use crate::error::WishlistError;

type Outcome = Result<WishlistId, WishlistError>;

/// Observable initialization status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitPhase {
    /// Nothing loaded; the next caller starts a sequence.
    Uninitialized,
    /// A sequence is in flight.
    Initializing,
    /// The wishlist exists and is loaded.
    Initialized,
}

enum InitStatus {
    Uninitialized,
    Initializing {
        attempt: u64,
        waiters: Vec<oneshot::Sender<Outcome>>,
    },
    Initialized {
        wishlist_id: WishlistId,
    },
}

struct CoordinatorInner {
    status: InitStatus,
    next_attempt: u64,
}

/// How a caller joins initialization.
pub enum Entry<'a> {
    /// Already initialized.
    Ready(WishlistId),
    /// Another caller leads; await the receiver.
    Wait(Waiter),
    /// This caller must run the sequence and settle the attempt.
    Lead(InitAttempt<'a>),
}

/// A queued caller.
pub struct Waiter(oneshot::Receiver<Outcome>);

impl Waiter {
    /// Wait for the leader's outcome.
    ///
    /// # Errors
    ///
    /// The leader's error, or [`WishlistError::Superseded`] if the session was
    /// reset first.
    pub async fn outcome(self) -> Outcome {
        self.0
            .await
            .unwrap_or_else(|_| Err(abandoned()))
    }
}

fn abandoned() -> WishlistError {
    WishlistError::InitializationFailed(Box::new(WishlistError::Abandoned))
}

fn superseded() -> WishlistError {
    WishlistError::InitializationFailed(Box::new(WishlistError::Superseded))
}

/// Owner of the initialization status.
pub struct InitCoordinator {
    inner: Mutex<CoordinatorInner>,
}

impl Default for InitCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl InitCoordinator {
    /// A coordinator in the uninitialized state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CoordinatorInner {
                status: InitStatus::Uninitialized,
                next_attempt: 0,
            }),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> InitPhase {
        match self.inner.lock().status {
            InitStatus::Uninitialized => InitPhase::Uninitialized,
            InitStatus::Initializing { .. } => InitPhase::Initializing,
            InitStatus::Initialized { .. } => InitPhase::Initialized,
        }
    }

    /// Number of callers queued behind the running attempt.
    #[must_use]
    pub fn waiting(&self) -> usize {
        match &self.inner.lock().status {
            InitStatus::Initializing { waiters, .. } => waiters.len(),
            _ => 0,
        }
    }

    /// Join initialization.
    pub fn enter(&self) -> Entry<'_> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match &mut inner.status {
            InitStatus::Initialized { wishlist_id } => return Entry::Ready(wishlist_id.clone()),
            InitStatus::Initializing { waiters, attempt } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                debug!(attempt = *attempt, queued = waiters.len(), "Queued behind initialization");
                return Entry::Wait(Waiter(rx));
            }
            InitStatus::Uninitialized => {}
        }

        let attempt = inner.next_attempt;
        inner.next_attempt += 1;
        inner.status = InitStatus::Initializing {
            attempt,
            waiters: Vec::new(),
        };
        debug!(attempt, "Starting wishlist initialization");
        Entry::Lead(InitAttempt {
            coordinator: self,
            attempt,
            settled: false,
        })
    }

    /// Return to uninitialized, rejecting any queued callers.
    ///
    /// Returns the number of callers rejected.
    pub fn reset(&self) -> usize {
        let previous = std::mem::replace(&mut self.inner.lock().status, InitStatus::Uninitialized);
        match previous {
            InitStatus::Initializing { attempt, waiters } => {
                let rejected = waiters.len();
                info!(attempt, rejected, "Initialization invalidated by reset");
                for waiter in waiters {
                    let _ = waiter.send(Err(superseded()));
                }
                rejected
            }
            InitStatus::Uninitialized | InitStatus::Initialized { .. } => 0,
        }
    }

    /// Mark the session initialized with a wishlist created outside an
    /// attempt.
    ///
    /// Returns `false`, changing nothing, while an attempt is running; its
    /// outcome decides the status.
    pub fn adopt(&self, wishlist_id: &WishlistId) -> bool {
        let mut inner = self.inner.lock();
        if matches!(inner.status, InitStatus::Initializing { .. }) {
            return false;
        }
        inner.status = InitStatus::Initialized {
            wishlist_id: wishlist_id.clone(),
        };
        drop(inner);
        info!(%wishlist_id, "Adopted created wishlist");
        true
    }

    /// Finish `attempt` and release its queue. Returns what the leader
    /// should report.
    fn settle(&self, attempt: u64, outcome: Outcome) -> Outcome {
        let waiters = {
            let mut inner = self.inner.lock();
            let current = matches!(
                inner.status,
                InitStatus::Initializing { attempt: running, .. } if running == attempt
            );
            if !current {
                drop(inner);
                warn!(attempt, "Discarding result of a reset initialization");
                return Err(superseded());
            }

            let next = match &outcome {
                Ok(wishlist_id) => InitStatus::Initialized {
                    wishlist_id: wishlist_id.clone(),
                },
                Err(_) => InitStatus::Uninitialized,
            };
            match std::mem::replace(&mut inner.status, next) {
                InitStatus::Initializing { waiters, .. } => waiters,
                InitStatus::Uninitialized | InitStatus::Initialized { .. } => Vec::new(),
            }
        };

        match &outcome {
            Ok(wishlist_id) => {
                info!(attempt, %wishlist_id, released = waiters.len(), "Wishlist initialized");
            }
            Err(err) => {
                warn!(attempt, error = %err, rejected = waiters.len(), "Wishlist initialization failed");
            }
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }
}

/// The leader's handle on a running attempt.
///
/// Dropping it unsettled (the leading future was cancelled) rolls the status
/// back to uninitialized and rejects the queue.
pub struct InitAttempt<'a> {
    coordinator: &'a InitCoordinator,
    attempt: u64,
    settled: bool,
}

impl InitAttempt<'_> {
    /// Attempt number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.attempt
    }

    /// Record the sequence outcome and release every queued caller.
    ///
    /// # Errors
    ///
    /// `outcome`'s error, or [`WishlistError::Superseded`] (wrapped in
    /// `InitializationFailed`) if the coordinator was reset meanwhile.
    pub fn settle(mut self, outcome: Outcome) -> Outcome {
        self.settled = true;
        self.coordinator.settle(self.attempt, outcome)
    }
}

impl Drop for InitAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self.coordinator.settle(self.attempt, Err(abandoned()));
        }
    }
}
