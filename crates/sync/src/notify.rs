//! Broadcast of wishlist changes to observers.
//!
//! Every store mutation that completes an operation publishes a
//! [`WishlistUpdate`] carrying a snapshot of the wishlist. Observers hold a
//! [`Subscription`] for as long as their owning scope lives; dropping it
//! unsubscribes, so a torn-down observer is never notified.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use wishlist_core::Wishlist;

/// Default number of updates buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// What caused an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSource {
    /// Gateway-driven change: refresh, enrichment, create, add.
    Auto,
    /// Explicit reset on logout.
    Reset,
}

/// A "wishlist changed" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WishlistUpdate {
    /// Snapshot of the wishlist after the change.
    pub wishlist: Wishlist,
    /// Cause of the change.
    pub source: UpdateSource,
}

/// Single broadcast channel of wishlist updates.
#[derive(Debug, Clone)]
pub struct UpdateNotifier {
    sender: broadcast::Sender<WishlistUpdate>,
}

impl UpdateNotifier {
    /// Create a notifier buffering `capacity` updates per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an update. Having no subscribers is not an error.
    pub fn publish(&self, wishlist: Wishlist, source: UpdateSource) {
        let update = WishlistUpdate { wishlist, source };
        match self.sender.send(update) {
            Ok(receivers) => debug!(receivers, ?source, "Published wishlist update"),
            Err(_) => debug!(?source, "No wishlist observers"),
        }
    }

    /// Subscribe to future updates.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for UpdateNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A scoped subscription. Dropping it releases the observer.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<WishlistUpdate>,
}

impl Subscription {
    /// Wait for the next update.
    ///
    /// Updates missed because the subscriber fell behind are skipped; only
    /// the newest snapshots matter to an observer. Returns `None` once the
    /// notifier has been dropped.
    pub async fn recv(&mut self) -> Option<WishlistUpdate> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => return Some(update),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Wishlist observer lagged, skipping updates");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take an already-published update without waiting.
    pub fn try_recv(&mut self) -> Option<WishlistUpdate> {
        loop {
            match self.receiver.try_recv() {
                Ok(update) => return Some(update),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Wishlist observer lagged, skipping updates");
                }
                Err(_) => return None,
            }
        }
    }
}
