//! The single in-process wishlist.
//!
//! The store is readable at any time. Writers stamp every mutation with the
//! [`Generation`] their operation started under; [`WishlistStore::reset`]
//! starts a new generation, and any later write stamped with an older one is
//! dropped. A late result from before a logout therefore cannot repopulate the
//! wishlist after it.

use parking_lot::Mutex;
use tracing::debug;
use wishlist_core::{Item, ProductId, Wishlist};

/// Epoch of the store, bumped on every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Returned when a write belongs to a generation that has been reset away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleGeneration;

#[derive(Debug, Default)]
struct StoreInner {
    generation: u64,
    wishlist: Wishlist,
}

/// Session-scoped owner of the current [`Wishlist`].
#[derive(Debug, Default)]
pub struct WishlistStore {
    inner: Mutex<StoreInner>,
}

impl WishlistStore {
    /// An empty, unpersisted wishlist at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation; pass it to the writes of an operation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        Generation(self.inner.lock().generation)
    }

    /// A copy of the current wishlist.
    #[must_use]
    pub fn snapshot(&self) -> Wishlist {
        self.inner.lock().wishlist.clone()
    }

    /// Read the wishlist in place.
    pub fn read<R>(&self, f: impl FnOnce(&Wishlist) -> R) -> R {
        f(&self.inner.lock().wishlist)
    }

    /// The item for a product, if present.
    #[must_use]
    pub fn find_item(&self, product: &ProductId) -> Option<Item> {
        self.read(|w| w.find_item(product).cloned())
    }

    /// Apply a mutation if `generation` is still current, returning the
    /// resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StaleGeneration`] without touching the wishlist if the store
    /// was reset after `generation` was taken.
    pub fn update(
        &self,
        generation: Generation,
        f: impl FnOnce(&mut Wishlist),
    ) -> Result<Wishlist, StaleGeneration> {
        let mut inner = self.inner.lock();
        if inner.generation != generation.0 {
            debug!(
                current = inner.generation,
                stale = generation.0,
                "Dropping write from a reset generation"
            );
            return Err(StaleGeneration);
        }
        f(&mut inner.wishlist);
        Ok(inner.wishlist.clone())
    }

    /// Replace the whole wishlist.
    ///
    /// # Errors
    ///
    /// See [`WishlistStore::update`].
    pub fn replace(
        &self,
        generation: Generation,
        wishlist: Wishlist,
    ) -> Result<Wishlist, StaleGeneration> {
        self.update(generation, |w| *w = wishlist)
    }

    /// Append items in order.
    ///
    /// # Errors
    ///
    /// See [`WishlistStore::update`].
    pub fn append_items(
        &self,
        generation: Generation,
        items: Vec<Item>,
    ) -> Result<Wishlist, StaleGeneration> {
        self.update(generation, |w| w.items.extend(items))
    }

    /// Remove every item, keeping the wishlist itself.
    ///
    /// # Errors
    ///
    /// See [`WishlistStore::update`].
    pub fn clear_items(&self, generation: Generation) -> Result<Wishlist, StaleGeneration> {
        self.update(generation, |w| w.items.clear())
    }

    /// Start a new generation with an empty wishlist.
    pub fn reset(&self) -> (Generation, Wishlist) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.wishlist = Wishlist::default();
        (Generation(inner.generation), inner.wishlist.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wishlist_core::WishlistId;

    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let store = WishlistStore::new();
        let generation = store.generation();
        store
            .append_items(generation, vec![Item::new("A", None), Item::new("B", None)])
            .unwrap();
        let snapshot = store.append_items(generation, vec![Item::new("C", None)]).unwrap();
        let products: Vec<_> = snapshot.items.iter().map(|i| i.product.as_str()).collect();
        assert_eq!(products, ["A", "B", "C"]);
    }

    #[test]
    fn test_reset_invalidates_old_generation() {
        let store = WishlistStore::new();
        let before = store.generation();
        store
            .replace(
                before,
                Wishlist {
                    id: Some(WishlistId::new("wl-1")),
                    items: vec![Item::new("A", None)],
                    ..Wishlist::default()
                },
            )
            .unwrap();

        let (after, empty) = store.reset();
        assert_ne!(before, after);
        assert_eq!(empty, Wishlist::default());

        assert_eq!(
            store.append_items(before, vec![Item::new("B", None)]),
            Err(StaleGeneration)
        );
        assert!(store.snapshot().items.is_empty());
        assert!(store.append_items(after, vec![Item::new("B", None)]).is_ok());
    }

    #[test]
    fn test_find_item_and_clear() {
        let store = WishlistStore::new();
        let generation = store.generation();
        store
            .append_items(generation, vec![Item::new("shop;P1", None)])
            .unwrap();
        assert!(store.find_item(&ProductId::new("P1")).is_some());
        store.clear_items(generation).unwrap();
        assert!(store.find_item(&ProductId::new("P1")).is_none());
    }
}
