//! The wishlist session: one user's wishlist and every operation on it.
//!
//! A [`WishlistSession`] is cheap to clone; clones share the store, the
//! initialization status and the update channel. Operations that need the
//! remote wishlist call [`WishlistSession::get_or_create_wishlist`] first, so
//! the first of them to run fetches or creates it and the rest wait.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use wishlist_core::{
    Account, Item, NewItem, NewWishlist, Price, ProductRef, Wishlist, WishlistId,
};

use crate::config::{CurrencyContext, SyncConfig};
use crate::enrich::{BatchEnricher, DEFAULT_PAGE_SIZE};
use crate::error::{GatewayError, Result, WishlistError};
use crate::gateway::{
    AccountResolver, CatalogGateway, GatewayResult, WishlistGateway, timed,
};
use crate::init::{Entry, InitCoordinator, InitPhase};
use crate::notify::{DEFAULT_CAPACITY, Subscription, UpdateNotifier, UpdateSource};
use crate::rest::{RestAccountResolver, RestCatalogGateway, RestClient, RestWishlistGateway};
use crate::store::{Generation, WishlistStore};

/// Default limit for a single gateway call.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of [`WishlistSession::add_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new item was created remotely and appended.
    Added,
    /// The product was already on the wishlist; nothing was sent.
    AlreadyPresent,
}

/// Tuning knobs for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Products per enrichment page.
    pub page_size: usize,
    /// Limit for each gateway call.
    pub gateway_timeout: Duration,
    /// Updates buffered per observer.
    pub notifier_capacity: usize,
    /// Currency prices are requested in.
    pub currency: CurrencyContext,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            notifier_capacity: DEFAULT_CAPACITY,
            currency: CurrencyContext::default(),
        }
    }
}

impl SessionOptions {
    /// Options taken from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            page_size: config.page_size,
            gateway_timeout: config.gateway_timeout,
            currency: config.currency.clone(),
            ..Self::default()
        }
    }
}

struct SessionInner {
    wishlists: Arc<dyn WishlistGateway>,
    accounts: Arc<dyn AccountResolver>,
    enricher: BatchEnricher,
    store: WishlistStore,
    init: InitCoordinator,
    notifier: UpdateNotifier,
    currency: Mutex<CurrencyContext>,
    timeout: Duration,
}

/// Client-side owner of the user's wishlist.
#[derive(Clone)]
pub struct WishlistSession {
    inner: Arc<SessionInner>,
}

impl WishlistSession {
    /// Create a session over the given collaborators.
    #[must_use]
    pub fn new(
        wishlists: Arc<dyn WishlistGateway>,
        catalog: Arc<dyn CatalogGateway>,
        accounts: Arc<dyn AccountResolver>,
        options: SessionOptions,
    ) -> Self {
        let enricher = BatchEnricher::new(catalog, options.page_size, options.gateway_timeout);
        Self {
            inner: Arc::new(SessionInner {
                wishlists,
                accounts,
                enricher,
                store: WishlistStore::new(),
                init: InitCoordinator::new(),
                notifier: UpdateNotifier::new(options.notifier_capacity),
                currency: Mutex::new(options.currency),
                timeout: options.gateway_timeout,
            }),
        }
    }

    /// Create a session talking to the REST services named in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig) -> std::result::Result<Self, GatewayError> {
        let client = RestClient::new(&config.endpoints, config.gateway_timeout)?;
        let endpoints = &config.endpoints;

        let wishlists =
            RestWishlistGateway::new(client.clone(), endpoints.wishlist_url.clone());
        let catalog = RestCatalogGateway::new(
            client.clone(),
            endpoints.product_url.clone(),
            endpoints.price_url.clone(),
        );
        let accounts = RestAccountResolver::new(client, endpoints.account_url.clone());

        Ok(Self::new(
            Arc::new(wishlists),
            Arc::new(catalog),
            Arc::new(accounts),
            SessionOptions::from_config(config),
        ))
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Resolve the id of the user's wishlist, fetching or creating it on
    /// first use.
    ///
    /// Callers arriving while another caller initializes wait for its
    /// outcome; once initialized this returns without any remote call.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::InitializationFailed`] wrapping the failing
    /// step. The session is left uninitialized so a later call retries.
    #[instrument(skip(self))]
    pub async fn get_or_create_wishlist(&self) -> Result<WishlistId> {
        // Taken before entering; a reset after this point fails our writes.
        let generation = self.inner.store.generation();

        let attempt = match self.inner.init.enter() {
            Entry::Ready(wishlist_id) => return Ok(wishlist_id),
            Entry::Wait(waiter) => return waiter.outcome().await,
            Entry::Lead(attempt) => attempt,
        };

        debug!(attempt = attempt.number(), "Leading wishlist initialization");
        let outcome = self
            .initialize(generation)
            .await
            .map_err(|err| WishlistError::InitializationFailed(Box::new(err)));
        attempt.settle(outcome)
    }

    async fn initialize(&self, generation: Generation) -> Result<WishlistId> {
        let account = self
            .call(self.inner.accounts.current_account())
            .await
            .map_err(|err| WishlistError::AccountResolutionFailed(Arc::new(err)))?;

        let wishlists = self
            .call(self.inner.wishlists.list_wishlists())
            .await
            .map_err(WishlistError::gateway)?;
        debug!(count = wishlists.len(), account = %account.id, "Listed remote wishlists");

        // The most recent wishlist owned by the account wins.
        let existing = wishlists
            .into_iter()
            .rev()
            .find(|w| w.is_persisted() && w.owner.as_ref() == Some(&account.id));

        if let Some(wishlist) = existing {
            let wishlist_id = wishlist
                .persisted_id()
                .cloned()
                .ok_or(WishlistError::NotPersisted)?;
            info!(%wishlist_id, "Using existing wishlist");
            self.inner.store.replace(
                generation,
                Wishlist {
                    items: Vec::new(),
                    ..wishlist
                },
            )?;
            self.refresh_in(generation, &wishlist_id).await?;
            return Ok(wishlist_id);
        }

        let created = self.create_in(generation, Some(&account)).await?;
        created.persisted_id().cloned().ok_or(WishlistError::NotPersisted)
    }

    /// Current initialization phase.
    #[must_use]
    pub fn status(&self) -> InitPhase {
        self.inner.init.phase()
    }

    // =========================================================================
    // Remote operations
    // =========================================================================

    /// Reload the items of `wishlist_id` and enrich them page by page.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::RefreshFailed`] if the item list cannot be
    /// fetched, or [`WishlistError::EnrichmentFailed`] if a page fails. Pages
    /// enriched before the failure stay in the store.
    #[instrument(skip(self, wishlist_id), fields(wishlist_id = %wishlist_id))]
    pub async fn refresh(&self, wishlist_id: &WishlistId) -> Result<()> {
        let generation = self.inner.store.generation();
        self.refresh_in(generation, wishlist_id).await
    }

    /// Refresh the stored wishlist, for instance after a currency change.
    ///
    /// Does nothing while the wishlist has not been persisted.
    ///
    /// # Errors
    ///
    /// See [`WishlistSession::refresh`].
    #[instrument(skip(self))]
    pub async fn refresh_current(&self) -> Result<()> {
        let Some(wishlist_id) = self.inner.store.read(|w| w.persisted_id().cloned()) else {
            debug!("No persisted wishlist to refresh");
            return Ok(());
        };
        self.refresh(&wishlist_id).await
    }

    async fn refresh_in(&self, generation: Generation, wishlist_id: &WishlistId) -> Result<()> {
        let items = self
            .call(self.inner.wishlists.list_items(wishlist_id))
            .await
            .map_err(|err| WishlistError::RefreshFailed(Arc::new(err)))?;

        let cleared = self.inner.store.clear_items(generation)?;
        if items.is_empty() {
            debug!("Wishlist has no items");
            self.publish(cleared, UpdateSource::Auto);
            return Ok(());
        }

        let currency = self.currency();
        let store = &self.inner.store;
        let summary = self
            .inner
            .enricher
            .fill_items(items, &currency.id, |page| {
                store.append_items(generation, page.items)?;
                Ok(())
            })
            .await?;

        let snapshot = store.update(generation, |w| {
            w.currency_symbol = Some(currency.symbol.clone());
        })?;
        info!(pages = summary.pages, items = summary.items, "Wishlist refreshed");
        self.publish(snapshot, UpdateSource::Auto);
        Ok(())
    }

    /// Create a new remote wishlist for the current account and make it the
    /// stored one.
    ///
    /// The wishlist is created even when the account cannot be resolved; it
    /// then has no owner or title. Unless an initialization is running, the
    /// session counts as initialized with the new wishlist afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::CreateFailed`]; the store is left unchanged.
    /// [`WishlistError::NotPersisted`] if the service returned no id.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Wishlist> {
        let generation = self.inner.store.generation();
        let account = match self.call(self.inner.accounts.current_account()).await {
            Ok(account) => Some(account),
            Err(err) => {
                warn!(error = %err, "Account lookup failed, creating wishlist without owner");
                None
            }
        };
        let created = self.create_in(generation, account.as_ref()).await?;

        let wishlist_id = created.persisted_id().ok_or(WishlistError::NotPersisted)?;
        if !self.inner.init.adopt(wishlist_id) {
            debug!(%wishlist_id, "Initialization running, not adopting created wishlist");
        }
        Ok(created)
    }

    async fn create_in(&self, generation: Generation, account: Option<&Account>) -> Result<Wishlist> {
        let payload = NewWishlist {
            owner: account.map(|a| a.id.clone()),
            title: account
                .and_then(|a| a.contact_email.as_ref())
                .map(ToString::to_string),
            items: Vec::new(),
        };

        let created = self
            .call(self.inner.wishlists.create_wishlist(&payload))
            .await
            .map_err(|err| WishlistError::CreateFailed(Arc::new(err)))?;
        if !created.is_persisted() {
            warn!("Created wishlist came back without an id");
            return Err(WishlistError::NotPersisted);
        }
        info!(wishlist_id = ?created.id, "Created wishlist");

        let snapshot = self.inner.store.replace(
            generation,
            Wishlist {
                items: Vec::new(),
                ..created
            },
        )?;
        self.publish(snapshot.clone(), UpdateSource::Auto);
        Ok(snapshot)
    }

    /// Add a product, unless it is already on the wishlist.
    ///
    /// The first of `prices` becomes the item price.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::AddItemFailed`] wrapping the initialization
    /// or gateway failure.
    #[instrument(skip(self, product, prices, note), fields(product = %product.id))]
    pub async fn add_product(
        &self,
        product: &ProductRef,
        prices: &[Price],
        note: Option<String>,
    ) -> Result<AddOutcome> {
        let failed = |err| WishlistError::AddItemFailed(Box::new(err));
        let generation = self.inner.store.generation();
        let initialized = self.get_or_create_wishlist().await.map_err(failed)?;
        // Items go to the stored wishlist, which is the one they are appended to.
        let wishlist_id = self
            .inner
            .store
            .read(|w| w.persisted_id().cloned())
            .unwrap_or(initialized);

        let product_id = product.product_id();
        if self.inner.store.find_item(&product_id).is_some() {
            debug!(%product_id, "Product already on wishlist");
            return Ok(AddOutcome::AlreadyPresent);
        }

        let new_item = NewItem::new(product_id, prices.first().cloned(), note);
        let created = self
            .call(self.inner.wishlists.create_item(&wishlist_id, &new_item))
            .await
            .map_err(|err| failed(WishlistError::gateway(err)))?;

        let item = new_item.into_item(created, product.name.clone());
        let snapshot = self
            .inner
            .store
            .append_items(generation, vec![item])
            .map_err(|stale| failed(stale.into()))?;
        info!(%wishlist_id, items = snapshot.items.len(), "Added product to wishlist");
        self.publish(snapshot, UpdateSource::Auto);
        Ok(AddOutcome::Added)
    }

    /// Sum of the item totals, initializing first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::TotalsUnavailable`] if initialization fails.
    #[instrument(skip(self))]
    pub async fn total_price(&self) -> Result<Decimal> {
        self.get_or_create_wishlist()
            .await
            .map_err(|err| WishlistError::TotalsUnavailable(Box::new(err)))?;
        Ok(self.inner.store.read(Wishlist::total_price))
    }

    /// Change amount or note of an item.
    ///
    /// # Errors
    ///
    /// Always [`WishlistError::NotImplemented`].
    #[allow(clippy::unused_async)]
    pub async fn update_item_info(
        &self,
        _product: &ProductRef,
        _amount: u32,
        _note: Option<String>,
    ) -> Result<()> {
        Err(WishlistError::NotImplemented("update_item_info"))
    }

    /// Remove an item.
    ///
    /// # Errors
    ///
    /// Always [`WishlistError::NotImplemented`].
    #[allow(clippy::unused_async)]
    pub async fn remove_item(&self, _product: &ProductRef) -> Result<()> {
        Err(WishlistError::NotImplemented("remove_item"))
    }

    // =========================================================================
    // Local state
    // =========================================================================

    /// Forget the wishlist, e.g. on logout. Makes no remote call.
    ///
    /// A running initialization is invalidated: its callers fail with
    /// [`WishlistError::Superseded`] and its results are discarded.
    pub fn reset(&self) {
        // Status first: a leader that starts after this sees the new
        // generation, one that started before is no longer current.
        let rejected = self.inner.init.reset();
        let (generation, snapshot) = self.inner.store.reset();
        info!(rejected, ?generation, "Wishlist session reset");
        self.publish(snapshot, UpdateSource::Reset);
    }

    /// Snapshot of the stored wishlist.
    #[must_use]
    pub fn local_wishlist(&self) -> Wishlist {
        self.inner.store.snapshot()
    }

    /// The stored item for a product, if any.
    #[must_use]
    pub fn find_item(&self, product: &ProductRef) -> Option<Item> {
        self.inner.store.find_item(&product.product_id())
    }

    /// Currency used for price lookups.
    #[must_use]
    pub fn currency(&self) -> CurrencyContext {
        self.inner.currency.lock().clone()
    }

    /// Switch the price currency. Call [`WishlistSession::refresh_current`]
    /// to reprice the stored items.
    pub fn set_currency(&self, currency: CurrencyContext) {
        info!(currency = %currency.id, "Currency changed");
        *self.inner.currency.lock() = currency;
    }

    /// Observe wishlist changes.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.inner.notifier.subscribe()
    }

    fn publish(&self, wishlist: Wishlist, source: UpdateSource) {
        self.inner.notifier.publish(wishlist, source);
    }

    async fn call<T>(
        &self,
        call: impl std::future::Future<Output = GatewayResult<T>>,
    ) -> GatewayResult<T> {
        timed(self.inner.timeout, call).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use wishlist_core::{CreatedItem, PriceInfo, ProductId, ProductMetadata};

    use super::*;
    use crate::gateway::ProductQuery;

    /// Every call fails, so any test passing through it proves no I/O.
    struct Offline;

    #[async_trait]
    impl WishlistGateway for Offline {
        async fn list_wishlists(&self) -> GatewayResult<Vec<Wishlist>> {
            Err(GatewayError::Rejected("offline".to_string()))
        }

        async fn create_wishlist(&self, _: &NewWishlist) -> GatewayResult<Wishlist> {
            Err(GatewayError::Rejected("offline".to_string()))
        }

        async fn list_items(&self, _: &WishlistId) -> GatewayResult<Vec<Item>> {
            Err(GatewayError::Rejected("offline".to_string()))
        }

        async fn create_item(&self, _: &WishlistId, _: &NewItem) -> GatewayResult<CreatedItem> {
            Err(GatewayError::Rejected("offline".to_string()))
        }
    }

    #[async_trait]
    impl CatalogGateway for Offline {
        async fn query_products(&self, _: &ProductQuery) -> GatewayResult<Vec<ProductMetadata>> {
            Err(GatewayError::Rejected("offline".to_string()))
        }

        async fn prices_for_products(
            &self,
            _: &[ProductId],
            _: &str,
        ) -> GatewayResult<HashMap<ProductId, PriceInfo>> {
            Err(GatewayError::Rejected("offline".to_string()))
        }
    }

    #[async_trait]
    impl AccountResolver for Offline {
        async fn current_account(&self) -> GatewayResult<Account> {
            Err(GatewayError::Unauthenticated)
        }
    }

    fn offline_session() -> WishlistSession {
        let offline = Arc::new(Offline);
        WishlistSession::new(
            offline.clone(),
            offline.clone(),
            offline,
            SessionOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_reset_is_local_and_notifies() {
        let session = offline_session();
        let mut updates = session.subscribe();

        session.reset();

        let update = updates.try_recv().unwrap();
        assert_eq!(update.source, UpdateSource::Reset);
        assert_eq!(update.wishlist, Wishlist::default());
        assert_eq!(session.status(), InitPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let session = offline_session();
        let product = ProductRef::new("P1");

        assert!(matches!(
            session.update_item_info(&product, 2, None).await,
            Err(WishlistError::NotImplemented("update_item_info"))
        ));
        assert!(matches!(
            session.remove_item(&product).await,
            Err(WishlistError::NotImplemented("remove_item"))
        ));
    }

    #[tokio::test]
    async fn test_initialization_failure_rolls_back() {
        let session = offline_session();
        let err = session.get_or_create_wishlist().await.unwrap_err();

        assert!(matches!(
            err,
            WishlistError::InitializationFailed(ref inner)
                if matches!(**inner, WishlistError::AccountResolutionFailed(_))
        ));
        assert!(matches!(err.gateway_cause(), Some(GatewayError::Unauthenticated)));
        assert_eq!(session.status(), InitPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_refresh_current_without_wishlist_is_noop() {
        offline_session().refresh_current().await.unwrap();
    }

    #[test]
    fn test_set_currency() {
        let session = offline_session();
        session.set_currency(CurrencyContext::new("EUR", "€"));
        assert_eq!(session.currency().id, "EUR");
    }
}
