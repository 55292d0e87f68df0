//! In-memory services for exercising the wishlist sync engine.
//!
//! [`FakeServices`] plays the wishlist, catalog and account services at once.
//! Every call is recorded, and individual calls can be made to fail, hang
//! forever, or block behind a [`Gate`] until the test releases them.
//!
//! ```rust,ignore
//! let services = FakeServices::new();
//! services.seed_product("P1", "Tee", Decimal::from(10));
//! let session = services.session();
//! session.get_or_create_wishlist().await?;
//! assert_eq!(services.control().count(Call::CurrentAccount), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::watch;
use wishlist_core::{
    Account, AccountId, CreatedItem, Email, Item, NewItem, NewWishlist, Price, PriceInfo,
    ProductId, ProductMetadata, Wishlist, WishlistId,
};
use wishlist_sync::{
    AccountResolver, CatalogGateway, GatewayError, GatewayResult, ProductQuery, SessionOptions,
    WishlistGateway, WishlistSession,
};

/// Account id the fake account service reports.
pub const ACCOUNT_ID: &str = "acct-1";

/// Contact email of [`ACCOUNT_ID`].
pub const ACCOUNT_EMAIL: &str = "shopper@example.com";

/// A gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ListWishlists,
    CreateWishlist,
    ListItems,
    CreateItem,
    QueryProducts,
    Prices,
    CurrentAccount,
}

/// Releases the calls blocked behind it.
pub struct Gate {
    sender: watch::Sender<bool>,
}

impl Gate {
    /// Let blocked and future calls through.
    pub fn open(&self) {
        self.sender.send_replace(true);
    }
}

/// Call log and fault injection shared by the fake services.
#[derive(Default)]
pub struct Control {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<Call>>,
    hanging: Mutex<HashSet<Call>>,
    budgets: Mutex<HashMap<Call, usize>>,
    gates: Mutex<HashMap<Call, watch::Receiver<bool>>>,
}

impl Control {
    /// How often `call` has been made.
    #[must_use]
    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Make `call` fail with [`GatewayError::Rejected`].
    pub fn fail(&self, call: Call) {
        self.failing.lock().insert(call);
    }

    /// Undo [`Control::fail`].
    pub fn heal(&self, call: Call) {
        self.failing.lock().remove(&call);
    }

    /// Let `call` succeed `times` more times, then fail.
    pub fn fail_after(&self, call: Call, times: usize) {
        self.budgets.lock().insert(call, times);
    }

    /// Make `call` never complete.
    pub fn hang(&self, call: Call) {
        self.hanging.lock().insert(call);
    }

    /// Block `call` until the returned gate is opened.
    #[must_use]
    pub fn gate(&self, call: Call) -> Gate {
        let (sender, receiver) = watch::channel(false);
        self.gates.lock().insert(call, receiver);
        Gate { sender }
    }

    /// Wait until `call` has been made `times` times.
    ///
    /// # Panics
    ///
    /// Panics after five seconds.
    pub async fn wait_for(&self, call: Call, times: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.count(call) < times {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "{call:?} was not made {times} times");
    }

    async fn enter(&self, call: Call) -> GatewayResult<()> {
        self.calls.lock().push(call);

        let gate = self.gates.lock().get(&call).cloned();
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }

        let hang = self.hanging.lock().contains(&call);
        if hang {
            std::future::pending::<()>().await;
        }

        let exhausted = self.budgets.lock().get_mut(&call).is_some_and(|left| {
            let spent = *left == 0;
            *left = left.saturating_sub(1);
            spent
        });
        let fail = exhausted || self.failing.lock().contains(&call);
        if fail {
            return Err(GatewayError::Rejected(format!("{call:?} failed")));
        }
        Ok(())
    }
}

/// Wishlist, catalog and account services backed by memory.
pub struct FakeServices {
    control: Control,
    account: Mutex<Account>,
    wishlists: Mutex<Vec<Wishlist>>,
    items: Mutex<HashMap<WishlistId, Vec<Item>>>,
    products: Mutex<HashMap<ProductId, (String, Decimal)>>,
    created_wishlists: Mutex<Vec<NewWishlist>>,
    created_items: Mutex<Vec<NewItem>>,
    queries: Mutex<Vec<ProductQuery>>,
    price_currencies: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl FakeServices {
    /// Empty services with one authenticated account.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            control: Control::default(),
            account: Mutex::new(Account {
                id: AccountId::new(ACCOUNT_ID),
                contact_email: Email::parse(ACCOUNT_EMAIL).ok(),
            }),
            wishlists: Mutex::new(Vec::new()),
            items: Mutex::new(HashMap::new()),
            products: Mutex::new(HashMap::new()),
            created_wishlists: Mutex::new(Vec::new()),
            created_items: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            price_currencies: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call log and fault injection.
    #[must_use]
    pub const fn control(&self) -> &Control {
        &self.control
    }

    /// A session over these services with a short gateway timeout.
    #[must_use]
    pub fn session(self: &Arc<Self>) -> WishlistSession {
        self.session_with(SessionOptions {
            gateway_timeout: Duration::from_secs(2),
            ..SessionOptions::default()
        })
    }

    /// A session over these services.
    #[must_use]
    pub fn session_with(self: &Arc<Self>, options: SessionOptions) -> WishlistSession {
        WishlistSession::new(self.clone(), self.clone(), self.clone(), options)
    }

    /// Store a remote wishlist with the given raw items.
    pub fn seed_wishlist(&self, id: &str, owner: &str, items: Vec<Item>) {
        let wishlist_id = WishlistId::new(id);
        self.wishlists.lock().push(Wishlist {
            id: Some(wishlist_id.clone()),
            owner: Some(AccountId::new(owner)),
            title: Some(format!("{owner}'s wishlist")),
            ..Wishlist::default()
        });
        self.items.lock().insert(wishlist_id, items);
    }

    /// Add a product the catalog knows, priced at `amount`.
    pub fn seed_product(&self, id: &str, name: &str, amount: Decimal) {
        self.products
            .lock()
            .insert(ProductId::new(id), (name.to_string(), amount));
    }

    /// Add `count` products named `P0`, `P1`, ... priced at 1 each, and
    /// return them as raw items.
    #[must_use]
    pub fn seed_catalog(&self, count: usize) -> Vec<Item> {
        (0..count)
            .map(|i| {
                let id = format!("P{i}");
                self.seed_product(&id, &format!("Product {i}"), Decimal::ONE);
                Item::new(id, None)
            })
            .collect()
    }

    /// Make the account service report no contact email.
    pub fn clear_account_email(&self) {
        self.account.lock().contact_email = None;
    }

    /// Payloads posted to create wishlists.
    #[must_use]
    pub fn created_wishlists(&self) -> Vec<NewWishlist> {
        self.created_wishlists.lock().clone()
    }

    /// Payloads posted to create items.
    #[must_use]
    pub fn created_items(&self) -> Vec<NewItem> {
        self.created_items.lock().clone()
    }

    /// Product queries received, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<ProductQuery> {
        self.queries.lock().clone()
    }

    /// Currencies prices were requested in, in order.
    #[must_use]
    pub fn price_currencies(&self) -> Vec<String> {
        self.price_currencies.lock().clone()
    }

    /// Remote items of a wishlist.
    #[must_use]
    pub fn remote_items(&self, id: &str) -> Vec<Item> {
        self.items
            .lock()
            .get(&WishlistId::new(id))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl WishlistGateway for FakeServices {
    async fn list_wishlists(&self) -> GatewayResult<Vec<Wishlist>> {
        self.control.enter(Call::ListWishlists).await?;
        Ok(self.wishlists.lock().clone())
    }

    async fn create_wishlist(&self, wishlist: &NewWishlist) -> GatewayResult<Wishlist> {
        self.control.enter(Call::CreateWishlist).await?;
        self.created_wishlists.lock().push(wishlist.clone());

        let id = WishlistId::new(format!(
            "wl-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        let created = Wishlist {
            id: Some(id.clone()),
            owner: wishlist.owner.clone(),
            title: wishlist.title.clone(),
            ..Wishlist::default()
        };
        self.wishlists.lock().push(created.clone());
        self.items.lock().insert(id, Vec::new());
        Ok(created)
    }

    async fn list_items(&self, wishlist_id: &WishlistId) -> GatewayResult<Vec<Item>> {
        self.control.enter(Call::ListItems).await?;
        self.items
            .lock()
            .get(wishlist_id)
            .cloned()
            .ok_or(GatewayError::Api {
                status: 404,
                message: format!("wishlist {wishlist_id} not found"),
            })
    }

    async fn create_item(
        &self,
        wishlist_id: &WishlistId,
        item: &NewItem,
    ) -> GatewayResult<CreatedItem> {
        self.control.enter(Call::CreateItem).await?;
        self.created_items.lock().push(item.clone());

        let created = CreatedItem {
            created_at: Some(Utc::now()),
        };
        let stored = item.clone().into_item(created.clone(), None);
        self.items
            .lock()
            .entry(wishlist_id.clone())
            .or_default()
            .push(stored);
        Ok(created)
    }
}

#[async_trait]
impl CatalogGateway for FakeServices {
    async fn query_products(&self, query: &ProductQuery) -> GatewayResult<Vec<ProductMetadata>> {
        self.control.enter(Call::QueryProducts).await?;
        self.queries.lock().push(query.clone());

        let products = self.products.lock();
        Ok(query
            .ids
            .iter()
            .filter_map(|id| {
                products.get(id).map(|(name, _)| ProductMetadata {
                    id: id.clone(),
                    name: Some(name.clone()),
                })
            })
            .collect())
    }

    async fn prices_for_products(
        &self,
        products: &[ProductId],
        currency_id: &str,
    ) -> GatewayResult<HashMap<ProductId, PriceInfo>> {
        self.control.enter(Call::Prices).await?;
        self.price_currencies.lock().push(currency_id.to_string());

        let known = self.products.lock();
        Ok(products
            .iter()
            .filter_map(|id| {
                known.get(id).map(|(_, amount)| {
                    let info = PriceInfo {
                        single_price: Price::new(*amount).with_currency(currency_id),
                        min_price: None,
                    };
                    (id.clone(), info)
                })
            })
            .collect())
    }
}

#[async_trait]
impl AccountResolver for FakeServices {
    async fn current_account(&self) -> GatewayResult<Account> {
        self.control.enter(Call::CurrentAccount).await?;
        Ok(self.account.lock().clone())
    }
}
