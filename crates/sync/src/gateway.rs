//! Contracts for the external collaborators of the engine.
//!
//! The session never talks HTTP itself. It depends on these three traits and
//! is handed implementations at construction time: [`crate::rest`] for real
//! endpoints, in-memory fakes in tests.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use wishlist_core::{
    Account, CreatedItem, Item, NewItem, NewWishlist, PriceInfo, ProductId, ProductMetadata,
    Wishlist, WishlistId,
};

use crate::error::GatewayError;

/// Result alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Run a gateway call, failing with [`GatewayError::Timeout`] once `limit`
/// elapses.
pub(crate) async fn timed<T>(
    limit: Duration,
    call: impl Future<Output = GatewayResult<T>>,
) -> GatewayResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(GatewayError::Timeout(limit)))
}

/// Remote wishlist storage.
#[async_trait]
pub trait WishlistGateway: Send + Sync {
    /// List every wishlist visible to the session.
    async fn list_wishlists(&self) -> GatewayResult<Vec<Wishlist>>;

    /// Create a wishlist; the server assigns its id.
    async fn create_wishlist(&self, wishlist: &NewWishlist) -> GatewayResult<Wishlist>;

    /// List the raw items of a wishlist.
    async fn list_items(&self, wishlist_id: &WishlistId) -> GatewayResult<Vec<Item>>;

    /// Add an item to a wishlist.
    async fn create_item(
        &self,
        wishlist_id: &WishlistId,
        item: &NewItem,
    ) -> GatewayResult<CreatedItem>;
}

/// Product catalog and price service.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Fetch metadata for one page of products.
    async fn query_products(&self, query: &ProductQuery) -> GatewayResult<Vec<ProductMetadata>>;

    /// Fetch prices for a set of products in one currency.
    async fn prices_for_products(
        &self,
        products: &[ProductId],
        currency_id: &str,
    ) -> GatewayResult<HashMap<ProductId, PriceInfo>>;
}

/// Resolves the account of the authenticated session.
#[async_trait]
pub trait AccountResolver: Send + Sync {
    /// The current account, or [`GatewayError::Unauthenticated`].
    async fn current_account(&self) -> GatewayResult<Account>;
}

/// One page of a product-metadata query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Products to fetch.
    pub ids: Vec<ProductId>,
    /// Zero-based page number (`offset / page size`).
    pub page_number: usize,
    /// Number of products on this page.
    pub page_size: usize,
}

impl ProductQuery {
    /// Query expression understood by the product service: `id:(A,B,C)`.
    #[must_use]
    pub fn filter(&self) -> String {
        let ids = self
            .ids
            .iter()
            .map(ProductId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!("id:({ids})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_query_filter() {
        let query = ProductQuery {
            ids: vec![ProductId::new("A"), ProductId::new("shop;B")],
            page_number: 0,
            page_size: 2,
        };
        assert_eq!(query.filter(), "id:(A,B)");
    }
}
