//! Wishlist storage over REST.

use async_trait::async_trait;
use tracing::instrument;
use url::Url;
use wishlist_core::{CreatedItem, Item, NewItem, NewWishlist, Wishlist, WishlistId};

use super::{RestClient, endpoint};
use crate::gateway::{GatewayResult, WishlistGateway};

/// [`WishlistGateway`] backed by the wishlist service.
///
/// Routes, relative to the service base URL:
///
/// | Call | Route |
/// |------|-------|
/// | list wishlists | `GET wishlists` |
/// | create wishlist | `POST wishlists` |
/// | list items | `GET wishlists/{id}/wishlistItems` |
/// | create item | `POST wishlists/{id}/wishlistItems` |
#[derive(Clone)]
pub struct RestWishlistGateway {
    client: RestClient,
    base_url: Url,
}

impl RestWishlistGateway {
    /// Create a gateway rooted at `base_url`.
    #[must_use]
    pub const fn new(client: RestClient, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn items_url(&self, wishlist_id: &WishlistId) -> GatewayResult<Url> {
        endpoint(
            &self.base_url,
            &["wishlists", wishlist_id.as_str(), "wishlistItems"],
        )
    }
}

#[async_trait]
impl WishlistGateway for RestWishlistGateway {
    #[instrument(skip(self))]
    async fn list_wishlists(&self) -> GatewayResult<Vec<Wishlist>> {
        let url = endpoint(&self.base_url, &["wishlists"])?;
        self.client.get_json(url).await
    }

    #[instrument(skip(self, wishlist), fields(owner = ?wishlist.owner))]
    async fn create_wishlist(&self, wishlist: &NewWishlist) -> GatewayResult<Wishlist> {
        let url = endpoint(&self.base_url, &["wishlists"])?;
        self.client.post_json(url, wishlist).await
    }

    #[instrument(skip(self, wishlist_id), fields(wishlist_id = %wishlist_id))]
    async fn list_items(&self, wishlist_id: &WishlistId) -> GatewayResult<Vec<Item>> {
        let url = self.items_url(wishlist_id)?;
        self.client.get_json(url).await
    }

    #[instrument(skip(self, wishlist_id, item), fields(wishlist_id = %wishlist_id, product = %item.product))]
    async fn create_item(
        &self,
        wishlist_id: &WishlistId,
        item: &NewItem,
    ) -> GatewayResult<CreatedItem> {
        let url = self.items_url(wishlist_id)?;
        self.client.post_json(url, item).await
    }
}
