//! Account lookup over REST.

use async_trait::async_trait;
use tracing::instrument;
use url::Url;
use wishlist_core::Account;

use super::{RestClient, endpoint};
use crate::gateway::{AccountResolver, GatewayResult};

/// [`AccountResolver`] backed by the account service's `GET me` route.
#[derive(Clone)]
pub struct RestAccountResolver {
    client: RestClient,
    base_url: Url,
}

impl RestAccountResolver {
    /// Create a resolver rooted at `base_url`.
    #[must_use]
    pub const fn new(client: RestClient, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl AccountResolver for RestAccountResolver {
    #[instrument(skip(self))]
    async fn current_account(&self) -> GatewayResult<Account> {
        let url = endpoint(&self.base_url, &["me"])?;
        self.client.get_json(url).await
    }
}
