//! Product and price lookups over REST.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;
use wishlist_core::{Price, PriceInfo, ProductId, ProductMetadata};

use super::{RestClient, endpoint};
use crate::gateway::{CatalogGateway, GatewayResult, ProductQuery};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// One record of the price service response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRecord {
    product_id: ProductId,
    single_price: Price,
    #[serde(default)]
    min_price: Option<Price>,
}

/// [`CatalogGateway`] backed by the product and price services.
///
/// Product metadata changes rarely, so it is cached per product id. Prices
/// are always fetched.
#[derive(Clone)]
pub struct RestCatalogGateway {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    client: RestClient,
    product_url: Url,
    price_url: Url,
    products: Cache<ProductId, ProductMetadata>,
}

impl RestCatalogGateway {
    /// Create a gateway for the given product and price service base URLs.
    #[must_use]
    pub fn new(client: RestClient, product_url: Url, price_url: Url) -> Self {
        let products = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogInner {
                client,
                product_url,
                price_url,
                products,
            }),
        }
    }

    /// Drop every cached product.
    pub fn invalidate_cache(&self) {
        self.inner.products.invalidate_all();
    }

    async fn fetch_products(&self, query: &ProductQuery) -> GatewayResult<Vec<ProductMetadata>> {
        let mut url = endpoint(&self.inner.product_url, &["products"])?;
        url.query_pairs_mut()
            .append_pair("q", &query.filter())
            .append_pair("pageNumber", &query.page_number.to_string())
            .append_pair("pageSize", &query.page_size.to_string());
        self.inner.client.get_json(url).await
    }
}

/// A standalone lookup of the products a cached page still lacks.
///
/// The id filter already limits the result to `ids`, so the lookup asks for
/// the first page sized to fit them. Carrying over the enrichment page number
/// would make a service that pages the filtered result skip past them.
fn uncached_lookup(ids: Vec<ProductId>) -> ProductQuery {
    ProductQuery {
        page_number: 0,
        page_size: ids.len(),
        ids,
    }
}

#[async_trait]
impl CatalogGateway for RestCatalogGateway {
    #[instrument(skip(self, query), fields(page = query.page_number, ids = query.ids.len()))]
    async fn query_products(&self, query: &ProductQuery) -> GatewayResult<Vec<ProductMetadata>> {
        let mut found = Vec::with_capacity(query.ids.len());
        let mut missing = Vec::new();
        for id in &query.ids {
            match self.inner.products.get(id).await {
                Some(product) => found.push(product),
                None => missing.push(id.clone()),
            }
        }

        if missing.is_empty() {
            debug!("Cache hit for every product");
            return Ok(found);
        }

        debug!(cached = found.len(), missing = missing.len(), "Fetching products");
        let fetched = if found.is_empty() {
            self.fetch_products(query).await?
        } else {
            self.fetch_products(&uncached_lookup(missing)).await?
        };

        for product in &fetched {
            self.inner
                .products
                .insert(product.id.clone(), product.clone())
                .await;
        }
        found.extend(fetched);
        Ok(found)
    }

    #[instrument(skip(self, products), fields(products = products.len()))]
    async fn prices_for_products(
        &self,
        products: &[ProductId],
        currency_id: &str,
    ) -> GatewayResult<HashMap<ProductId, PriceInfo>> {
        if products.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = products
            .iter()
            .map(ProductId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = endpoint(&self.inner.price_url, &["prices"])?;
        url.query_pairs_mut()
            .append_pair("productId", &ids)
            .append_pair("currency", currency_id);

        let records: Vec<PriceRecord> = self.inner.client.get_json(url).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let info = PriceInfo {
                    single_price: record.single_price,
                    min_price: record.min_price,
                };
                (record.product_id, info)
            })
            .collect())
    }
}
