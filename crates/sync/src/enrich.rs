//! Batch enrichment of raw wishlist items with catalog data.
//!
//! The product service takes its id filter in the request URI, so items are
//! enriched a page at a time. Pages are requested strictly in ascending order
//! and each finished page is handed to a sink straight away, which lets the
//! store show partial progress while later pages are still in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};
use wishlist_core::{Item, PriceInfo, ProductId, ProductMetadata};

use crate::error::{Result, WishlistError};
use crate::gateway::{CatalogGateway, ProductQuery, timed};

/// Products per catalog request; keeps the id filter well within URI limits.
pub const DEFAULT_PAGE_SIZE: usize = 16;

/// One enriched page, ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedPage {
    /// Zero-based page number.
    pub number: usize,
    /// Items of the page, in input order.
    pub items: Vec<Item>,
}

/// Outcome of a completed [`BatchEnricher::fill_items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichmentSummary {
    /// Pages fetched.
    pub pages: usize,
    /// Items enriched.
    pub items: usize,
}

/// Pages raw items through the catalog gateway.
#[derive(Clone)]
pub struct BatchEnricher {
    catalog: Arc<dyn CatalogGateway>,
    page_size: usize,
    timeout: Duration,
}

impl BatchEnricher {
    /// Create an enricher. A zero page size is treated as 1.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogGateway>, page_size: usize, timeout: Duration) -> Self {
        Self {
            catalog,
            page_size: page_size.max(1),
            timeout,
        }
    }

    /// Products per request.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Enrich `items` page by page, passing each finished page to `on_page`.
    ///
    /// An empty input completes without any gateway call.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::EnrichmentFailed`] for the first page whose
    /// catalog calls fail; pages already handed to `on_page` are not taken
    /// back. Errors returned by `on_page` stop the loop and are passed through.
    #[instrument(skip(self, items, on_page), fields(items = items.len(), page_size = self.page_size))]
    pub async fn fill_items<F>(
        &self,
        items: Vec<Item>,
        currency_id: &str,
        mut on_page: F,
    ) -> Result<EnrichmentSummary>
    where
        F: FnMut(EnrichedPage) -> Result<()>,
    {
        let mut summary = EnrichmentSummary::default();
        let mut remaining = items.into_iter();

        loop {
            let page: Vec<Item> = remaining.by_ref().take(self.page_size).collect();
            if page.is_empty() {
                break;
            }

            let number = summary.pages;
            let items = self.enrich_page(number, page, currency_id).await?;
            debug!(page = number, items = items.len(), "Enriched wishlist page");

            summary.pages += 1;
            summary.items += items.len();
            on_page(EnrichedPage { number, items })?;
        }

        Ok(summary)
    }

    async fn enrich_page(
        &self,
        number: usize,
        mut page: Vec<Item>,
        currency_id: &str,
    ) -> Result<Vec<Item>> {
        let failed = |err| WishlistError::EnrichmentFailed {
            page: number,
            source: Arc::new(err),
        };

        let ids: Vec<ProductId> = page.iter().map(|item| item.product.clone()).collect();
        let query = ProductQuery {
            ids,
            page_number: number,
            page_size: page.len(),
        };

        let products = timed(self.timeout, self.catalog.query_products(&query))
            .await
            .map_err(failed)?;
        let prices = timed(
            self.timeout,
            self.catalog.prices_for_products(&query.ids, currency_id),
        )
        .await
        .map_err(failed)?;

        merge_page(&mut page, &products, &prices);
        Ok(page)
    }
}

/// Attach names and display prices to the items of one page.
fn merge_page(
    page: &mut [Item],
    products: &[ProductMetadata],
    prices: &HashMap<ProductId, PriceInfo>,
) {
    for item in page {
        if let Some(name) = products
            .iter()
            .find(|p| p.id == item.product)
            .and_then(|p| p.name.clone())
        {
            item.name = Some(name);
        }
        if let Some(info) = prices.get(&item.product) {
            item.price = Some(info.display_price().clone());
        }
    }
}
