//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price as carried on a wishlist item.
///
/// `effective_amount` is what the customer pays today and is the only field
/// used in totals. Amounts deserialize from either JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount charged, after any sale or discount.
    pub effective_amount: Decimal,
    /// List amount before discounts, if the catalog reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_amount: Option<Decimal>,
    /// Currency id the amounts are expressed in (e.g. "USD").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Price {
    /// Create a price with only an effective amount.
    #[must_use]
    pub const fn new(effective_amount: Decimal) -> Self {
        Self {
            effective_amount,
            original_amount: None,
            currency: None,
        }
    }

    /// Attach a currency id.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Effective amount multiplied by a quantity.
    #[must_use]
    pub fn line_total(&self, amount: u32) -> Decimal {
        self.effective_amount * Decimal::from(amount)
    }
}

/// Catalog price answer for a single product in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    /// Price of the product (or its default variant).
    pub single_price: Price,
    /// Lowest variant price, present when the product has a price range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
}

impl PriceInfo {
    /// The price to show on a wishlist line: the minimum price when the
    /// product has a range, otherwise the single price.
    #[must_use]
    pub fn display_price(&self) -> &Price {
        self.min_price.as_ref().unwrap_or(&self.single_price)
    }
}
