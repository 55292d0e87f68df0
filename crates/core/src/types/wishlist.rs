//! The wishlist aggregate and its items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::{AccountId, Price, ProductId, WishlistId};

/// Reads a wishlist id, treating a blank one as absent.
fn non_blank_id<'de, D>(deserializer: D) -> Result<Option<WishlistId>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<String>::deserialize(deserializer)?;
    Ok(id
        .filter(|id| !id.trim().is_empty())
        .map(WishlistId::from))
}

/// The user's single active wishlist, as held on the client.
///
/// A wishlist whose `id` is `None` or blank has never been persisted remotely
/// and must not be used as an enrichment or mutation target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    /// Server-assigned id.
    #[serde(
        default,
        deserialize_with = "non_blank_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<WishlistId>,
    /// Owning account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<AccountId>,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Items in enrichment completion order.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Currency symbol of the prices, attached after a full enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,
}

impl Wishlist {
    /// The server-assigned id, unless it is missing or blank.
    #[must_use]
    pub fn persisted_id(&self) -> Option<&WishlistId> {
        self.id
            .as_ref()
            .filter(|id| !id.as_str().trim().is_empty())
    }

    /// Returns `true` once the wishlist has a server-assigned id.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted_id().is_some()
    }

    /// Find the item for a product.
    #[must_use]
    pub fn find_item(&self, product: &ProductId) -> Option<&Item> {
        self.items.iter().find(|item| &item.product == product)
    }

    /// Sum of `effective_amount * amount` over all items.
    ///
    /// Items without a price contribute nothing.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .filter_map(|item| item.price.as_ref().map(|p| p.line_total(item.amount)))
            .sum()
    }
}

const fn default_amount() -> u32 {
    1
}

/// One product line in a wishlist.
///
/// Items listed from the server arrive raw (`name` unset, `price` as posted).
/// They count as enriched once the catalog has supplied both name and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Bare catalog product id.
    pub product: ProductId,
    /// Price of one unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// Quantity.
    #[serde(default = "default_amount")]
    pub amount: u32,
    /// Free-text annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Product display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server-side creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    /// A raw item reference with quantity 1.
    #[must_use]
    pub fn new(product: impl Into<ProductId>, price: Option<Price>) -> Self {
        Self {
            product: product.into(),
            price,
            amount: default_amount(),
            note: None,
            name: None,
            created_at: None,
        }
    }

    /// Set the quantity.
    #[must_use]
    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    /// Returns `true` once both name and price are known.
    #[must_use]
    pub const fn is_enriched(&self) -> bool {
        self.name.is_some() && self.price.is_some()
    }
}

/// Outbound payload for creating a wishlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWishlist {
    /// Owning account, blank if the account lookup failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<AccountId>,
    /// Placeholder title (the owner's contact email).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Always empty on creation.
    pub items: Vec<Item>,
}

/// Outbound payload for creating a wishlist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    /// Bare catalog product id.
    pub product: ProductId,
    /// Price the product was added at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// Quantity, 1 on creation.
    pub amount: u32,
    /// Free-text annotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NewItem {
    /// Build a creation payload with quantity 1.
    #[must_use]
    pub const fn new(product: ProductId, price: Option<Price>, note: Option<String>) -> Self {
        Self {
            product,
            price,
            amount: 1,
            note,
        }
    }

    /// Turn the accepted payload into a local item.
    #[must_use]
    pub fn into_item(self, created: CreatedItem, name: Option<String>) -> Item {
        Item {
            product: self.product,
            price: self.price,
            amount: self.amount,
            note: self.note,
            name,
            created_at: created.created_at,
        }
    }
}

/// Server answer to an item creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedItem {
    /// Server-assigned creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn priced(product: &str, amount: i64, quantity: u32) -> Item {
        Item::new(product, Some(Price::new(Decimal::from(amount)))).with_amount(quantity)
    }

    #[test]
    fn test_total_price() {
        let wishlist = Wishlist {
            items: vec![priced("A", 10, 2), priced("B", 5, 1)],
            ..Wishlist::default()
        };
        assert_eq!(wishlist.total_price(), Decimal::from(25));
    }

    #[test]
    fn test_total_price_skips_unpriced_items() {
        let wishlist = Wishlist {
            items: vec![priced("A", 7, 1), Item::new("B", None).with_amount(4)],
            ..Wishlist::default()
        };
        assert_eq!(wishlist.total_price(), Decimal::from(7));
        assert_eq!(Wishlist::default().total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_find_item_uses_normalized_id() {
        let wishlist = Wishlist {
            items: vec![Item::new("catalog;PROD123", None)],
            ..Wishlist::default()
        };
        assert!(wishlist.find_item(&ProductId::new("PROD123")).is_some());
        assert!(wishlist.find_item(&ProductId::new("PROD999")).is_none());
    }

    #[test]
    fn test_is_enriched_requires_name_and_price() {
        let mut item = Item::new("A", None);
        assert!(!item.is_enriched());
        item.name = Some("Alpha".to_string());
        assert!(!item.is_enriched());
        item.price = Some(Price::new(Decimal::ONE));
        assert!(item.is_enriched());
    }

    #[test]
    fn test_raw_item_defaults() {
        let item: Item = serde_json::from_str(r#"{"product": "shop;P1"}"#).unwrap();
        assert_eq!(item.product.as_str(), "P1");
        assert_eq!(item.amount, 1);
        assert!(item.name.is_none());
    }

    #[test]
    fn test_unpersisted_wishlist() {
        let wishlist: Wishlist = serde_json::from_str(r#"{"owner": "acc-1"}"#).unwrap();
        assert!(!wishlist.is_persisted());
        assert!(wishlist.items.is_empty());
    }

    #[test]
    fn test_blank_id_is_not_persisted() {
        let wishlist: Wishlist = serde_json::from_str(r#"{"id": "", "owner": "acct-1"}"#).unwrap();
        assert_eq!(wishlist.id, None);
        assert!(!wishlist.is_persisted());

        let built = Wishlist {
            id: Some(WishlistId::new(" ")),
            ..Wishlist::default()
        };
        assert_eq!(built.persisted_id(), None);
        assert!(!built.is_persisted());
    }

    #[test]
    fn test_persisted_id() {
        let wishlist: Wishlist = serde_json::from_str(r#"{"id": "wl-1"}"#).unwrap();
        assert_eq!(wishlist.persisted_id(), Some(&WishlistId::new("wl-1")));
    }
}
