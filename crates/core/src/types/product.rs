//! Catalog-side product types.

use serde::{Deserialize, Serialize};

use super::ProductId;

/// Product metadata returned by the catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    /// Catalog product id.
    pub id: ProductId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A product as presented by the caller of "add to wishlist".
///
/// Product detail pages hand over the catalog product, which may carry a
/// composite `itemYrn` reference in addition to its plain `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    /// Catalog id as shown to the caller.
    pub id: String,
    /// Composite item reference (`namespace;id`), if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_yrn: Option<String>,
    /// Display name, stamped on the wishlist item once it is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProductRef {
    /// Reference a product by its plain catalog id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_yrn: None,
            name: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the composite item reference.
    #[must_use]
    pub fn with_item_yrn(mut self, item_yrn: impl Into<String>) -> Self {
        self.item_yrn = Some(item_yrn.into());
        self
    }

    /// The normalized product id: the composite reference wins over `id`.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.item_yrn
            .as_deref()
            .map_or_else(|| ProductId::new(self.id.as_str()), ProductId::new)
    }
}
