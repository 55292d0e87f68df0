//! Newtype IDs for type-safe entity references.
//!
//! Remote identifiers are opaque strings. Use the `define_id!` macro to create
//! wrappers that prevent accidentally mixing IDs from different entity types.
//! [`ProductId`] is written by hand because it normalizes composite catalog
//! references on construction.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use wishlist_core::define_id;
/// define_id!(CartId);
/// define_id!(OrderId);
///
/// let cart_id = CartId::new("c-1");
/// let order_id = OrderId::new("c-1");
///
/// // These are different types, so this won't compile:
/// // let _: CartId = order_id;
/// # let _ = (cart_id, order_id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(WishlistId);
define_id!(AccountId);

/// Catalog product identifier.
///
/// Items can reference products either by bare catalog id (`PROD123`) or by a
/// composite reference such as `catalog;PROD123` or a full item URN
/// (`urn:yaas:hybris:product:shop;PROD123`). Every constructor, including
/// deserialization, reduces a composite reference to the segment following the
/// first `;`, so two references to the same product always compare equal.
///
/// ```
/// use wishlist_core::ProductId;
///
/// assert_eq!(ProductId::new("catalog;PROD123"), ProductId::new("PROD123"));
/// assert_eq!(ProductId::new("PROD123").as_str(), "PROD123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Separator between the namespace and the id of a composite reference.
    pub const COMPOSITE_SEPARATOR: char = ';';

    /// Create a product ID, normalizing composite references.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        match id.split(Self::COMPOSITE_SEPARATOR).nth(1) {
            Some(bare) => Self(bare.to_owned()),
            None => Self(id),
        }
    }

    /// Returns `true` if the input is a composite reference that
    /// [`ProductId::new`] would shorten.
    #[must_use]
    pub fn is_composite(raw: &str) -> bool {
        raw.contains(Self::COMPOSITE_SEPARATOR)
    }

    /// Get the bare catalog id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_product_id_is_normalized() {
        let id = ProductId::new("catalog;PROD123");
        assert_eq!(id.as_str(), "PROD123");
        assert_eq!(id, ProductId::new("PROD123"));
    }

    #[test]
    fn test_urn_product_id_is_normalized() {
        let id = ProductId::new("urn:yaas:hybris:product:shop;5f0c3a");
        assert_eq!(id.as_str(), "5f0c3a");
    }

    #[test]
    fn test_bare_product_id_is_untouched() {
        assert_eq!(ProductId::new("PROD123").as_str(), "PROD123");
        assert!(!ProductId::is_composite("PROD123"));
        assert!(ProductId::is_composite("catalog;PROD123"));
    }

    #[test]
    fn test_product_id_deserialize_normalizes() {
        let id: ProductId = serde_json::from_str("\"catalog;PROD123\"").unwrap();
        assert_eq!(id.as_str(), "PROD123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"PROD123\"");
    }

    #[test]
    fn test_string_ids_are_transparent() {
        let id = WishlistId::new("wl-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"wl-1\"");
        assert_eq!(id.to_string(), "wl-1");
        assert_eq!(String::from(AccountId::from("acc")), "acc");
    }
}
