//! Core types for the wishlist engine.
//!
//! This module provides type-safe wrappers for the wishlist domain.

pub mod account;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod wishlist;

pub use account::Account;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceInfo};
pub use product::{ProductMetadata, ProductRef};
pub use wishlist::{CreatedItem, Item, NewItem, NewWishlist, Wishlist};
