//! Wishlist Core - Shared domain types.
//!
//! This crate provides the types exchanged between the wishlist sync engine,
//! its remote gateways and its observers:
//! - [`Wishlist`] and [`Item`] - the client-side wishlist aggregate
//! - [`ProductId`], [`WishlistId`], [`AccountId`] - type-safe identifiers
//! - [`Price`] and [`PriceInfo`] - decimal prices as reported by the catalog
//! - [`Account`] and [`Email`] - the authenticated owner
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no async runtime. The engine lives in `wishlist-sync`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
