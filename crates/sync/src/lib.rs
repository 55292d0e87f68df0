//! Wishlist Sync - Client-side wishlist synchronization engine.
//!
//! Keeps one user's wishlist in memory and in step with the remote wishlist,
//! product and price services:
//! - [`WishlistSession`] - lazy create-or-fetch, refresh, add, totals, reset
//! - [`BatchEnricher`] - attaches names and prices in pages of 16 products
//! - [`UpdateNotifier`] - broadcasts a snapshot after every change
//! - [`rest`] - `reqwest` implementations of the gateway traits
//!
//! # Architecture
//!
//! The session only sees the traits in [`gateway`]. Production code wires
//! the REST adapters via [`WishlistSession::from_config`]; tests hand in
//! in-memory fakes. There is no local persistence: the remote services are
//! the source of truth and the store is rebuilt on every initialization.
//!
//! # Example
//!
//! ```rust,ignore
//! use wishlist_sync::{SyncConfig, WishlistSession};
//!
//! let config = SyncConfig::from_env()?;
//! let session = WishlistSession::from_config(&config)?;
//! let total = session.total_price().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod enrich;
pub mod error;
pub mod gateway;
pub mod init;
pub mod notify;
pub mod rest;
pub mod session;
pub mod store;

pub use config::{ConfigError, CurrencyContext, EndpointConfig, SyncConfig};
pub use enrich::{BatchEnricher, DEFAULT_PAGE_SIZE, EnrichedPage, EnrichmentSummary};
pub use error::{GatewayError, Result, WishlistError};
pub use gateway::{AccountResolver, CatalogGateway, GatewayResult, ProductQuery, WishlistGateway};
pub use init::InitPhase;
pub use notify::{Subscription, UpdateNotifier, UpdateSource, WishlistUpdate};
pub use session::{AddOutcome, DEFAULT_GATEWAY_TIMEOUT, SessionOptions, WishlistSession};
pub use store::{Generation, WishlistStore};
