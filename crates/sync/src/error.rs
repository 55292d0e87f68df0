//! Error types for the wishlist engine.
//!
//! [`GatewayError`] describes a failed call to an external collaborator.
//! [`WishlistError`] is what session operations return. It is `Clone` so one
//! failed initialization can be handed to every caller queued behind it;
//! gateway causes are therefore shared behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::store::StaleGeneration;

/// Errors raised by the wishlist, catalog and account gateways.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No authenticated account for the current session.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Response body could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The call did not complete within the configured timeout.
    #[error("Gateway call timed out after {0:?}")]
    Timeout(Duration),

    /// The collaborator refused the request for another reason.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Errors returned by wishlist session operations.
#[derive(Debug, Clone, Error)]
pub enum WishlistError {
    /// The current account could not be resolved.
    #[error("account resolution failed: {0}")]
    AccountResolutionFailed(#[source] Arc<GatewayError>),

    /// The create-or-fetch sequence failed.
    #[error("wishlist initialization failed: {0}")]
    InitializationFailed(#[source] Box<WishlistError>),

    /// The remote item list could not be fetched.
    #[error("wishlist refresh failed: {0}")]
    RefreshFailed(#[source] Arc<GatewayError>),

    /// The remote wishlist could not be created.
    #[error("wishlist creation failed: {0}")]
    CreateFailed(#[source] Arc<GatewayError>),

    /// A product could not be added.
    #[error("adding item failed: {0}")]
    AddItemFailed(#[source] Box<WishlistError>),

    /// A catalog call failed while enriching a page of items.
    #[error("item enrichment failed on page {page}: {source}")]
    EnrichmentFailed {
        /// Zero-based page number.
        page: usize,
        /// Catalog failure.
        source: Arc<GatewayError>,
    },

    /// The total could not be computed because initialization failed.
    #[error("wishlist totals unavailable: {0}")]
    TotalsUnavailable(#[source] Box<WishlistError>),

    /// The operation exists in the contract but has no implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// The session was reset while the operation was in flight.
    #[error("wishlist session was reset during the operation")]
    Superseded,

    /// The operation leading an initialization was dropped before it settled.
    #[error("wishlist initialization was abandoned before completion")]
    Abandoned,

    /// The wishlist has not been persisted remotely yet.
    #[error("wishlist has not been created remotely")]
    NotPersisted,

    /// A gateway call failed outside the categories above.
    #[error("gateway error: {0}")]
    Gateway(#[source] Arc<GatewayError>),
}

impl WishlistError {
    /// Wrap a gateway failure.
    #[must_use]
    pub fn gateway(err: GatewayError) -> Self {
        Self::Gateway(Arc::new(err))
    }

    /// Returns `true` if this error, or one it wraps, is [`Self::Superseded`].
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        match self {
            Self::Superseded => true,
            Self::InitializationFailed(inner)
            | Self::AddItemFailed(inner)
            | Self::TotalsUnavailable(inner) => inner.is_superseded(),
            _ => false,
        }
    }

    /// The underlying gateway failure, if any.
    #[must_use]
    pub fn gateway_cause(&self) -> Option<&GatewayError> {
        match self {
            Self::AccountResolutionFailed(err)
            | Self::RefreshFailed(err)
            | Self::CreateFailed(err)
            | Self::Gateway(err)
            | Self::EnrichmentFailed { source: err, .. } => Some(err.as_ref()),
            Self::InitializationFailed(inner)
            | Self::AddItemFailed(inner)
            | Self::TotalsUnavailable(inner) => inner.gateway_cause(),
            Self::NotImplemented(_) | Self::Superseded | Self::Abandoned | Self::NotPersisted => {
                None
            }
        }
    }
}

impl From<StaleGeneration> for WishlistError {
    fn from(_: StaleGeneration) -> Self {
        Self::Superseded
    }
}

/// Result type alias for `WishlistError`.
pub type Result<T> = std::result::Result<T, WishlistError>;
