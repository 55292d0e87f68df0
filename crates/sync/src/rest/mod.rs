//! REST adapters for the gateway traits.
//!
//! # Architecture
//!
//! - One shared `reqwest` client carrying the site code (`hybris-site`) and
//!   the session bearer token as default headers
//! - The remote services are the source of truth - no local persistence
//! - Product metadata is cached in memory via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use wishlist_sync::rest::{RestAccountResolver, RestCatalogGateway, RestClient, RestWishlistGateway};
//!
//! let client = RestClient::new(&config.endpoints, config.gateway_timeout)?;
//! let wishlists = RestWishlistGateway::new(client.clone(), config.endpoints.wishlist_url.clone());
//! let lists = wishlists.list_wishlists().await?;
//! ```

mod account;
mod catalog;
mod wishlist;

pub use account::RestAccountResolver;
pub use catalog::RestCatalogGateway;
pub use wishlist::RestWishlistGateway;

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::config::EndpointConfig;
use crate::error::GatewayError;
use crate::gateway::GatewayResult;

/// Header carrying the storefront site code.
const SITE_HEADER: &str = "hybris-site";

/// Length of the response-body prefix kept in errors and logs.
const BODY_PREVIEW: usize = 200;

/// HTTP client shared by the REST gateways.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<reqwest::Client>,
}

impl RestClient {
    /// Build a client with the site and authorization headers.
    ///
    /// # Errors
    ///
    /// Returns error if a header value is malformed or the HTTP client fails
    /// to build.
    pub fn new(endpoints: &EndpointConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            SITE_HEADER,
            HeaderValue::from_str(&endpoints.site_code)
                .map_err(|e| GatewayError::Parse(format!("Invalid site code: {e}")))?,
        );

        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", endpoints.access_token.expose_secret()))
                .map_err(|e| GatewayError::Parse(format!("Invalid access token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(client),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> GatewayResult<T> {
        debug!(%url, "GET");
        let response = self.inner.get(url).send().await?;
        read_json(response).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> GatewayResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%url, "POST");
        let response = self.inner.post(url).json(body).send().await?;
        read_json(response).await
    }
}

/// Check the status and decode a JSON body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(GatewayError::Unauthenticated);
    }

    // Get response body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        let message: String = body.chars().take(BODY_PREVIEW).collect();
        error!(status = %status, body = %message, "Gateway returned non-success status");
        return Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(
            error = %e,
            body = %body.chars().take(BODY_PREVIEW).collect::<String>(),
            "Failed to parse gateway response"
        );
        GatewayError::Parse(e.to_string())
    })
}

/// Append path segments to a base URL, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> GatewayResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| GatewayError::Parse(format!("Base URL cannot have a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
