//! `reqwest` implementation of [`StoreApi`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use savvy_core::Username;

use super::{
    ApiError, CatalogPayload, ItemRequest, Operation, Resource, StoreApi, WishlistPayload,
    write_route,
};
use crate::config::ApiConfig;

/// Name of the cookie the backend reads the session token from.
const AUTH_COOKIE: &str = "authToken";

/// Longest response body excerpt written to logs.
const LOG_BODY_CHARS: usize = 500;

// =============================================================================
// HttpStoreApi
// =============================================================================

/// HTTP client for the storefront backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct HttpStoreApi {
    inner: Arc<HttpStoreApiInner>,
}

struct HttpStoreApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStoreApi {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let mut cookie =
                HeaderValue::from_str(&format!("{AUTH_COOKIE}={}", token.expose_secret()))
                    .map_err(|_| ApiError::InvalidCredential)?;
            cookie.set_sensitive(true);
            headers.insert(COOKIE, cookie);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(HttpStoreApiInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an endpoint path, appending query pairs.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET a JSON document, treating non-success statuses as errors.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %excerpt(&body),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status(status));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl StoreApi for HttpStoreApi {
    #[instrument(skip(self))]
    async fn catalog(&self, category: &str) -> Result<CatalogPayload, ApiError> {
        let url = self.endpoint("api/products", &[("category", category)])?;
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(username = %username))]
    async fn item_count(&self, resource: Resource, username: &Username) -> Result<u32, ApiError> {
        let url = self.endpoint(resource.count_path(), &[("username", username.as_str())])?;
        self.get_json(url).await
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    async fn write_item(
        &self,
        resource: Resource,
        operation: Operation,
        request: &ItemRequest,
    ) -> Result<StatusCode, ApiError> {
        let (method, path) =
            write_route(resource, operation).ok_or(ApiError::Unsupported { resource, operation })?;
        let url = self.endpoint(path, &[])?;

        let response = self
            .inner
            .client
            .request(method, url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Write completed");
        Ok(status)
    }

    #[instrument(skip(self))]
    async fn wishlist_items(&self) -> Result<WishlistPayload, ApiError> {
        let url = self.endpoint("api/wishlist/items", &[])?;
        self.get_json(url).await
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_CHARS).collect()
}
