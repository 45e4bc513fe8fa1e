//! SalesSavvy backend REST API.
//!
//! # Architecture
//!
//! - [`StoreApi`] is the seam between the client state and the network
//! - [`HttpStoreApi`] implements it with `reqwest`
//! - The backend is the source of truth: counts and lists are always taken
//!   from responses, never computed locally
//!
//! # Endpoints
//!
//! | Call | Route |
//! |---|---|
//! | catalog | `GET /api/products?category=<cat>` |
//! | cart count | `GET /api/cart/items/count?username=<u>` |
//! | wishlist count | `GET /api/wishlist/items/count?username=<u>` |
//! | add to cart | `POST /api/cart/add` |
//! | add to wishlist | `POST /api/wishlist/add` |
//! | wishlist items | `GET /api/wishlist/items` |
//! | remove from wishlist | `DELETE /api/wishlist/delete` |
//! | move to cart | `POST /api/wishlist/move-to-cart` |

mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpStoreApi;
pub use types::*;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use thiserror::Error;

use savvy_core::Username;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered with a non-success status.
    #[error("Unexpected status: {0}")]
    Status(StatusCode),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The configured credential cannot be sent as a header.
    #[error("Invalid credential: not a valid header value")]
    InvalidCredential,

    /// The backend has no route for this write.
    #[error("{resource} does not support {operation}")]
    Unsupported {
        /// Resource the write targeted.
        resource: Resource,
        /// Requested operation.
        operation: Operation,
    },
}

/// Access to the storefront backend.
///
/// Implementations carry the visitor's credential with every request.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// Fetch the catalog for a category, along with the visitor's identity.
    async fn catalog(&self, category: &str) -> Result<CatalogPayload, ApiError>;

    /// Fetch the number of items in a resource for a user.
    async fn item_count(&self, resource: Resource, username: &Username) -> Result<u32, ApiError>;

    /// Issue a write and return the response status.
    ///
    /// Any HTTP response is `Ok`; callers decide which statuses confirm the
    /// write.
    async fn write_item(
        &self,
        resource: Resource,
        operation: Operation,
        request: &ItemRequest,
    ) -> Result<StatusCode, ApiError>;

    /// Fetch the visitor's wishlist.
    async fn wishlist_items(&self) -> Result<WishlistPayload, ApiError>;
}

/// Method and path for a write, if the backend supports it.
#[must_use]
pub fn write_route(resource: Resource, operation: Operation) -> Option<(Method, &'static str)> {
    match (resource, operation) {
        (Resource::Cart, Operation::Add) => Some((Method::POST, "api/cart/add")),
        (Resource::Wishlist, Operation::Add) => Some((Method::POST, "api/wishlist/add")),
        (Resource::Wishlist, Operation::Remove) => Some((Method::DELETE, "api/wishlist/delete")),
        (Resource::Wishlist, Operation::MoveToCart) => {
            Some((Method::POST, "api/wishlist/move-to-cart"))
        }
        (Resource::Cart, Operation::Remove | Operation::MoveToCart) => None,
    }
}
