//! Wire types for the storefront backend.
//!
//! These mirror the JSON the backend exchanges; conversion into display
//! state happens in [`crate::session`].

use core::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use savvy_core::{Product, ProductId, Username, WishlistItem};

// =============================================================================
// Resources & Operations
// =============================================================================

/// A per-visitor collection the backend keeps a count for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Cart,
    Wishlist,
}

impl Resource {
    /// Path of the item count endpoint.
    #[must_use]
    pub const fn count_path(self) -> &'static str {
        match self {
            Self::Cart => "api/cart/items/count",
            Self::Wishlist => "api/wishlist/items/count",
        }
    }

    /// Lowercase name used in logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Add a product.
    Add,
    /// Remove a product.
    Remove,
    /// Move a wishlist product into the cart.
    MoveToCart,
}

impl Operation {
    /// Whether `status` confirms that the backend committed this write.
    ///
    /// Adds accept any 2xx. Removal requires exactly 204 and moving requires
    /// exactly 200.
    #[must_use]
    pub fn confirms(self, status: StatusCode) -> bool {
        match self {
            Self::Add => status.is_success(),
            Self::Remove => status == StatusCode::NO_CONTENT,
            Self::MoveToCart => status == StatusCode::OK,
        }
    }

    /// Lowercase name used in logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::MoveToCart => "move-to-cart",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Body of every item write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub username: Username,
    pub product_id: ProductId,
}

impl ItemRequest {
    #[must_use]
    pub const fn new(username: Username, product_id: ProductId) -> Self {
        Self {
            username,
            product_id,
        }
    }
}

// =============================================================================
// Response Bodies
// =============================================================================

/// Visitor details reported alongside the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedUser {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of the catalog endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPayload {
    #[serde(default)]
    pub user: Option<ReportedUser>,
    #[serde(default)]
    pub products: Option<Vec<Product>>,
}

impl CatalogPayload {
    /// Name the backend reported for the visitor, if any.
    #[must_use]
    pub fn reported_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|user| user.name.as_deref())
    }

    /// The listed products; a missing list is empty.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products.unwrap_or_default()
    }
}

/// The `wishlist` object of the wishlist endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistBody {
    #[serde(default)]
    pub products: Option<Vec<WishlistItem>>,
}

/// Response of the wishlist items endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistPayload {
    #[serde(default)]
    pub wishlist: Option<WishlistBody>,
    #[serde(default)]
    pub username: Option<String>,
}

impl WishlistPayload {
    /// The listed items; a missing list is empty.
    #[must_use]
    pub fn into_items(self) -> Vec<WishlistItem> {
        self.wishlist
            .and_then(|body| body.products)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_success_signals() {
        assert!(Operation::Add.confirms(StatusCode::OK));
        assert!(Operation::Add.confirms(StatusCode::CREATED));
        assert!(Operation::Add.confirms(StatusCode::NO_CONTENT));
        assert!(!Operation::Add.confirms(StatusCode::BAD_REQUEST));

        assert!(Operation::Remove.confirms(StatusCode::NO_CONTENT));
        assert!(!Operation::Remove.confirms(StatusCode::OK));

        assert!(Operation::MoveToCart.confirms(StatusCode::OK));
        assert!(!Operation::MoveToCart.confirms(StatusCode::CREATED));
        assert!(!Operation::MoveToCart.confirms(StatusCode::NO_CONTENT));
    }

    #[test]
    fn test_item_request_uses_camel_case() {
        let request = ItemRequest::new(Username::parse("alice").unwrap(), ProductId::new(42));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"username": "alice", "productId": 42}));
    }

    #[test]
    fn test_catalog_payload_tolerates_missing_fields() {
        let payload: CatalogPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.reported_name(), None);
        assert!(payload.into_products().is_empty());

        let payload: CatalogPayload =
            serde_json::from_str(r#"{"user": null, "products": null}"#).unwrap();
        assert!(payload.into_products().is_empty());
    }

    #[test]
    fn test_catalog_payload_reads_user_and_products() {
        let json = r#"{
            "user": {"name": "alice"},
            "products": [{"id": 1, "name": "Tee", "price": 199}]
        }"#;
        let payload: CatalogPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.reported_name(), Some("alice"));
        let products = payload.into_products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price.to_string(), "199.00");
    }

    #[test]
    fn test_wishlist_payload_items() {
        let json = r#"{
            "wishlist": {"products": [{"product_id": 42, "name": "Cap", "price": "9.5"}]},
            "username": "alice"
        }"#;
        let payload: WishlistPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.username.as_deref(), Some("alice"));
        let items = payload.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id(), ProductId::new(42));
    }
}
