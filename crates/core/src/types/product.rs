//! Catalog and wishlist entries.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Image shown for products that have no image of their own.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/80?text=No+Image";

/// A product as listed in the catalog.
///
/// Products are read-only on the client and are replaced wholesale each
/// time a category is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    #[serde(alias = "product_id", alias = "productId")]
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Image URL, if the product has one.
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

impl Product {
    /// The product image, or `placeholder` when the product has none.
    #[must_use]
    pub fn image_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self.image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => placeholder,
        }
    }
}

/// A product saved to the visitor's wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// The saved product.
    #[serde(flatten)]
    pub product: Product,
}

impl WishlistItem {
    /// ID used to remove or move this item.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}

impl From<Product> for WishlistItem {
    fn from(product: Product) -> Self {
        Self { product }
    }
}
