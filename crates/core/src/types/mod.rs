//! Core types for the storefront client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod identity;
pub mod price;
pub mod product;

pub use id::*;
pub use identity::{ANONYMOUS_NAME, Identity, Username, UsernameError};
pub use price::{Price, PriceError};
pub use product::{PLACEHOLDER_IMAGE_URL, Product, WishlistItem};
