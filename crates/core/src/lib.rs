//! SalesSavvy Core - Shared storefront types.
//!
//! This crate provides the types shared by the storefront client and its
//! test harness:
//! - `storefront` - Catalog, cart and wishlist client with live badge counts
//! - `integration-tests` - Mock backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no runtime.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, usernames, and catalog entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
