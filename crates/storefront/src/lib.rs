//! SalesSavvy storefront client library.
//!
//! Keeps a visitor's catalog listing and header counts in step with the
//! SalesSavvy backend. The [`session::Storefront`] orchestrator is the entry
//! point; the `savvy` binary is a thin command-line front end over it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod identity;
pub mod session;
pub mod store;
