//! Error types and Sentry helpers.
//!
//! Storefront operations never return errors to the visitor: each one
//! degrades locally (empty list, stale count, error badge). [`AppError`] is
//! only for the binary's startup and exit status.

use thiserror::Error;

use savvy_core::Username;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Application-level error type for the storefront binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The API client could not be built.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A write was requested without a signed-in visitor.
    #[error("Not signed in: cannot {0}")]
    NotSignedIn(String),
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the resolved username.
///
/// Called once per session when the identity resolves to a signed-in visitor.
pub fn set_sentry_user(username: &Username) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.as_str().to_owned()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Add to cart", Some(&[("product_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
