//! Header badge and price formatting.

use core::fmt;

use savvy_core::{Identity, Price};

use crate::store::{ErrorPolicy, ResourceState};

/// What a count badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// A refresh is in flight or the first one has not completed.
    Loading,
    /// The last refresh failed.
    Error,
    /// The count reported by the backend.
    Count(u32),
}

impl Badge {
    /// Badge for a state. Errors only show under [`ErrorPolicy::Surface`].
    #[must_use]
    pub const fn for_state(state: ResourceState, errors: ErrorPolicy) -> Self {
        if state.is_loading() {
            Self::Loading
        } else if state.has_error() && matches!(errors, ErrorPolicy::Surface) {
            Self::Error
        } else {
            Self::Count(state.count())
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("..."),
            Self::Error => f.write_str("Error"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

/// Everything the page header shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub cart: Badge,
    pub wishlist: Badge,
    /// Display name; empty until the identity resolves.
    pub username: String,
}

impl HeaderView {
    #[must_use]
    pub fn new(cart: ResourceState, wishlist: ResourceState, identity: Option<&Identity>) -> Self {
        Self {
            cart: Badge::for_state(cart, ErrorPolicy::Surface),
            wishlist: Badge::for_state(wishlist, ErrorPolicy::Silent),
            username: identity.map(Identity::display_name).unwrap_or_default().to_owned(),
        }
    }
}

impl fmt::Display for HeaderView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wishlist ({}) | Cart ({}) | {}",
            self.wishlist, self.cart, self.username
        )
    }
}

/// Format a price for display (e.g., "₹499.00").
#[must_use]
pub fn format_price(price: &Price) -> String {
    format!("₹{price}")
}
