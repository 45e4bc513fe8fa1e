//! Session identity resolution.
//!
//! The backend reports who the visitor is alongside the catalog, so no
//! separate round trip is needed. The first report fixes the identity for
//! the rest of the session; writes and count refreshes are gated on it.

use std::sync::OnceLock;

use tracing::{debug, info};

use savvy_core::{Identity, Username};

use crate::error::set_sentry_user;

/// Result of offering a reported name to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// This report established the session identity.
    Resolved(&'a Identity),
    /// The identity was already established and is unchanged.
    Unchanged,
}

/// Holds the session identity once the backend has reported it.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    identity: OnceLock<Identity>,
}

impl IdentityResolver {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            identity: OnceLock::new(),
        }
    }

    /// Offer the name the backend reported. Only the first offer counts;
    /// a missing or blank name resolves to the guest identity.
    pub fn resolve(&self, reported: Option<&str>) -> Resolution<'_> {
        let mut established = false;
        let identity = self.identity.get_or_init(|| {
            established = true;
            Identity::from_reported(reported)
        });

        if established {
            info!(identity = %identity, "Identity resolved");
            if let Some(username) = identity.username() {
                set_sentry_user(username);
            }
            Resolution::Resolved(identity)
        } else {
            if Identity::from_reported(reported) != *identity {
                debug!(
                    identity = %identity,
                    reported = ?reported,
                    "Ignoring identity change within session"
                );
            }
            Resolution::Unchanged
        }
    }

    /// The session identity, if resolved.
    #[must_use]
    pub fn current(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// The signed-in username, if any. `None` while unresolved and for guests.
    #[must_use]
    pub fn username(&self) -> Option<&Username> {
        self.current().and_then(Identity::username)
    }
}
