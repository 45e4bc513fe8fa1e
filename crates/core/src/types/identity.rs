//! Visitor identity types.
//!
//! The backend reports the signed-in visitor's name alongside the catalog.
//! A visitor without a name is shown as [`ANONYMOUS_NAME`] but may not
//! perform writes, so [`Username`] can only hold a real, non-anonymous name.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Display name used for visitors the backend did not identify.
pub const ANONYMOUS_NAME: &str = "Guest";

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is empty or whitespace only.
    #[error("username cannot be empty")]
    Empty,
    /// The input is the anonymous display name.
    #[error("\"{ANONYMOUS_NAME}\" is not a signed-in username")]
    Anonymous,
}

/// The name of a signed-in visitor.
///
/// ## Constraints
///
/// - Not empty after trimming surrounding whitespace
/// - Not equal to [`ANONYMOUS_NAME`]
///
/// ## Examples
///
/// ```
/// use savvy_core::Username;
///
/// assert!(Username::parse("alice").is_ok());
/// assert!(Username::parse("").is_err());
/// assert!(Username::parse("Guest").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Parse a `Username` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or is the anonymous name.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        if trimmed == ANONYMOUS_NAME {
            return Err(UsernameError::Anonymous);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A resolved visitor identity.
///
/// `Guest` is a valid display value but never authorizes a write; use
/// [`Identity::username`] to get the credential-bearing name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// The backend did not report a signed-in visitor.
    Guest,
    /// A signed-in visitor.
    User(Username),
}

impl Identity {
    /// Build an identity from the name the backend reported, if any.
    ///
    /// Missing, blank, and anonymous names all map to [`Identity::Guest`].
    #[must_use]
    pub fn from_reported(name: Option<&str>) -> Self {
        name.and_then(|n| Username::parse(n).ok())
            .map_or(Self::Guest, Self::User)
    }

    /// Name shown in the header.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Guest => ANONYMOUS_NAME,
            Self::User(username) => username.as_str(),
        }
    }

    /// The username to send with writes, or `None` for guests.
    #[must_use]
    pub const fn username(&self) -> Option<&Username> {
        match self {
            Self::Guest => None,
            Self::User(username) => Some(username),
        }
    }

    /// Returns true if this identity is the anonymous guest.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
