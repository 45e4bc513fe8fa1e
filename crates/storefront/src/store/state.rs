//! Count/loading/error state and its transition function.

/// How a failed refresh is reflected in the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Record the failure so the badge can show an error.
    Surface,
    /// Keep the last known count and show nothing.
    Silent,
}

/// An event in the life of a count refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A refresh was issued.
    Begin,
    /// The backend reported a count.
    Succeed(u32),
    /// The refresh failed.
    Fail,
    /// The refresh ended without a usable result (dropped or superseded).
    Cancel,
}

/// Snapshot of one resource's badge state.
///
/// Only a store changes this, through [`ResourceState::apply`]; everyone
/// else receives copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceState {
    count: u32,
    is_loading: bool,
    has_error: bool,
}

impl ResourceState {
    /// State before the first refresh completes: the count is unknown.
    pub const INITIAL: Self = Self {
        count: 0,
        is_loading: true,
        has_error: false,
    };

    /// Last count reported by the backend.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// True while a refresh is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// True when the most recent refresh failed and errors are surfaced.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.has_error
    }

    /// Apply a transition. Every transition other than `Begin` clears the
    /// loading flag, whatever its outcome.
    #[must_use]
    pub const fn apply(self, transition: Transition, errors: ErrorPolicy) -> Self {
        match transition {
            Transition::Begin => Self {
                is_loading: true,
                ..self
            },
            Transition::Succeed(count) => Self {
                count,
                is_loading: false,
                has_error: false,
            },
            Transition::Fail => Self {
                is_loading: false,
                has_error: matches!(errors, ErrorPolicy::Surface) || self.has_error,
                ..self
            },
            Transition::Cancel => Self {
                is_loading: false,
                ..self
            },
        }
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::INITIAL
    }
}
