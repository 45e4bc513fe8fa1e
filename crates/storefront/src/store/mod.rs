//! Resource count stores.
//!
//! One [`ResourceStore`] per resource kind owns that kind's
//! [`ResourceState`] and is its only writer. Display code reads snapshots or
//! subscribes to a [`ResourceView`].
//!
//! # Protocol
//!
//! - `refresh` marks the state loading, queries the count, and settles. The
//!   loading flag is cleared on every settlement, including when the call
//!   panics or the future is dropped.
//! - `mutate` issues a write and refreshes the count only when the write's
//!   success signal is met. Counts are never adjusted locally.
//! - Refreshes are sequenced: a response older than one already applied is
//!   discarded.

mod state;

pub use state::{ErrorPolicy, ResourceState, Transition};

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use savvy_core::{ProductId, Username};

use crate::api::{ItemRequest, Operation, Resource, StoreApi};

// =============================================================================
// Resource Kinds
// =============================================================================

/// Static description of a resource kind.
pub trait ResourceKind: Send + Sync + 'static {
    /// Runtime tag used by the API layer.
    const RESOURCE: Resource;
    /// How refresh failures are shown.
    const ERRORS: ErrorPolicy;

    /// Whether this kind accepts the given write.
    fn supports(operation: Operation) -> bool;
}

/// The visitor's cart. Refresh failures show an error badge.
#[derive(Debug)]
pub enum Cart {}

impl ResourceKind for Cart {
    const RESOURCE: Resource = Resource::Cart;
    const ERRORS: ErrorPolicy = ErrorPolicy::Surface;

    fn supports(operation: Operation) -> bool {
        matches!(operation, Operation::Add)
    }
}

/// The visitor's wishlist. Refresh failures keep the last count silently.
#[derive(Debug)]
pub enum Wishlist {}

impl ResourceKind for Wishlist {
    const RESOURCE: Resource = Resource::Wishlist;
    const ERRORS: ErrorPolicy = ErrorPolicy::Silent;

    fn supports(_operation: Operation) -> bool {
        true
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a write, as seen by the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend confirmed the write and the count was refreshed.
    Confirmed,
    /// The backend answered without the expected success signal.
    Rejected(StatusCode),
    /// The request did not complete.
    Failed,
    /// No signed-in visitor; nothing was sent.
    NotSignedIn,
    /// The resource does not accept this operation; nothing was sent.
    Unsupported,
}

impl MutationOutcome {
    /// Returns true if the backend confirmed the write.
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

// =============================================================================
// ResourceStore
// =============================================================================

/// State plus the bookkeeping needed to sequence refreshes.
#[derive(Debug, Clone, Copy)]
struct Slot {
    state: ResourceState,
    /// Sequence number of the latest refresh issued.
    issued: u64,
    /// Sequence number of the latest refresh whose result was applied.
    applied: u64,
    /// Refreshes issued but not yet settled.
    in_flight: u32,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            state: ResourceState::INITIAL,
            issued: 0,
            applied: 0,
            in_flight: 0,
        }
    }
}

/// Owner of one resource kind's count state.
pub struct ResourceStore<K: ResourceKind> {
    api: Arc<dyn StoreApi>,
    slot: watch::Sender<Slot>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> ResourceStore<K> {
    /// Create a store in the initial (loading, count 0) state.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>) -> Self {
        let (slot, _) = watch::channel(Slot::default());
        Self {
            api,
            slot,
            _kind: PhantomData,
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> ResourceState {
        self.slot.borrow().state
    }

    /// Read-only view that is notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> ResourceView {
        ResourceView {
            rx: self.slot.subscribe(),
        }
    }

    /// Re-read the count from the backend.
    ///
    /// Taking a [`Username`] means a refresh can only be issued for a
    /// signed-in visitor.
    #[instrument(skip(self), fields(resource = %K::RESOURCE, username = %username))]
    pub async fn refresh(&self, username: &Username) {
        let pending = Pending {
            store: self,
            ticket: self.begin(),
            settled: false,
        };

        let transition = match self.api.item_count(K::RESOURCE, username).await {
            Ok(count) => {
                debug!(count, "Count refreshed");
                Transition::Succeed(count)
            }
            Err(e) => {
                warn!(error = %e, "Count refresh failed");
                Transition::Fail
            }
        };

        pending.settle(transition);
    }

    /// Issue a write and refresh the count if the backend confirms it.
    #[instrument(skip(self), fields(resource = %K::RESOURCE, username = %username, product_id = %product_id))]
    pub async fn mutate(
        &self,
        username: &Username,
        product_id: ProductId,
        operation: Operation,
    ) -> MutationOutcome {
        self.mutate_with(username, product_id, operation, || {})
            .await
    }

    /// Like [`ResourceStore::mutate`], running `on_confirmed` as soon as the
    /// write is confirmed and before the count is refreshed.
    pub async fn mutate_with<F>(
        &self,
        username: &Username,
        product_id: ProductId,
        operation: Operation,
        on_confirmed: F,
    ) -> MutationOutcome
    where
        F: FnOnce() + Send,
    {
        if !K::supports(operation) {
            warn!(%operation, "Operation not supported for {}", K::RESOURCE);
            return MutationOutcome::Unsupported;
        }

        let request = ItemRequest::new(username.clone(), product_id);
        match self.api.write_item(K::RESOURCE, operation, &request).await {
            Ok(status) if operation.confirms(status) => {
                on_confirmed();
                self.refresh(username).await;
                MutationOutcome::Confirmed
            }
            Ok(status) => {
                warn!(%operation, %status, "Write was not confirmed");
                MutationOutcome::Rejected(status)
            }
            Err(e) => {
                warn!(%operation, error = %e, "Write failed");
                MutationOutcome::Failed
            }
        }
    }

    /// Settle the initial loading state for a visitor with no username.
    ///
    /// No request is made; the count stays at its last value.
    pub fn settle_anonymous(&self) {
        self.slot.send_if_modified(|slot| {
            if slot.in_flight > 0 || !slot.state.is_loading() {
                return false;
            }
            slot.state = slot.state.apply(Transition::Cancel, K::ERRORS);
            true
        });
    }

    fn begin(&self) -> u64 {
        let mut ticket = 0;
        self.slot.send_modify(|slot| {
            slot.issued += 1;
            slot.in_flight += 1;
            ticket = slot.issued;
            slot.state = slot.state.apply(Transition::Begin, K::ERRORS);
        });
        ticket
    }

    fn finish(&self, ticket: u64, transition: Transition) {
        self.slot.send_modify(|slot| {
            slot.in_flight = slot.in_flight.saturating_sub(1);

            let transition = if ticket < slot.applied {
                debug!(ticket, applied = slot.applied, "Discarding superseded response");
                Transition::Cancel
            } else {
                if transition != Transition::Cancel {
                    slot.applied = ticket;
                }
                transition
            };

            slot.state = slot.state.apply(transition, K::ERRORS);
            if slot.in_flight > 0 {
                slot.state = slot.state.apply(Transition::Begin, K::ERRORS);
            }
        });
    }
}

/// An issued refresh. Dropping it unsettled cancels it, so the loading flag
/// clears even if the request panics or its future is dropped.
struct Pending<'a, K: ResourceKind> {
    store: &'a ResourceStore<K>,
    ticket: u64,
    settled: bool,
}

impl<K: ResourceKind> Pending<'_, K> {
    fn settle(mut self, transition: Transition) {
        self.settled = true;
        self.store.finish(self.ticket, transition);
    }
}

impl<K: ResourceKind> Drop for Pending<'_, K> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(resource = %K::RESOURCE, "Refresh abandoned before settling");
            self.store.finish(self.ticket, Transition::Cancel);
        }
    }
}

// =============================================================================
// ResourceView
// =============================================================================

/// Read-only projection of a store's state.
#[derive(Clone)]
pub struct ResourceView {
    rx: watch::Receiver<Slot>,
}

impl ResourceView {
    /// Current state.
    #[must_use]
    pub fn current(&self) -> ResourceState {
        self.rx.borrow().state
    }

    /// Wait for the next change and return the new state.
    ///
    /// # Errors
    ///
    /// Returns an error once the owning store has been dropped.
    pub async fn changed(&mut self) -> Result<ResourceState, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().state)
    }
}
