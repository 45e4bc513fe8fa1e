//! Scripted in-memory [`StoreApi`] for unit tests.
//!
//! Replies are queued per endpoint and consumed in call order. Every call is
//! recorded so tests can assert exactly which requests were issued.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use savvy_core::{ProductId, Username};

use super::{ApiError, CatalogPayload, ItemRequest, Operation, Resource, StoreApi, WishlistPayload};

/// A request the fake received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Catalog(String),
    Count(Resource, String),
    Write(Resource, Operation, String, ProductId),
    WishlistItems,
}

/// A scripted reply.
pub enum Reply<T> {
    Ok(T),
    /// Fail the way an unparseable body does.
    Malformed,
    /// Fail with a non-success status.
    Status(StatusCode),
    /// Panic inside the call.
    Panic,
    /// Wait for the gate before answering.
    Gated(Arc<Notify>, Box<Reply<T>>),
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    catalog: Mutex<VecDeque<Reply<CatalogPayload>>>,
    counts: Mutex<HashMap<Resource, VecDeque<Reply<u32>>>>,
    writes: Mutex<VecDeque<Reply<StatusCode>>>,
    wishlist: Mutex<VecDeque<Reply<WishlistPayload>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn malformed() -> ApiError {
    ApiError::Parse(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
}

async fn answer<T>(mut reply: Reply<T>) -> Result<T, ApiError> {
    loop {
        reply = match reply {
            Reply::Ok(value) => return Ok(value),
            Reply::Malformed => return Err(malformed()),
            Reply::Status(status) => return Err(ApiError::Status(status)),
            Reply::Panic => panic!("scripted panic inside API call"),
            Reply::Gated(gate, inner) => {
                gate.notified().await;
                *inner
            }
        };
    }
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_catalog(&self, reply: Reply<CatalogPayload>) -> &Self {
        lock(&self.catalog).push_back(reply);
        self
    }

    pub fn push_count(&self, resource: Resource, reply: Reply<u32>) -> &Self {
        lock(&self.counts).entry(resource).or_default().push_back(reply);
        self
    }

    pub fn push_write(&self, reply: Reply<StatusCode>) -> &Self {
        lock(&self.writes).push_back(reply);
        self
    }

    pub fn push_wishlist(&self, reply: Reply<WishlistPayload>) -> &Self {
        lock(&self.wishlist).push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn count_calls(&self, resource: Resource) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Count(r, _) if *r == resource))
            .count()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl StoreApi for FakeApi {
    async fn catalog(&self, category: &str) -> Result<CatalogPayload, ApiError> {
        self.record(Call::Catalog(category.to_owned()));
        let reply = lock(&self.catalog)
            .pop_front()
            .unwrap_or_else(|| Reply::Ok(CatalogPayload::default()));
        answer(reply).await
    }

    async fn item_count(&self, resource: Resource, username: &Username) -> Result<u32, ApiError> {
        self.record(Call::Count(resource, username.as_str().to_owned()));
        let reply = lock(&self.counts)
            .get_mut(&resource)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::Ok(0));
        answer(reply).await
    }

    async fn write_item(
        &self,
        resource: Resource,
        operation: Operation,
        request: &ItemRequest,
    ) -> Result<StatusCode, ApiError> {
        self.record(Call::Write(
            resource,
            operation,
            request.username.as_str().to_owned(),
            request.product_id,
        ));
        let reply = lock(&self.writes)
            .pop_front()
            .unwrap_or(Reply::Ok(StatusCode::OK));
        answer(reply).await
    }

    async fn wishlist_items(&self) -> Result<WishlistPayload, ApiError> {
        self.record(Call::WishlistItems);
        let reply = lock(&self.wishlist)
            .pop_front()
            .unwrap_or_else(|| Reply::Ok(WishlistPayload::default()));
        answer(reply).await
    }
}
