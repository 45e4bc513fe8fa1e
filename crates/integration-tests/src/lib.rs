//! Integration tests for the SalesSavvy storefront client.
//!
//! The tests drive the real [`HttpStoreApi`](savvy_storefront::api::HttpStoreApi)
//! against [`MockBackend`], an in-process axum server that stands in for the
//! SalesSavvy backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p savvy-integration-tests
//! ```
//!
//! # Scripting
//!
//! Replies are queued per method and path and consumed in request order.
//! Once a queue is empty the backend answers with an empty success for that
//! endpoint. Every request is recorded.

#![allow(clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use savvy_storefront::config::ApiConfig;
use savvy_storefront::session::Storefront;

/// Session token the default configuration sends.
pub const TEST_TOKEN: &str = "test-session-token";

/// Category loaded when none is given.
pub const DEFAULT_CATEGORY: &str = "Shirts";

pub const PRODUCTS: &str = "/api/products";
pub const CART_COUNT: &str = "/api/cart/items/count";
pub const WISHLIST_COUNT: &str = "/api/wishlist/items/count";
pub const CART_ADD: &str = "/api/cart/add";
pub const WISHLIST_ADD: &str = "/api/wishlist/add";
pub const WISHLIST_ITEMS: &str = "/api/wishlist/items";
pub const WISHLIST_DELETE: &str = "/api/wishlist/delete";
pub const WISHLIST_MOVE: &str = "/api/wishlist/move-to-cart";

// =============================================================================
// Replies
// =============================================================================

/// A scripted response.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

impl Reply {
    /// 200 with a JSON body.
    pub fn json(value: &Value) -> Self {
        Self::raw(StatusCode::OK, &value.to_string())
    }

    /// A status with an empty body.
    pub fn status(status: StatusCode) -> Self {
        Self::raw(status, "")
    }

    /// A status with a literal body.
    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            delay: None,
        }
    }

    /// Wait before answering.
    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn default_for(method: &Method, path: &str) -> Self {
        match (method.as_str(), path) {
            ("GET", PRODUCTS) => Self::json(&serde_json::json!({"user": null, "products": []})),
            ("GET", CART_COUNT | WISHLIST_COUNT) => Self::json(&serde_json::json!(0)),
            ("GET", WISHLIST_ITEMS) => {
                Self::json(&serde_json::json!({"wishlist": {"products": []}}))
            }
            ("POST", CART_ADD | WISHLIST_ADD | WISHLIST_MOVE) => Self::status(StatusCode::OK),
            ("DELETE", WISHLIST_DELETE) => Self::status(StatusCode::NO_CONTENT),
            _ => Self::status(StatusCode::NOT_FOUND),
        }
    }
}

// =============================================================================
// Recorded Requests
// =============================================================================

/// A request the mock backend received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub cookie: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// First value of a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// =============================================================================
// MockBackend
// =============================================================================

#[derive(Default)]
struct Shared {
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process SalesSavvy backend bound to `127.0.0.1:0`.
///
/// The server stops when the value is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&shared));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared, task }
    }

    /// Base URL of the backend, with a trailing slash.
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("Mock backend URL is valid")
    }

    /// Client configuration pointing at this backend with [`TEST_TOKEN`].
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.url(),
            auth_token: Some(SecretString::from(TEST_TOKEN)),
            request_timeout: None,
        }
    }

    /// A fresh session against this backend.
    pub fn storefront(&self) -> Storefront {
        self.storefront_with(&self.api_config())
    }

    /// A fresh session using the given client configuration.
    pub fn storefront_with(&self, config: &ApiConfig) -> Storefront {
        let api = savvy_storefront::api::HttpStoreApi::new(config)
            .expect("Failed to build HTTP client");
        Storefront::new(Arc::new(api), DEFAULT_CATEGORY)
    }

    /// Queue a reply for `method path`.
    pub fn script(&self, method: Method, path: &str, reply: Reply) -> &Self {
        lock(&self.shared.replies)
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn on_get(&self, path: &str, reply: Reply) -> &Self {
        self.script(Method::GET, path, reply)
    }

    pub fn on_post(&self, path: &str, reply: Reply) -> &Self {
        self.script(Method::POST, path, reply)
    }

    pub fn on_delete(&self, path: &str, reply: Reply) -> &Self {
        self.script(Method::DELETE, path, reply)
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.shared.requests).clone()
    }

    /// Requests received for one path.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_owned();
    let query: Vec<(String, String)> = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    lock(&shared.requests).push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query,
        cookie,
        body: serde_json::from_slice(&body).ok(),
    });

    let reply = lock(&shared.replies)
        .get_mut(&(method.clone(), path.clone()))
        .and_then(VecDeque::pop_front)
        .unwrap_or_else(|| Reply::default_for(&method, &path));

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}
