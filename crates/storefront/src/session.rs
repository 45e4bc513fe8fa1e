//! Storefront session orchestration.
//!
//! [`Storefront`] ties the catalog, the session identity, and the two count
//! stores together:
//!
//! 1. The first catalog response resolves the identity
//! 2. Resolving the identity refreshes both counts concurrently (or settles
//!    them for a guest)
//! 3. Writes need a signed-in visitor and refresh the affected count only
//!    when the backend confirms them
//!
//! Nothing here returns an error. Failures degrade locally (empty list,
//! unchanged count, error badge) and are logged.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use savvy_core::{Identity, Product, ProductId, Username, WishlistItem};

use crate::api::{ApiError, HttpStoreApi, Operation, StoreApi};
use crate::config::StorefrontConfig;
use crate::display::HeaderView;
use crate::error::add_breadcrumb;
use crate::identity::{IdentityResolver, Resolution};
use crate::store::{Cart, MutationOutcome, ResourceState, ResourceStore, ResourceView, Wishlist};

/// The products currently listed and the category they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub category: String,
    pub products: Vec<Product>,
}

/// One visitor's storefront session.
pub struct Storefront {
    api: Arc<dyn StoreApi>,
    default_category: String,
    identity: IdentityResolver,
    cart: ResourceStore<Cart>,
    wishlist: ResourceStore<Wishlist>,
    catalog: watch::Sender<Catalog>,
    wishlist_items: watch::Sender<Vec<WishlistItem>>,
}

impl Storefront {
    /// Create a session with unresolved identity and loading badges.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, default_category: impl Into<String>) -> Self {
        Self {
            cart: ResourceStore::new(Arc::clone(&api)),
            wishlist: ResourceStore::new(Arc::clone(&api)),
            api,
            default_category: default_category.into(),
            identity: IdentityResolver::new(),
            catalog: watch::channel(Catalog::default()).0,
            wishlist_items: watch::channel(Vec::new()).0,
        }
    }

    /// Create a session talking to the configured backend over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let api = HttpStoreApi::new(&config.api)?;
        Ok(Self::new(Arc::new(api), config.default_category.clone()))
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Load a category and return its products.
    ///
    /// A missing or blank category loads the default one. The first
    /// successful load resolves the session identity and then refreshes
    /// both counts. On failure the listing is emptied.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self, category: Option<&str>) -> Vec<Product> {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.default_category)
            .to_owned();

        let (products, resolution) = match self.api.catalog(&category).await {
            Ok(payload) => {
                let resolution = self.identity.resolve(payload.reported_name());
                (payload.into_products(), resolution)
            }
            Err(e) => {
                warn!(%category, error = %e, "Catalog load failed");
                (Vec::new(), Resolution::Unchanged)
            }
        };

        info!(%category, count = products.len(), "Catalog loaded");
        self.catalog.send_replace(Catalog {
            category,
            products: products.clone(),
        });

        if let Resolution::Resolved(identity) = resolution {
            self.sync_counts(identity).await;
        }
        products
    }

    /// Load the default category. This is the session's entry point.
    pub async fn bootstrap(&self) -> Vec<Product> {
        self.load_catalog(None).await
    }

    /// Switch to another category. Identity and counts are untouched.
    pub async fn select_category(&self, category: &str) -> Vec<Product> {
        add_breadcrumb("catalog", "Select category", Some(&[("category", category)]));
        self.load_catalog(Some(category)).await
    }

    async fn sync_counts(&self, identity: &Identity) {
        match identity.username() {
            Some(username) => {
                tokio::join!(self.cart.refresh(username), self.wishlist.refresh(username));
            }
            None => {
                self.cart.settle_anonymous();
                self.wishlist.settle_anonymous();
            }
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Add a product to the cart.
    pub async fn add_to_cart(&self, product_id: ProductId) -> MutationOutcome {
        let Some(username) = self.signed_in("add to cart") else {
            return MutationOutcome::NotSignedIn;
        };
        record_action("cart", "Add to cart", product_id);
        self.cart.mutate(username, product_id, Operation::Add).await
    }

    /// Add a product to the wishlist.
    pub async fn add_to_wishlist(&self, product_id: ProductId) -> MutationOutcome {
        let Some(username) = self.signed_in("add to wishlist") else {
            return MutationOutcome::NotSignedIn;
        };
        record_action("wishlist", "Add to wishlist", product_id);
        self.wishlist.mutate(username, product_id, Operation::Add).await
    }

    /// Remove a product from the wishlist.
    ///
    /// The item leaves the local list only once the backend confirms.
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> MutationOutcome {
        let Some(username) = self.signed_in("remove from wishlist") else {
            return MutationOutcome::NotSignedIn;
        };
        record_action("wishlist", "Remove from wishlist", product_id);
        self.wishlist
            .mutate_with(username, product_id, Operation::Remove, || {
                self.drop_wishlist_item(product_id);
            })
            .await
    }

    /// Move a wishlist product into the cart, then refresh the cart count.
    pub async fn move_to_cart(&self, product_id: ProductId) -> MutationOutcome {
        let Some(username) = self.signed_in("move to cart") else {
            return MutationOutcome::NotSignedIn;
        };
        record_action("wishlist", "Move to cart", product_id);
        let outcome = self
            .wishlist
            .mutate_with(username, product_id, Operation::MoveToCart, || {
                self.drop_wishlist_item(product_id);
            })
            .await;

        if outcome.is_confirmed() {
            self.cart.refresh(username).await;
        }
        outcome
    }

    fn signed_in(&self, action: &str) -> Option<&Username> {
        let username = self.identity.username();
        if username.is_none() {
            warn!(
                action,
                identity = ?self.identity.current(),
                "Ignoring write without a signed-in visitor"
            );
        }
        username
    }

    fn drop_wishlist_item(&self, product_id: ProductId) {
        self.wishlist_items.send_if_modified(|items| {
            let before = items.len();
            items.retain(|item| item.product_id() != product_id);
            items.len() != before
        });
    }

    // =========================================================================
    // Wishlist listing
    // =========================================================================

    /// Load the visitor's wishlist items. On failure the list is emptied.
    ///
    /// A username in the response resolves the identity if no catalog
    /// response has done so yet.
    #[instrument(skip(self))]
    pub async fn load_wishlist(&self) -> Vec<WishlistItem> {
        let (items, reported) = match self.api.wishlist_items().await {
            Ok(payload) => {
                let reported = payload.username.clone();
                (payload.into_items(), reported)
            }
            Err(e) => {
                warn!(error = %e, "Wishlist load failed");
                (Vec::new(), None)
            }
        };

        self.wishlist_items.send_replace(items.clone());

        if let Some(name) = reported.as_deref()
            && let Resolution::Resolved(identity) = self.identity.resolve(Some(name))
        {
            self.sync_counts(identity).await;
        }
        items
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// The session identity, once resolved.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.current()
    }

    #[must_use]
    pub fn cart(&self) -> ResourceState {
        self.cart.snapshot()
    }

    #[must_use]
    pub fn wishlist(&self) -> ResourceState {
        self.wishlist.snapshot()
    }

    #[must_use]
    pub fn subscribe_cart(&self) -> ResourceView {
        self.cart.subscribe()
    }

    #[must_use]
    pub fn subscribe_wishlist(&self) -> ResourceView {
        self.wishlist.subscribe()
    }

    /// Products of the last loaded category.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.catalog.borrow().products.clone()
    }

    /// The last loaded category; empty before the first load.
    #[must_use]
    pub fn category(&self) -> String {
        self.catalog.borrow().category.clone()
    }

    #[must_use]
    pub fn wishlist_items(&self) -> Vec<WishlistItem> {
        self.wishlist_items.borrow().clone()
    }

    #[must_use]
    pub fn header(&self) -> HeaderView {
        HeaderView::new(self.cart(), self.wishlist(), self.identity())
    }
}

fn record_action(category: &str, message: &str, product_id: ProductId) {
    let id = product_id.to_string();
    add_breadcrumb(category, message, Some(&[("product_id", id.as_str())]));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use tokio::sync::Notify;

    use savvy_core::Price;

    use super::*;
    use crate::api::fake::{Call, FakeApi, Reply};
    use crate::api::{CatalogPayload, ReportedUser, Resource, WishlistBody, WishlistPayload};

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::parse("10").unwrap(),
            image_url: None,
        }
    }

    fn catalog(user: Option<&str>, ids: &[i32]) -> Reply<CatalogPayload> {
        Reply::Ok(CatalogPayload {
            user: Some(ReportedUser {
                name: user.map(str::to_owned),
            }),
            products: Some(ids.iter().copied().map(product).collect()),
        })
    }

    fn wishlist(user: Option<&str>, ids: &[i32]) -> Reply<WishlistPayload> {
        Reply::Ok(WishlistPayload {
            wishlist: Some(WishlistBody {
                products: Some(ids.iter().copied().map(product).map(WishlistItem::from).collect()),
            }),
            username: user.map(str::to_owned),
        })
    }

    fn storefront(api: &Arc<FakeApi>) -> Storefront {
        Storefront::new(api.clone(), "Shirts")
    }

    fn item_ids(storefront: &Storefront) -> Vec<ProductId> {
        storefront
            .wishlist_items()
            .iter()
            .map(WishlistItem::product_id)
            .collect()
    }

    /// A session signed in as alice with both counts settled.
    async fn signed_in(api: &Arc<FakeApi>) -> Storefront {
        api.push_catalog(catalog(Some("alice"), &[1]));
        let storefront = storefront(api);
        storefront.bootstrap().await;
        storefront
    }

    #[tokio::test]
    async fn test_catalog_resolves_identity_and_refreshes_both_counts() {
        let api = FakeApi::new();
        api.push_catalog(catalog(Some("alice"), &[1]))
            .push_count(Resource::Cart, Reply::Ok(2))
            .push_count(Resource::Wishlist, Reply::Ok(1));
        let storefront = storefront(&api);

        let products = storefront.load_catalog(Some("Electronics")).await;

        assert_eq!(products.len(), 1);
        assert_eq!(storefront.category(), "Electronics");
        assert_eq!(storefront.identity().unwrap().display_name(), "alice");
        let calls = api.calls();
        assert_eq!(calls[0], Call::Catalog("Electronics".to_string()));
        assert!(calls.contains(&Call::Count(Resource::Cart, "alice".to_string())));
        assert!(calls.contains(&Call::Count(Resource::Wishlist, "alice".to_string())));
        assert_eq!(
            storefront.header().to_string(),
            "Wishlist (1) | Cart (2) | alice"
        );
    }

    #[tokio::test]
    async fn test_blank_category_loads_default() {
        let api = FakeApi::new();
        let storefront = storefront(&api);

        storefront.load_catalog(Some("   ")).await;
        storefront.bootstrap().await;

        assert_eq!(
            api.calls()[..1],
            [Call::Catalog("Shirts".to_string())]
        );
        assert_eq!(storefront.category(), "Shirts");
    }

    #[tokio::test]
    async fn test_guest_settles_badges_without_count_requests() {
        let api = FakeApi::new();
        api.push_catalog(catalog(None, &[1, 2]));
        let storefront = storefront(&api);

        storefront.bootstrap().await;

        assert_eq!(storefront.identity(), Some(&Identity::Guest));
        assert_eq!(
            storefront.header().to_string(),
            "Wishlist (0) | Cart (0) | Guest"
        );
        assert_eq!(api.calls(), vec![Call::Catalog("Shirts".to_string())]);
    }

    #[tokio::test]
    async fn test_writes_without_identity_make_no_calls() {
        let api = FakeApi::new();
        let storefront = storefront(&api);
        let id = ProductId::new(42);

        assert_eq!(storefront.add_to_cart(id).await, MutationOutcome::NotSignedIn);
        assert_eq!(storefront.add_to_wishlist(id).await, MutationOutcome::NotSignedIn);
        assert_eq!(
            storefront.remove_from_wishlist(id).await,
            MutationOutcome::NotSignedIn
        );
        assert_eq!(storefront.move_to_cart(id).await, MutationOutcome::NotSignedIn);

        assert!(api.calls().is_empty());
        assert!(storefront.cart().is_loading());
    }

    #[tokio::test]
    async fn test_guest_cannot_write() {
        let api = FakeApi::new();
        api.push_catalog(catalog(Some("Guest"), &[1]));
        let storefront = storefront(&api);
        storefront.bootstrap().await;

        let outcome = storefront.add_to_cart(ProductId::new(1)).await;

        assert_eq!(outcome, MutationOutcome::NotSignedIn);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_empties_listing_and_keeps_badges_loading() {
        let api = FakeApi::new();
        api.push_catalog(Reply::Status(StatusCode::INTERNAL_SERVER_ERROR))
            .push_catalog(catalog(Some("alice"), &[1, 2]))
            .push_catalog(Reply::Malformed);
        let storefront = storefront(&api);

        assert!(storefront.bootstrap().await.is_empty());
        assert!(storefront.identity().is_none());
        assert_eq!(storefront.header().to_string(), "Wishlist (...) | Cart (...) | ");

        // A retry resolves the identity.
        assert_eq!(storefront.select_category("Shoes").await.len(), 2);
        assert_eq!(storefront.header().username, "alice");

        // A later failure only empties the listing.
        assert!(storefront.select_category("Hats").await.is_empty());
        assert!(storefront.products().is_empty());
        assert_eq!(storefront.header().username, "alice");
    }

    #[tokio::test]
    async fn test_select_category_keeps_identity_and_counts() {
        let api = FakeApi::new();
        let storefront = signed_in(&api).await;
        api.push_catalog(catalog(Some("bob"), &[5, 6, 7]));

        let products = storefront.select_category("Shoes").await;

        assert_eq!(products.len(), 3);
        assert_eq!(storefront.identity().unwrap().display_name(), "alice");
        assert_eq!(api.count_calls(Resource::Cart), 1);
        assert_eq!(api.count_calls(Resource::Wishlist), 1);
    }

    #[tokio::test]
    async fn test_counts_refresh_concurrently() {
        let api = FakeApi::new();
        let gate = Arc::new(Notify::new());
        api.push_catalog(catalog(Some("alice"), &[1]))
            .push_count(
                Resource::Cart,
                Reply::Gated(Arc::clone(&gate), Box::new(Reply::Ok(4))),
            )
            .push_count(Resource::Wishlist, Reply::Ok(2));
        let storefront = storefront(&api);
        let mut wishlist = storefront.subscribe_wishlist();

        tokio::join!(storefront.bootstrap(), async {
            while wishlist.current().is_loading() {
                wishlist.changed().await.unwrap();
            }
            // The wishlist settled while the cart request is still open.
            assert!(storefront.cart().is_loading());
            gate.notify_one();
        });

        assert_eq!(storefront.cart().count(), 4);
        assert_eq!(storefront.wishlist().count(), 2);
    }

    #[tokio::test]
    async fn test_add_to_cart_refreshes_cart_only() {
        let api = FakeApi::new();
        let storefront = signed_in(&api).await;
        api.push_write(Reply::Ok(StatusCode::CREATED))
            .push_count(Resource::Cart, Reply::Ok(3));

        let outcome = storefront.add_to_cart(ProductId::new(1)).await;

        assert_eq!(outcome, MutationOutcome::Confirmed);
        assert_eq!(storefront.cart().count(), 3);
        assert_eq!(api.count_calls(Resource::Cart), 2);
        assert_eq!(api.count_calls(Resource::Wishlist), 1);
    }

    #[tokio::test]
    async fn test_rejected_add_keeps_count() {
        let api = FakeApi::new();
        api.push_count(Resource::Wishlist, Reply::Ok(5));
        let storefront = signed_in(&api).await;
        api.push_write(Reply::Ok(StatusCode::CONFLICT));

        let outcome = storefront.add_to_wishlist(ProductId::new(1)).await;

        assert_eq!(outcome, MutationOutcome::Rejected(StatusCode::CONFLICT));
        assert_eq!(storefront.wishlist().count(), 5);
        assert_eq!(api.count_calls(Resource::Wishlist), 1);
    }

    #[tokio::test]
    async fn test_remove_with_ok_status_keeps_item() {
        let api = FakeApi::new();
        let storefront = signed_in(&api).await;
        api.push_wishlist(wishlist(Some("alice"), &[42, 7]))
            .push_write(Reply::Ok(StatusCode::OK));
        storefront.load_wishlist().await;

        let outcome = storefront.remove_from_wishlist(ProductId::new(42)).await;

        assert_eq!(outcome, MutationOutcome::Rejected(StatusCode::OK));
        assert_eq!(item_ids(&storefront), vec![ProductId::new(42), ProductId::new(7)]);
        assert_eq!(api.count_calls(Resource::Wishlist), 1);
    }

    #[tokio::test]
    async fn test_remove_with_no_content_drops_item_and_refreshes() {
        let api = FakeApi::new();
        let storefront = signed_in(&api).await;
        api.push_wishlist(wishlist(Some("alice"), &[42, 7]))
            .push_write(Reply::Ok(StatusCode::NO_CONTENT))
            .push_count(Resource::Wishlist, Reply::Ok(1));
        storefront.load_wishlist().await;

        let outcome = storefront.remove_from_wishlist(ProductId::new(42)).await;

        assert!(outcome.is_confirmed());
        assert_eq!(item_ids(&storefront), vec![ProductId::new(7)]);
        assert_eq!(storefront.wishlist().count(), 1);
    }

    #[tokio::test]
    async fn test_move_to_cart_drops_item_without_refetch() {
        let api = FakeApi::new();
        let storefront = signed_in(&api).await;
        api.push_wishlist(wishlist(Some("alice"), &[42, 7]))
            .push_write(Reply::Ok(StatusCode::OK))
            .push_count(Resource::Wishlist, Reply::Ok(1))
            .push_count(Resource::Cart, Reply::Ok(1));
        storefront.load_wishlist().await;
        let before = api.calls().len();

        let outcome = storefront.move_to_cart(ProductId::new(42)).await;

        assert!(outcome.is_confirmed());
        assert_eq!(item_ids(&storefront), vec![ProductId::new(7)]);
        assert_eq!(
            api.calls()[before..],
            [
                Call::Write(
                    Resource::Wishlist,
                    Operation::MoveToCart,
                    "alice".to_string(),
                    ProductId::new(42)
                ),
                Call::Count(Resource::Wishlist, "alice".to_string()),
                Call::Count(Resource::Cart, "alice".to_string()),
            ]
        );
        assert_eq!(storefront.cart().count(), 1);
        assert_eq!(storefront.wishlist().count(), 1);
    }

    #[tokio::test]
    async fn test_move_to_cart_requires_ok_status() {
        let api = FakeApi::new();
        let storefront = signed_in(&api).await;
        api.push_wishlist(wishlist(None, &[42]))
            .push_write(Reply::Ok(StatusCode::CREATED));
        storefront.load_wishlist().await;

        let outcome = storefront.move_to_cart(ProductId::new(42)).await;

        assert_eq!(outcome, MutationOutcome::Rejected(StatusCode::CREATED));
        assert_eq!(item_ids(&storefront), vec![ProductId::new(42)]);
        assert_eq!(api.count_calls(Resource::Cart), 1);
    }

    #[tokio::test]
    async fn test_wishlist_failure_empties_list() {
        let api = FakeApi::new();
        let storefront = signed_in(&api).await;
        api.push_wishlist(wishlist(Some("alice"), &[1, 2]))
            .push_wishlist(Reply::Status(StatusCode::SERVICE_UNAVAILABLE))
            .push_wishlist(Reply::Malformed);

        assert_eq!(storefront.load_wishlist().await.len(), 2);
        assert!(storefront.load_wishlist().await.is_empty());
        assert!(storefront.wishlist_items().is_empty());
        assert!(storefront.load_wishlist().await.is_empty());
    }

    #[tokio::test]
    async fn test_wishlist_username_resolves_identity_before_catalog() {
        let api = FakeApi::new();
        api.push_wishlist(wishlist(Some("alice"), &[3]))
            .push_count(Resource::Cart, Reply::Ok(2))
            .push_count(Resource::Wishlist, Reply::Ok(1));
        let storefront = storefront(&api);

        storefront.load_wishlist().await;

        assert_eq!(storefront.identity().unwrap().display_name(), "alice");
        assert_eq!(storefront.header().to_string(), "Wishlist (1) | Cart (2) | alice");

        // The catalog no longer changes the identity.
        api.push_catalog(catalog(Some("bob"), &[1]));
        storefront.bootstrap().await;
        assert_eq!(storefront.identity().unwrap().display_name(), "alice");
        assert_eq!(api.count_calls(Resource::Cart), 1);
    }
}
