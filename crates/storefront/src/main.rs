//! `savvy` - SalesSavvy storefront from the command line.
//!
//! # Usage
//!
//! ```bash
//! # List the default category with cart and wishlist counts
//! savvy browse
//!
//! # List another category
//! savvy browse --category Electronics
//!
//! # Add product 42 to the cart
//! savvy add-to-cart 42
//!
//! # Show the wishlist, then move an item into the cart
//! savvy wishlist
//! savvy move-to-cart 42
//! ```
//!
//! Every command starts a fresh session: the catalog load identifies the
//! visitor and fills the header counts before the command runs. The session
//! credential comes from `SAVVY_AUTH_TOKEN`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use savvy_core::ProductId;
use savvy_storefront::config::StorefrontConfig;
use savvy_storefront::display::format_price;
use savvy_storefront::error::{AppError, Result};
use savvy_storefront::session::Storefront;
use savvy_storefront::store::MutationOutcome;

#[derive(Parser)]
#[command(name = "savvy")]
#[command(author, version, about = "SalesSavvy storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the products in a category
    Browse {
        /// Category to list (default: `SAVVY_DEFAULT_CATEGORY`)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a product to the cart
    AddToCart {
        /// Product ID
        product_id: ProductId,

        /// Category to list afterwards
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a product to the wishlist
    AddToWishlist {
        /// Product ID
        product_id: ProductId,

        /// Category to list afterwards
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List the wishlist
    Wishlist,
    /// Remove a product from the wishlist
    RemoveFromWishlist {
        /// Product ID
        product_id: ProductId,
    },
    /// Move a wishlist product into the cart
    MoveToCart {
        /// Product ID
        product_id: ProductId,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report_startup_error(&AppError::from(e));
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "savvy_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Tracing is not installed yet when configuration fails, so write directly.
#[allow(clippy::print_stderr)]
fn report_startup_error(error: &AppError) {
    eprintln!("{error}");
}

async fn run(command: Commands, config: &StorefrontConfig) -> Result<()> {
    let storefront = Storefront::from_config(config)?;
    let placeholder = config.placeholder_image_url.as_str();

    match command {
        Commands::Browse { category } => {
            open(&storefront, category.as_deref()).await;
            print_catalog(&storefront, placeholder);
        }
        Commands::AddToCart {
            product_id,
            category,
        } => {
            open(&storefront, category.as_deref()).await;
            let outcome = storefront.add_to_cart(product_id).await;
            print_catalog(&storefront, placeholder);
            report("add to cart", product_id, outcome)?;
        }
        Commands::AddToWishlist {
            product_id,
            category,
        } => {
            open(&storefront, category.as_deref()).await;
            let outcome = storefront.add_to_wishlist(product_id).await;
            print_catalog(&storefront, placeholder);
            report("add to wishlist", product_id, outcome)?;
        }
        Commands::Wishlist => {
            storefront.bootstrap().await;
            storefront.load_wishlist().await;
            print_wishlist(&storefront, placeholder);
        }
        Commands::RemoveFromWishlist { product_id } => {
            storefront.bootstrap().await;
            storefront.load_wishlist().await;
            let outcome = storefront.remove_from_wishlist(product_id).await;
            print_wishlist(&storefront, placeholder);
            report("remove from wishlist", product_id, outcome)?;
        }
        Commands::MoveToCart { product_id } => {
            storefront.bootstrap().await;
            storefront.load_wishlist().await;
            let outcome = storefront.move_to_cart(product_id).await;
            print_wishlist(&storefront, placeholder);
            report("move to cart", product_id, outcome)?;
        }
    }
    Ok(())
}

/// Start the session on the requested category, or the default one.
async fn open(storefront: &Storefront, category: Option<&str>) {
    match category {
        Some(category) => storefront.select_category(category).await,
        None => storefront.bootstrap().await,
    };
}

/// Print the outcome of a write. Only a missing sign-in is an error.
#[allow(clippy::print_stdout)]
fn report(action: &str, product_id: ProductId, outcome: MutationOutcome) -> Result<()> {
    match outcome {
        MutationOutcome::Confirmed => println!("Done: {action} #{product_id}"),
        MutationOutcome::Rejected(status) => {
            println!("Not done: {action} #{product_id} (backend answered {status})");
        }
        MutationOutcome::Failed => println!("Not done: {action} #{product_id} (request failed)"),
        MutationOutcome::Unsupported => println!("Not done: {action} is not supported"),
        MutationOutcome::NotSignedIn => return Err(AppError::NotSignedIn(action.to_string())),
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_catalog(storefront: &Storefront, placeholder: &str) {
    println!("{}", storefront.header());
    println!("Category: {}", storefront.category());

    let products = storefront.products();
    if products.is_empty() {
        println!("  No products found.");
    }
    for product in &products {
        println!(
            "  #{:<6} {:<32} {:>12}  {}",
            product.id,
            product.name,
            format_price(&product.price),
            product.image_or(placeholder)
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_wishlist(storefront: &Storefront, placeholder: &str) {
    println!("{}", storefront.header());
    println!("Wishlist:");

    let items = storefront.wishlist_items();
    if items.is_empty() {
        println!("  Your wishlist is empty.");
    }
    for item in &items {
        println!(
            "  #{:<6} {:<32} {:>12}  {}",
            item.product_id(),
            item.product.name,
            format_price(&item.product.price),
            item.product.image_or(placeholder)
        );
    }
}
