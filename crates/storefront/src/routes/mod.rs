//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Products
//! GET  /products/:handle                - Product page (selection from query string)
//! POST /products/:handle/options        - Option change (form fragment + HX-Replace-Url)
//!
//! # Cart (HTMX fragments)
//! POST /cart/add                        - Add to cart (returns cart count, triggers cart-updated)
//! GET  /cart/count                      - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout                        - Redirect to Shopify checkout
//! GET  /checkout/express                - Redirect to Shop Pay for one variant
//! ```

pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{handle}", get(products::show))
        .route("/{handle}/options", post(products::change_option))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        // Checkout redirects
        .route("/checkout", get(cart::checkout))
        .route("/checkout/express", get(cart::express_checkout))
}
