//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (catalog reachable)
//!
//! # Pages (edge guard applies)
//! GET  /                       - Landing page (plans)
//! GET  /login                  - Login page
//! GET  /signup                 - Signup page
//! GET  /dashboard              - Free dashboard
//! GET  /premium-dashboard      - Premium dashboard (re-verifies payment)
//! GET  /payment                - Payment page (pending premium signup only)
//! GET  /payment/complete       - Processor return URL
//!
//! # Auth API
//! POST /auth/signup            - Create account (plan-aware)
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//! GET  /session                - Session snapshot (identity, role, loading)
//!
//! # Catalog proxy
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart contents
//! POST /cart/add               - Add product (snapshot + quantity)
//! POST /cart/remove            - Remove product line
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge
//!
//! # Payments
//! POST /create-payment-intent  - Create intent (fixed server-side amount)
//! POST /verify-payment         - Verify + flip role (full handshake)
//! POST /verify-payment-status  - Read-only re-check of a stored intent
//! ```

pub mod auth;
pub mod cart;
pub mod pages;
pub mod payments;
pub mod products;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::middleware::edge_guard;
use crate::state::AppState;

/// Create the page routes router (edge guard applied).
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page))
        .route("/signup", get(pages::signup_page))
        .route("/dashboard", get(pages::dashboard))
        .route("/premium-dashboard", get(pages::premium_dashboard))
        .route("/payment", get(pages::payment_page))
        .route("/payment/complete", get(payments::payment_complete))
        .layer(axum_middleware::from_fn(edge_guard))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages (edge guard)
        .merge(page_routes())
        // Auth API
        .nest("/auth", auth_routes())
        .route("/session", get(auth::session_snapshot))
        // Catalog proxy
        .nest("/products", product_routes())
        // Cart
        .nest("/cart", cart_routes())
        // Payments
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        )
        .route("/verify-payment", post(payments::verify_payment))
        .route(
            "/verify-payment-status",
            post(payments::verify_payment_status),
        )
}
