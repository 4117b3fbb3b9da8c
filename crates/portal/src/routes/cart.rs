//! Cart route handlers.
//!
//! The cart lives in the session; every mutation loads it, applies one
//! operation, and stores it back. Adding a line snapshots the product from
//! the catalog at that moment.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reseller_core::ProductId;

use crate::error::Result;
use crate::models::{Cart, CartItem};
use crate::session_store::AuthSession;
use crate::state::AppState;

/// Cart contents as reported to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    /// Derived on read, never stored.
    pub total: Decimal,
    pub count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().into_iter().cloned().collect(),
            total: cart.total(),
            count: cart.count(),
        }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

/// Remove-from-cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Show the cart.
pub async fn show(auth_session: AuthSession) -> Result<Json<CartView>> {
    let cart = auth_session.cart().await;
    Ok(Json(CartView::from(&cart)))
}

/// Add a product to the cart.
///
/// Snapshots the product from the catalog; an existing line's quantity is
/// incremented instead.
pub async fn add(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = state.catalog().get_product(request.product_id).await?;

    let mut cart = auth_session.cart().await;
    cart.add(CartItem::from_product(&product));
    auth_session.set_cart(&cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Remove a product's line from the cart. No-op if absent.
pub async fn remove(
    auth_session: AuthSession,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = auth_session.cart().await;
    cart.remove(request.product_id);
    auth_session.set_cart(&cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
pub async fn clear(auth_session: AuthSession) -> Result<Json<CartView>> {
    let mut cart = auth_session.cart().await;
    cart.clear();
    auth_session.set_cart(&cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Cart item count (for the nav badge).
pub async fn count(auth_session: AuthSession) -> Result<Json<serde_json::Value>> {
    let cart = auth_session.cart().await;
    Ok(Json(serde_json::json!({ "count": cart.count() })))
}
