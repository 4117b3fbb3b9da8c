//! Product route handlers.
//!
//! Thin proxy over the commerce catalog. The catalog credentials never
//! leave the server; clients only ever see this surface.

use axum::{
    Json,
    extract::{Path, State},
};

use reseller_core::ProductId;

use crate::catalog::Product;
use crate::error::Result;
use crate::state::AppState;

/// List all products.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_products().await?;
    Ok(Json(products.as_ref().clone()))
}

/// Get a single product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>> {
    let product = state.catalog().get_product(ProductId::new(id)).await?;
    Ok(Json(product))
}
