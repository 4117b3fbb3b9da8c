//! Cache types for catalog API responses.

use std::sync::Arc;

use super::Product;

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}
