//! Commerce catalog API client.
//!
//! Read-only proxy over the commerce platform's REST catalog. Requests are
//! authenticated with Basic auth built from the consumer key/secret pair,
//! which is why every catalog read goes through this server instead of the
//! browser. Responses are cached with `moka` (5-minute TTL).

mod cache;

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use moka::future::Cache;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use reseller_core::ProductId;

use crate::config::CatalogConfig;
use cache::CacheValue;

/// Cache TTL for catalog responses.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with an unexpected status.
    #[error("catalog returned {0}")]
    Status(StatusCode),

    /// Product not found.
    #[error("product not found: {0}")]
    NotFound(ProductId),
}

/// A catalog product, proxied to the client minus credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
}

/// A product image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// A product attribute (e.g. size, colour) with its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// The catalog sends prices as strings and leaves them empty for products
/// without a standalone price.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    raw.parse().map_err(serde::de::Error::custom)
}

/// Client for the commerce catalog API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    api_url: String,
    auth_header: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog API client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        let credentials = format!(
            "{}:{}",
            config.consumer_key,
            config.consumer_secret.expose_secret()
        );
        let auth_header = format!("Basic {}", BASE64.encode(credentials));

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_string(),
                auth_header,
                cache,
            }),
        }
    }

    /// List all catalog products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        let cache_key = "products".to_string();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let response = self
            .inner
            .client
            .get(format!("{}/products", self.inner.api_url))
            .header(reqwest::header::AUTHORIZATION, &self.inner.auth_header)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }

        let products: Arc<Vec<Product>> = Arc::new(response.json().await?);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the catalog has no such product,
    /// or another `CatalogError` if the request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response = self
            .inner
            .client
            .get(format!("{}/products/{id}", self.inner.api_url))
            .header(reqwest::header::AUTHORIZATION, &self.inner.auth_header)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id));
        }

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }

        let product: Product = response.json().await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_parses_catalog_payload() {
        let json = r#"{
            "id": 1123,
            "name": "Pro Training Jersey",
            "price": "49.99",
            "description": "<p>Lightweight training jersey.</p>",
            "images": [
                {"src": "https://store.test/wp-content/jersey.jpg", "alt": "Jersey"}
            ],
            "attributes": [
                {"name": "Size", "options": ["S", "M", "L", "XL"]}
            ],
            "stock_status": "instock"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(1123));
        assert_eq!(product.price, Decimal::new(4999, 2));
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.attributes[0].options.len(), 4);
    }

    #[test]
    fn test_product_empty_price_is_zero() {
        let json = r#"{"id": 7, "name": "Variable product", "price": ""}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Decimal::ZERO);
    }

    #[test]
    fn test_price_serializes_as_string() {
        let product = Product {
            id: ProductId::new(1),
            name: "Jersey".to_string(),
            price: Decimal::new(4999, 2),
            description: String::new(),
            images: vec![],
            attributes: vec![],
        };

        let out = serde_json::to_value(&product).unwrap();
        assert_eq!(out["price"], "49.99");
    }
}
