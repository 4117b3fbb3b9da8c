//! Integration tests for the reseller portal.
//!
//! These tests drive the full router (session layer included) through
//! `tower::ServiceExt::oneshot` without any external services: the
//! configured collaborator endpoints point at unroutable addresses, so only
//! paths that never leave the process are exercised here (guard decisions,
//! session snapshots, cart lifecycle, auth rejections).
//!
//! # Test Categories
//!
//! - `guard_redirects` - Edge guard behavior over the page routes
//! - `session_api` - Session snapshot, cart lifecycle, auth rejections

use axum::Router;
use secrecy::SecretString;

use reseller_portal::config::{
    CatalogConfig, DirectoryConfig, IdentityConfig, PaymentsConfig, PortalConfig,
};
use reseller_portal::middleware::create_session_layer;
use reseller_portal::routes;
use reseller_portal::state::AppState;

/// A portal configuration whose collaborators are all unreachable.
///
/// Requests that would call out fail fast (connection refused) instead of
/// hanging, which keeps the failure-path tests honest.
#[must_use]
pub fn test_config() -> PortalConfig {
    PortalConfig {
        host: "127.0.0.1".parse().expect("valid addr"),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from(
            "kQ8vR2mXz5wB9tJ4nL7pD1fG6hS3aY0cE8uI5oK2rT7x".to_string(),
        ),
        identity: IdentityConfig {
            api_url: "http://127.0.0.1:9/identity".to_string(),
            api_key: SecretString::from("AIzaTestKey123"),
        },
        directory: DirectoryConfig {
            api_url: "http://127.0.0.1:9/records".to_string(),
            api_key: SecretString::from("dk_w8Qz3xV7pL2m"),
        },
        catalog: CatalogConfig {
            api_url: "http://127.0.0.1:9/wp-json/wc/v3".to_string(),
            consumer_key: "ck_test".to_string(),
            consumer_secret: SecretString::from("cs_w8Qz3xV7pL2m"),
        },
        payments: PaymentsConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            secret_key: SecretString::from("sk_w8Qz3xV7pL2m"),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Build the full application router against the test configuration.
#[must_use]
pub fn test_app() -> Router {
    let config = test_config();
    let state = AppState::new(config.clone());
    let session_layer = create_session_layer(&config);

    routes::routes().layer(session_layer).with_state(state)
}
