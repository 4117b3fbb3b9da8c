//! Session middleware configuration.
//!
//! Sets up in-memory sessions with signed cookies using tower-sessions.
//! The session scope matches its contents: identity, cached role, cart, and
//! the pending-payment marker are all intentionally ephemeral.

use secrecy::ExposeSecret;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key, service::SignedCookie};

use crate::config::PortalConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Build the cookie signing key from the validated session secret.
///
/// Cookie keys need 64 bytes of material; the secret is validated to at
/// least 32 high-entropy characters and cycled up to the full width.
fn signing_key(config: &PortalConfig) -> Key {
    let secret = config.session_secret.expose_secret().as_bytes();
    let mut material = [0u8; 64];
    for (dst, src) in material.iter_mut().zip(secret.iter().cycle()) {
        *dst = *src;
    }
    Key::from(&material)
}

/// Create the session layer with an in-memory store and signed cookies.
#[must_use]
pub fn create_session_layer(
    config: &PortalConfig,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    let store = MemoryStore::default();

    let key = signing_key(config);

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}
