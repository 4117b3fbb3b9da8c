//! Session-related types.
//!
//! Types stored in the session for authentication state. The session holds
//! the identity and bearer token; the role is cached separately because it
//! resolves later (and can be demoted for the session without touching the
//! identity).

use serde::{Deserialize, Serialize};

use reseller_core::{Role, Uid};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user. Holds
/// no role: the role is always re-derived from the user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity-provider user ID.
    pub uid: Uid,
    /// Email the session was established with.
    pub email: String,
    /// Short-lived bearer token issued by the identity provider.
    pub token: String,
}

/// The session as reported by `GET /session`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Option<Role>,
    /// Whether role resolution is still pending for this identity.
    pub loading: bool,
}

impl SessionSnapshot {
    /// Snapshot for an anonymous session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            authenticated: false,
            uid: None,
            email: None,
            role: None,
            loading: false,
        }
    }
}

/// Session keys for authentication and cart data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the role cached after resolution (cleared on auth changes).
    pub const ROLE: &str = "role";

    /// Key for the fire-once redirect gate.
    pub const REDIRECT_GATE: &str = "redirect_gate";

    /// Key for the plan selected at signup while payment is pending.
    pub const PENDING_PLAN: &str = "pending_plan";

    /// Key for the session cart.
    pub const CART: &str = "cart";
}
