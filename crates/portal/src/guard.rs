//! Route guard decision logic.
//!
//! The same decision table runs at two trust boundaries:
//!
//! - the edge guard ([`edge_decision`]) runs before any page handler, sees
//!   only whether a signed session cookie is present, and never knows the
//!   user's role;
//! - the client guard ([`client_decision`]) runs once the session's role has
//!   resolved and routes authenticated users to the dashboard they belong on.
//!
//! Both are pure functions; the handlers and middleware own the side effects
//! (issuing the redirect, marking the fire-once gate).
//!
//! Redirect precedence on public paths: an explicit `from` query parameter
//! naming one of the two dashboards always wins over the role-derived
//! target. The named dashboard re-evaluates the guard on entry, so a user
//! sent to a dashboard they are not entitled to gets bounced there, and the
//! fire-once gate keeps the pair of redirects from looping.

use serde::{Deserialize, Serialize};

use reseller_core::Role;

/// Dashboard for free-plan users.
pub const DASHBOARD: &str = "/dashboard";

/// Dashboard for premium users.
pub const PREMIUM_DASHBOARD: &str = "/premium-dashboard";

/// Paths reachable without authentication.
const PUBLIC_PATHS: &[&str] = &["/", "/login", "/signup"];

/// Browser-navigated page paths (as opposed to the JSON API surface).
/// Unauthenticated access to a protected page redirects; unauthenticated
/// API access gets a 401 instead.
const PAGE_PATHS: &[&str] = &[
    "/",
    "/login",
    "/signup",
    "/dashboard",
    "/premium-dashboard",
    "/payment",
    "/payment/complete",
];

/// Whether a path is public (no authentication required).
#[must_use]
pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Whether a path is a browser-navigated page.
#[must_use]
pub fn is_page(path: &str) -> bool {
    PAGE_PATHS.contains(&path)
}

/// Whether a path is one of the two dashboard paths.
#[must_use]
pub fn is_dashboard(path: &str) -> bool {
    path == DASHBOARD || path == PREMIUM_DASHBOARD
}

/// Build the login redirect for a protected path, preserving it as `from`.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    format!("/login?from={}", urlencoding::encode(path))
}

// =============================================================================
// Edge guard
// =============================================================================

/// Decision made by the edge guard, before any page content is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    /// Public path: pass through untouched.
    Allow,
    /// Protected path with a session: pass through and forward the bearer
    /// token derived from the session.
    Authorize,
    /// Protected path without a session: redirect to login.
    RedirectToLogin(String),
}

/// Evaluate the edge guard for a request path.
///
/// `has_session` is the only authentication signal available at this
/// boundary - a validly signed session cookie. Role is unknown here.
#[must_use]
pub fn edge_decision(path: &str, has_session: bool) -> EdgeDecision {
    if is_public(path) {
        return EdgeDecision::Allow;
    }

    if has_session {
        EdgeDecision::Authorize
    } else {
        EdgeDecision::RedirectToLogin(login_redirect(path))
    }
}

// =============================================================================
// Client guard
// =============================================================================

/// The session as the client guard sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    /// Identity/role resolution still in flight; never redirect yet.
    Unknown,
    /// No authenticated identity.
    Anonymous,
    /// Authenticated identity with a resolved role.
    Authenticated { role: Role },
}

/// Evaluate the client guard once the session has resolved.
///
/// Returns the redirect target, or `None` when the current path is allowed
/// to render. `from` is the raw `from` query parameter, if any.
#[must_use]
pub fn client_decision(path: &str, from: Option<&str>, session: &SessionView) -> Option<String> {
    match session {
        SessionView::Unknown => None,
        SessionView::Anonymous => {
            if is_public(path) {
                None
            } else {
                Some(login_redirect(path))
            }
        }
        SessionView::Authenticated { role } => {
            if is_public(path) {
                // An explicit dashboard deep-link wins over the role-derived
                // target; the destination's own guard bounces a mismatch.
                let target = match from {
                    Some(f) if is_dashboard(f) => f.to_string(),
                    _ => role.dashboard_path().to_string(),
                };
                return Some(target);
            }

            if path == DASHBOARD && role.is_premium() {
                return Some(PREMIUM_DASHBOARD.to_string());
            }

            if path == PREMIUM_DASHBOARD && !role.is_premium() {
                return Some(DASHBOARD.to_string());
            }

            None
        }
    }
}

// =============================================================================
// Fire-once gate
// =============================================================================

/// Guard flag ensuring at most one client-guard redirect per resolved
/// session.
///
/// Stored in the session and reset on every auth-state change, so a fresh
/// sign-in gets a fresh redirect budget. Prevents redirect loops while the
/// target computation is itself mid-flight.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedirectGate {
    fired: bool,
}

impl RedirectGate {
    /// Attempt to fire the gate. Returns `true` the first time only.
    pub const fn try_fire(&mut self) -> bool {
        if self.fired {
            false
        } else {
            self.fired = true;
            true
        }
    }

    /// Whether the gate has already fired.
    #[must_use]
    pub const fn has_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_path_classification() {
        assert!(is_public("/"));
        assert!(is_public("/login"));
        assert!(is_public("/signup"));
        assert!(!is_public("/dashboard"));
        assert!(!is_public("/premium-dashboard"));
        assert!(!is_public("/payment"));
    }

    #[test]
    fn test_edge_allows_public_paths_without_session() {
        assert_eq!(edge_decision("/", false), EdgeDecision::Allow);
        assert_eq!(edge_decision("/login", false), EdgeDecision::Allow);
        assert_eq!(edge_decision("/signup", true), EdgeDecision::Allow);
    }

    #[test]
    fn test_edge_redirects_protected_without_session() {
        assert_eq!(
            edge_decision("/dashboard", false),
            EdgeDecision::RedirectToLogin("/login?from=%2Fdashboard".to_string())
        );
        assert_eq!(
            edge_decision("/premium-dashboard", false),
            EdgeDecision::RedirectToLogin("/login?from=%2Fpremium-dashboard".to_string())
        );
    }

    #[test]
    fn test_edge_authorizes_protected_with_session() {
        assert_eq!(edge_decision("/dashboard", true), EdgeDecision::Authorize);
        assert_eq!(edge_decision("/payment", true), EdgeDecision::Authorize);
    }

    #[test]
    fn test_client_never_redirects_while_unknown() {
        assert_eq!(
            client_decision("/dashboard", None, &SessionView::Unknown),
            None
        );
        assert_eq!(
            client_decision("/premium-dashboard", None, &SessionView::Unknown),
            None
        );
    }

    #[test]
    fn test_client_anonymous_on_protected_path() {
        let target = client_decision("/dashboard", None, &SessionView::Anonymous);
        assert_eq!(target.as_deref(), Some("/login?from=%2Fdashboard"));
    }

    #[test]
    fn test_client_anonymous_on_public_path() {
        assert_eq!(client_decision("/", None, &SessionView::Anonymous), None);
        assert_eq!(
            client_decision("/login", None, &SessionView::Anonymous),
            None
        );
    }

    #[test]
    fn test_client_authenticated_on_public_path_uses_role_target() {
        let free = SessionView::Authenticated { role: Role::Free };
        let premium = SessionView::Authenticated {
            role: Role::Premium,
        };

        assert_eq!(
            client_decision("/", None, &free).as_deref(),
            Some("/dashboard")
        );
        assert_eq!(
            client_decision("/login", None, &premium).as_deref(),
            Some("/premium-dashboard")
        );
    }

    #[test]
    fn test_client_from_param_wins_over_role_target() {
        // Explicit deep-link beats the role-derived target, even when the
        // role doesn't match the named dashboard.
        let free = SessionView::Authenticated { role: Role::Free };
        assert_eq!(
            client_decision("/login", Some("/premium-dashboard"), &free).as_deref(),
            Some("/premium-dashboard")
        );
    }

    #[test]
    fn test_client_from_param_ignored_when_not_a_dashboard() {
        let free = SessionView::Authenticated { role: Role::Free };
        assert_eq!(
            client_decision("/login", Some("/payment"), &free).as_deref(),
            Some("/dashboard")
        );
        assert_eq!(
            client_decision("/login", Some("https://evil.test/"), &free).as_deref(),
            Some("/dashboard")
        );
    }

    #[test]
    fn test_client_premium_bounced_off_free_dashboard() {
        let premium = SessionView::Authenticated {
            role: Role::Premium,
        };
        assert_eq!(
            client_decision("/dashboard", None, &premium).as_deref(),
            Some("/premium-dashboard")
        );
    }

    #[test]
    fn test_client_free_bounced_off_premium_dashboard() {
        let free = SessionView::Authenticated { role: Role::Free };
        assert_eq!(
            client_decision("/premium-dashboard", None, &free).as_deref(),
            Some("/dashboard")
        );
    }

    #[test]
    fn test_client_matching_dashboard_is_allowed() {
        let free = SessionView::Authenticated { role: Role::Free };
        let premium = SessionView::Authenticated {
            role: Role::Premium,
        };
        assert_eq!(client_decision("/dashboard", None, &free), None);
        assert_eq!(client_decision("/premium-dashboard", None, &premium), None);
    }

    #[test]
    fn test_redirect_gate_fires_once() {
        let mut gate = RedirectGate::default();
        assert!(!gate.has_fired());
        assert!(gate.try_fire());
        assert!(!gate.try_fire());
        assert!(!gate.try_fire());
        assert!(gate.has_fired());
    }
}
