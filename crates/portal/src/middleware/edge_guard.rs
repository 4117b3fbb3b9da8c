//! Edge guard middleware.
//!
//! Runs before any page handler. At this boundary the only authentication
//! signal is the signed session cookie - no role information exists yet.
//! Public pages pass through untouched; protected pages without a session
//! redirect to login with the original path preserved as `from`; protected
//! pages with a session pass through with a bearer header derived from the
//! session's token, so downstream calls can act on the user's behalf.

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::guard::{self, EdgeDecision};
use crate::models::{CurrentUser, session_keys};

/// Middleware applying the edge guard to page routes.
pub async fn edge_guard(session: Session, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    // Identity (never role) derived from the signed cookie.
    let user: Option<CurrentUser> = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    match guard::edge_decision(&path, user.is_some()) {
        EdgeDecision::Allow => next.run(request).await,
        EdgeDecision::RedirectToLogin(target) => Redirect::to(&target).into_response(),
        EdgeDecision::Authorize => {
            if let Some(user) = user
                && let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", user.token))
            {
                request.headers_mut().insert(header::AUTHORIZATION, value);
            }
            next.run(request).await
        }
    }
}
