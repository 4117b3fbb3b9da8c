//! Authentication route handlers.
//!
//! Signup, login, logout, and the session snapshot. Credentials are
//! exchanged with the identity provider; the session holds the resulting
//! identity and bearer token, and the role resolves from the document store
//! on first use.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use reseller_core::{Plan, Role};

use crate::directory::UserType;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::guard;
use crate::models::{CurrentUser, SessionSnapshot};
use crate::services::auth::{AuthService, SignupDetails};
use crate::session_store::AuthSession;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub selected_plan: Plan,
}

/// Signup response body.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub created: bool,
    /// Where the client should go next: the payment flow for a premium
    /// selection, the login page otherwise.
    pub next: &'static str,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub role: Role,
    /// Guard-computed destination for this session.
    pub redirect_to: String,
}

/// Query parameters carrying the originally requested path.
#[derive(Debug, Deserialize)]
pub struct FromQuery {
    pub from: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle signup.
///
/// Provisions the account with the identity provider and writes the user
/// record. The record always starts free; a premium selection establishes
/// the session and routes the client into the payment flow.
pub async fn signup(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SignupResponse>> {
    let selected_plan = request.selected_plan;

    let service = AuthService::new(state.identity(), state.directory());
    let identity = service
        .signup(SignupDetails {
            email: request.email,
            password: request.password,
            password_confirm: request.password_confirm,
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            user_type: request.user_type,
            company_name: request.company_name,
            selected_plan,
        })
        .await?;

    if selected_plan.requires_payment() {
        // Keep the fresh session alive for the payment flow.
        let user = CurrentUser {
            uid: identity.uid,
            email: identity.email,
            token: identity.id_token,
        };
        auth_session.sign_in(&user).await?;
        auth_session.set_pending_plan(Plan::Premium).await?;
        set_sentry_user(&user.uid, Some(&user.email));

        Ok(Json(SignupResponse {
            created: true,
            next: "/payment",
        }))
    } else {
        // Free accounts log in explicitly; no session yet.
        Ok(Json(SignupResponse {
            created: true,
            next: "/login",
        }))
    }
}

/// Handle login.
///
/// Establishes the session, resolves the role (bounded retries, fail-safe
/// free), and reports the guard-computed destination. An explicit dashboard
/// `from` parameter wins over the role-derived target.
pub async fn login(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Query(query): Query<FromQuery>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let service = AuthService::new(state.identity(), state.directory());
    let identity = service.login(&request.email, &request.password).await?;

    let user = CurrentUser {
        uid: identity.uid,
        email: identity.email,
        token: identity.id_token,
    };
    auth_session.sign_in(&user).await?;
    set_sentry_user(&user.uid, Some(&user.email));

    let view = auth_session.view(state.directory()).await?;
    let role = match &view {
        guard::SessionView::Authenticated { role } => *role,
        _ => Role::Free,
    };

    let redirect_to = guard::client_decision("/login", query.from.as_deref(), &view)
        .unwrap_or_else(|| role.dashboard_path().to_string());
    auth_session.redirect_once().await?;

    Ok(Json(LoginResponse { role, redirect_to }))
}

/// Handle logout.
pub async fn logout(auth_session: AuthSession) -> Result<Json<serde_json::Value>> {
    auth_session.sign_out().await?;
    clear_sentry_user();
    Ok(Json(serde_json::json!({ "signed_out": true })))
}

/// Report the session snapshot.
///
/// Resolves the role on first call after an auth change; consumers must not
/// act on role-gated state while `loading` is true.
pub async fn session_snapshot(
    State(state): State<AppState>,
    auth_session: AuthSession,
) -> Result<Json<SessionSnapshot>> {
    let snapshot = auth_session.snapshot(state.directory()).await?;
    Ok(Json(snapshot))
}
