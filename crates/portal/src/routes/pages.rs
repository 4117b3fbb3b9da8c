//! Page route handlers.
//!
//! Each page evaluates the client guard once the session's role has
//! resolved, and either redirects (at most once per resolved session) or
//! returns the page payload. Layout and styling live in the front-end; the
//! payloads here carry only the data the pages render.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use reseller_core::Role;

use crate::config::{PREMIUM_PLAN_AMOUNT_MINOR, PREMIUM_PLAN_CURRENCY};
use crate::error::Result;
use crate::guard;
use crate::middleware::RequireUser;
use crate::routes::auth::FromQuery;
use crate::services::verification::{ReverifyOutcome, VerificationService};
use crate::session_store::AuthSession;
use crate::state::AppState;

// =============================================================================
// Page Payloads
// =============================================================================

/// A plan as shown on the landing page.
#[derive(Debug, Serialize)]
pub struct PlanCard {
    pub plan: &'static str,
    /// Monthly price in major units; free plans omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub currency: &'static str,
}

/// Landing page payload.
#[derive(Debug, Serialize)]
pub struct LandingPage {
    pub plans: Vec<PlanCard>,
}

/// Login page payload.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Signup page payload.
#[derive(Debug, Serialize)]
pub struct SignupPage {
    pub plans: Vec<PlanCard>,
}

/// Dashboard page payload.
#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub email: String,
    pub role: Role,
}

/// Payment page payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPage {
    /// Fixed premium price in minor units; informational only, the intent
    /// amount is set server-side regardless.
    pub amount: i64,
    pub currency: &'static str,
}

fn plan_cards() -> Vec<PlanCard> {
    vec![
        PlanCard {
            plan: "free",
            price: None,
            currency: PREMIUM_PLAN_CURRENCY,
        },
        PlanCard {
            plan: "premium",
            price: Some(Decimal::new(PREMIUM_PLAN_AMOUNT_MINOR, 2)),
            currency: PREMIUM_PLAN_CURRENCY,
        },
    ]
}

/// Evaluate the client guard for a page and issue at most one redirect per
/// resolved session.
async fn guarded_redirect(
    auth_session: &AuthSession,
    state: &AppState,
    path: &str,
    from: Option<&str>,
) -> Result<Option<Response>> {
    let view = auth_session.view(state.directory()).await?;

    if let Some(target) = guard::client_decision(path, from, &view)
        && auth_session.redirect_once().await?
    {
        return Ok(Some(Redirect::to(&target).into_response()));
    }

    Ok(None)
}

// =============================================================================
// Handlers
// =============================================================================

/// Landing page.
pub async fn home(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Query(query): Query<FromQuery>,
) -> Result<Response> {
    if let Some(redirect) =
        guarded_redirect(&auth_session, &state, "/", query.from.as_deref()).await?
    {
        return Ok(redirect);
    }

    Ok(Json(LandingPage {
        plans: plan_cards(),
    })
    .into_response())
}

/// Login page.
pub async fn login_page(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Query(query): Query<FromQuery>,
) -> Result<Response> {
    if let Some(redirect) =
        guarded_redirect(&auth_session, &state, "/login", query.from.as_deref()).await?
    {
        return Ok(redirect);
    }

    Ok(Json(LoginPage { from: query.from }).into_response())
}

/// Signup page.
pub async fn signup_page(
    State(state): State<AppState>,
    auth_session: AuthSession,
    Query(query): Query<FromQuery>,
) -> Result<Response> {
    if let Some(redirect) =
        guarded_redirect(&auth_session, &state, "/signup", query.from.as_deref()).await?
    {
        return Ok(redirect);
    }

    Ok(Json(SignupPage {
        plans: plan_cards(),
    })
    .into_response())
}

/// Free dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    auth_session: AuthSession,
) -> Result<Response> {
    if let Some(redirect) = guarded_redirect(&auth_session, &state, "/dashboard", None).await? {
        return Ok(redirect);
    }

    let role = auth_session
        .resolve_role(state.directory())
        .await?
        .unwrap_or_default();

    Ok(Json(DashboardPage {
        email: user.email,
        role,
    })
    .into_response())
}

/// Premium dashboard.
///
/// On top of the guard, entering here re-verifies the stored payment before
/// the page settles: a stale cached premium role (refund, record edit) is
/// demoted for this session and redirected out, without touching the stored
/// role.
pub async fn premium_dashboard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    auth_session: AuthSession,
) -> Result<Response> {
    if let Some(redirect) =
        guarded_redirect(&auth_session, &state, "/premium-dashboard", None).await?
    {
        return Ok(redirect);
    }

    let Some(record) = state.directory().get(&user.uid).await? else {
        warn!(uid = %user.uid, "no user record for premium session");
        auth_session.demote().await?;
        return Ok(Redirect::to(guard::DASHBOARD).into_response());
    };

    let service = VerificationService::new(state.payments(), state.directory());
    match service.reverify(&user.uid, &record).await {
        ReverifyOutcome::Confirmed => Ok(Json(DashboardPage {
            email: user.email,
            role: Role::Premium,
        })
        .into_response()),
        ReverifyOutcome::Demoted(reason) => {
            warn!(uid = %user.uid, %reason, "premium access demoted for session");
            auth_session.demote().await?;
            Ok(Redirect::to(guard::DASHBOARD).into_response())
        }
    }
}

/// Payment page.
///
/// Only reachable while a premium signup is pending in this session.
pub async fn payment_page(
    RequireUser(_user): RequireUser,
    auth_session: AuthSession,
) -> Result<Response> {
    let Some(plan) = auth_session.pending_plan().await else {
        return Ok(Redirect::to("/").into_response());
    };

    if !plan.requires_payment() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(Json(PaymentPage {
        amount: PREMIUM_PLAN_AMOUNT_MINOR,
        currency: PREMIUM_PLAN_CURRENCY,
    })
    .into_response())
}
