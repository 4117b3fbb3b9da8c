//! Payment route handlers.
//!
//! The three verification endpoints plus the processor's return URL. Wire
//! field names follow the processor's redirect parameters
//! (`payment_intent`, `payment_intent_client_secret`, `redirect_status`)
//! and the client's `paymentIntentId` for status re-checks.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{PREMIUM_PLAN_AMOUNT_MINOR, PREMIUM_PLAN_CURRENCY};
use crate::error::{AppError, Result};
use crate::guard;
use crate::middleware::RequireUser;
use crate::services::verification::{VerificationService, check_stored_intent};
use crate::session_store::AuthSession;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Create-intent request body.
///
/// Amount and currency are accepted for wire compatibility and ignored: the
/// intent is always created for the fixed premium price.
#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Create-intent response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub id: String,
    pub client_secret: String,
}

/// Verify-payment request body (the processor's redirect parameters).
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub payment_intent: String,
    pub payment_intent_client_secret: String,
    #[serde(default)]
    pub redirect_status: Option<String>,
}

/// Verify-payment-status request body.
#[derive(Debug, Deserialize)]
pub struct VerifyStatusRequest {
    #[serde(rename = "paymentIntentId")]
    pub payment_intent_id: String,
}

/// Query parameters on the processor's return URL.
#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub payment_intent_client_secret: Option<String>,
    #[serde(default)]
    pub redirect_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Verified {
    verified: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a payment intent for the premium upgrade.
///
/// The amount is the server-side constant; a client-supplied amount is
/// never honored.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>> {
    if let Some(amount) = request.amount
        && amount != PREMIUM_PLAN_AMOUNT_MINOR
    {
        warn!(
            uid = %user.uid,
            requested = amount,
            "client requested a non-standard amount, ignoring"
        );
    }

    let intent = state
        .payments()
        .create_intent(PREMIUM_PLAN_AMOUNT_MINOR, PREMIUM_PLAN_CURRENCY)
        .await?;

    let client_secret = intent
        .client_secret
        .ok_or(crate::payments::PaymentsError::MissingClientSecret)?;

    Ok(Json(CreateIntentResponse {
        id: intent.id,
        client_secret,
    }))
}

/// Verify a completed payment and flip the user to premium.
///
/// Runs the full handshake: processor re-fetch, secret/status/amount
/// checks, record flip, read-after-write assertion. Safe to re-run for the
/// same intent.
pub async fn verify_payment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    auth_session: AuthSession,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<Verified>> {
    let service = VerificationService::new(state.payments(), state.directory());
    service
        .verify_and_grant(
            &user.uid,
            &request.payment_intent,
            &request.payment_intent_client_secret,
            request.redirect_status.as_deref(),
        )
        .await?;

    auth_session.promote().await?;
    auth_session.clear_pending_plan().await?;

    Ok(Json(Verified { verified: true }))
}

/// Re-check a stored payment intent's status and amount.
///
/// Read-only: reports whether the payment still checks out, never writes
/// the user record.
pub async fn verify_payment_status(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Json(request): Json<VerifyStatusRequest>,
) -> Result<Json<Verified>> {
    if request.payment_intent_id.is_empty() {
        return Err(AppError::BadRequest(
            "No payment intent ID provided".to_string(),
        ));
    }

    let intent = state
        .payments()
        .retrieve_intent(&request.payment_intent_id)
        .await?;
    check_stored_intent(&intent, PREMIUM_PLAN_AMOUNT_MINOR)?;

    Ok(Json(Verified { verified: true }))
}

/// The processor's return URL after the hosted confirmation.
///
/// Drives the same handshake as `POST /verify-payment` and redirects the
/// browser: premium dashboard on success, home (with the rejection reason)
/// otherwise.
pub async fn payment_complete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    auth_session: AuthSession,
    Query(query): Query<ReturnQuery>,
) -> Result<Response> {
    let (Some(payment_intent), Some(client_secret), Some(redirect_status)) = (
        query.payment_intent,
        query.payment_intent_client_secret,
        query.redirect_status,
    ) else {
        warn!(uid = %user.uid, "payment return missing parameters");
        return Ok(Redirect::to("/").into_response());
    };

    let service = VerificationService::new(state.payments(), state.directory());
    match service
        .verify_and_grant(
            &user.uid,
            &payment_intent,
            &client_secret,
            Some(&redirect_status),
        )
        .await
    {
        Ok(()) => {
            auth_session.promote().await?;
            auth_session.clear_pending_plan().await?;
            info!(uid = %user.uid, "payment verified, unlocking premium");
            Ok(Redirect::to(guard::PREMIUM_DASHBOARD).into_response())
        }
        Err(AppError::Verification(rejection)) => {
            warn!(uid = %user.uid, reason = %rejection, "payment verification rejected");
            auth_session.clear_pending_plan().await?;
            let target = format!("/?error={}", urlencoding::encode(&rejection.to_string()));
            Ok(Redirect::to(&target).into_response())
        }
        Err(other) => Err(other),
    }
}
