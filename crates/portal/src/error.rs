//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`. Every error response is a JSON body of the shape
//! `{"error": "..."}` with a non-2xx status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::directory::DirectoryError;
use crate::identity::IdentityError;
use crate::payments::PaymentsError;
use crate::services::auth::AuthError;
use crate::services::verification::Rejection;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Document store operation failed.
    #[error("Document store error: {0}")]
    Directory(#[from] DirectoryError),

    /// Catalog API operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Payment processor operation failed.
    #[error("Payments error: {0}")]
    Payments(#[from] PaymentsError),

    /// Payment verification rejected.
    #[error("{0}")]
    Verification(#[from] Rejection),

    /// Session read/write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error should be captured to Sentry.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Directory(_)
                | Self::Catalog(_)
                | Self::Payments(_)
                | Self::Session(_)
                | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Auth(err) => match err {
                AuthError::Identity(IdentityError::EmailExists) => StatusCode::CONFLICT,
                AuthError::Identity(IdentityError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
                AuthError::Identity(IdentityError::AccountDisabled) => StatusCode::FORBIDDEN,
                AuthError::Identity(_) => StatusCode::BAD_GATEWAY,
                AuthError::Directory(_) => StatusCode::BAD_GATEWAY,
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch => StatusCode::BAD_REQUEST,
            },
            Self::Directory(_) | Self::Catalog(CatalogError::Http(_) | CatalogError::Status(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Payments(_) => StatusCode::BAD_GATEWAY,
            Self::Verification(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Auth(err) => match err {
                AuthError::Identity(provider) => match provider {
                    IdentityError::EmailExists
                    | IdentityError::InvalidCredentials
                    | IdentityError::AccountDisabled => provider.to_string(),
                    _ => "Authentication service unavailable".to_string(),
                },
                AuthError::Directory(_) => "Account service unavailable".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::PasswordMismatch => "Passwords don't match".to_string(),
            },
            Self::Directory(_) => "Account service unavailable".to_string(),
            Self::Catalog(CatalogError::NotFound(id)) => format!("Product not found: {id}"),
            Self::Catalog(_) => "Failed to fetch products".to_string(),
            Self::Payments(_) => "Payment processor error".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Verification(rejection) => rejection.to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::Identity(
                IdentityError::EmailExists
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::Identity(
                IdentityError::InvalidCredentials
            ))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::PasswordMismatch)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_verification_rejection_is_bad_request() {
        let err = AppError::Verification(Rejection::ClientSecretMismatch);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let err = AppError::Verification(Rejection::AmountMismatch {
            expected: 4999,
            received: 5000,
        });
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(
            body["error"],
            "Invalid payment amount. Expected 4999, received 5000"
        );
    }
}
