//! Identity provider client.
//!
//! Email/password sign-up and sign-in against the managed identity service's
//! REST surface. The provider owns credentials, account state, and token
//! issuance; this client only exchanges email+password for an identity and a
//! short-lived bearer token.
//!
//! Provider error codes are mapped to typed errors so route handlers can
//! surface recoverable authentication failures without leaking provider
//! internals.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use reseller_core::Uid;

use crate::config::IdentityConfig;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An account already exists for this email.
    #[error("an account with this email already exists")]
    EmailExists,

    /// Wrong email or password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account exists but has been disabled by an administrator.
    #[error("this account has been disabled")]
    AccountDisabled,

    /// The provider rejected the request with an unrecognized code.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// An authenticated identity returned by the provider.
///
/// The token is short-lived; it is stored in the session and forwarded as a
/// bearer header by the edge guard, never persisted anywhere else.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    /// Stable provider-assigned user ID.
    pub uid: Uid,
    /// Email the account was registered with.
    pub email: String,
    /// Short-lived bearer token for this session.
    pub id_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// Client for the managed identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a new identity provider client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        }
    }

    /// Create a new account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmailExists` if the email is already
    /// registered, or another `IdentityError` for provider failures.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, IdentityError> {
        self.token_request("accounts:signUp", email, password).await
    }

    /// Sign in to an existing account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` for a wrong email or
    /// password, `IdentityError::AccountDisabled` for a disabled account.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, IdentityError> {
        self.token_request("accounts:signInWithPassword", email, password)
            .await
    }

    async fn token_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, IdentityError> {
        let url = format!(
            "{}/{}?key={}",
            self.inner.api_url,
            endpoint,
            self.inner.api_key.expose_secret()
        );

        let response = self
            .inner
            .client
            .post(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let code = response
                .json::<ProviderErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(map_provider_code(&code));
        }

        let token: TokenResponse = response.json().await?;

        Ok(AuthenticatedIdentity {
            uid: Uid::new(token.local_id),
            email: token.email,
            id_token: token.id_token,
        })
    }
}

/// Map a provider error code to a typed error.
///
/// Codes sometimes carry a suffix (e.g. `TOO_MANY_ATTEMPTS_TRY_LATER : ...`),
/// so matching is on the leading token.
fn map_provider_code(code: &str) -> IdentityError {
    let token = code.split_whitespace().next().unwrap_or(code);
    match token {
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            IdentityError::InvalidCredentials
        }
        "USER_DISABLED" => IdentityError::AccountDisabled,
        _ => IdentityError::Provider(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_known_codes() {
        assert!(matches!(
            map_provider_code("EMAIL_EXISTS"),
            IdentityError::EmailExists
        ));
        assert!(matches!(
            map_provider_code("EMAIL_NOT_FOUND"),
            IdentityError::InvalidCredentials
        ));
        assert!(matches!(
            map_provider_code("INVALID_PASSWORD"),
            IdentityError::InvalidCredentials
        ));
        assert!(matches!(
            map_provider_code("INVALID_LOGIN_CREDENTIALS"),
            IdentityError::InvalidCredentials
        ));
        assert!(matches!(
            map_provider_code("USER_DISABLED"),
            IdentityError::AccountDisabled
        ));
    }

    #[test]
    fn test_map_code_with_suffix() {
        assert!(matches!(
            map_provider_code("USER_DISABLED : account frozen"),
            IdentityError::AccountDisabled
        ));
    }

    #[test]
    fn test_map_unknown_code() {
        let err = map_provider_code("TOO_MANY_ATTEMPTS_TRY_LATER");
        assert!(matches!(err, IdentityError::Provider(_)));
        assert_eq!(
            err.to_string(),
            "identity provider error: TOO_MANY_ATTEMPTS_TRY_LATER"
        );
    }

    #[test]
    fn test_token_response_parses_provider_payload() {
        let json = r#"{
            "kind": "identitytoolkit#SignupNewUserResponse",
            "localId": "x7GQ2nRkVbTfUwZ1",
            "email": "user@example.com",
            "idToken": "eyJhbGciOi...",
            "refreshToken": "AMf-vBw...",
            "expiresIn": "3600"
        }"#;

        let token: TokenResponse = serde_json::from_str(json).expect("parses");
        assert_eq!(token.local_id, "x7GQ2nRkVbTfUwZ1");
        assert_eq!(token.email, "user@example.com");
    }
}
