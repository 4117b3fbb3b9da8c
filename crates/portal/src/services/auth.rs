//! Authentication service.
//!
//! Orchestrates signup and login across the identity provider and the
//! document store. Credentials live with the provider; this service only
//! validates input, provisions the user record, and hands back the
//! authenticated identity.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use reseller_core::{Email, EmailError, Plan, Role};

use crate::directory::{DirectoryError, UserDirectory, UserRecord, UserType};
use crate::identity::{AuthenticatedIdentity, IdentityClient, IdentityError};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation do not match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Identity provider error.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Document store error.
    #[error("document store error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Profile details collected at signup.
#[derive(Debug, Clone)]
pub struct SignupDetails {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub user_type: UserType,
    pub company_name: Option<String>,
    pub selected_plan: Plan,
}

/// Authentication service.
pub struct AuthService<'a> {
    identity: &'a IdentityClient,
    directory: &'a UserDirectory,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(identity: &'a IdentityClient, directory: &'a UserDirectory) -> Self {
        Self {
            identity,
            directory,
        }
    }

    /// Register a new account and provision its user record.
    ///
    /// The record always starts at `role = free`: a premium plan selection
    /// only routes the account into the payment flow, it never writes the
    /// role directly.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`/`WeakPassword`/`PasswordMismatch`
    /// for invalid input, `AuthError::Identity` for provider failures
    /// (including an already-registered email), and `AuthError::Directory`
    /// if the record write fails.
    #[instrument(skip(self, details), fields(email = %details.email))]
    pub async fn signup(
        &self,
        details: SignupDetails,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let email = Email::parse(&details.email)?;
        validate_password(&details.password)?;
        if details.password != details.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let identity = self
            .identity
            .sign_up(email.as_str(), &details.password)
            .await?;

        let record = UserRecord {
            email: email.into_inner(),
            first_name: details.first_name,
            last_name: details.last_name,
            phone_number: details.phone_number,
            user_type: details.user_type,
            company_name: match details.user_type {
                UserType::Company => details.company_name,
                UserType::Individual => None,
            },
            role: Role::Free,
            payment_status: None,
            payment_intent_id: None,
            payment_date: None,
            last_payment_verification: None,
            created_at: Utc::now(),
        };

        self.directory.create(&identity.uid, &record).await?;

        Ok(identity)
    }

    /// Authenticate an existing account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` with `InvalidCredentials` for a wrong
    /// email or password.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let email = Email::parse(email)?;
        let identity = self.identity.sign_in(email.as_str(), password).await?;
        Ok(identity)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn test_weak_password_message() {
        let err = validate_password("1234567").expect_err("too short");
        assert_eq!(
            err.to_string(),
            "password validation failed: password must be at least 8 characters"
        );
    }
}
