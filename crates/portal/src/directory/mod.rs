//! Document store client for per-user records.
//!
//! Users are keyed by the identity provider's `uid`. The document store is
//! the source of truth for the role and the payment fields; this module is
//! the only code that writes them.
//!
//! The premium grant is a pure overwrite of fixed field values, so replaying
//! it for the same payment intent is safe - duplicate verifications converge
//! on the same record state instead of compounding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use reseller_core::{PaymentStatus, Role, Uid};

use crate::config::DirectoryConfig;

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with an unexpected status.
    #[error("document store returned {0}")]
    Status(StatusCode),
}

/// Whether the account belongs to an individual or a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Individual,
    Company,
}

/// A per-user record as stored in the document store.
///
/// Field names are camelCase on the wire. `role == premium` is only ever
/// written together with `paymentStatus == completed` and the intent ID that
/// unlocked it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_payment_verification: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The premium grant written after a verified payment.
///
/// Serialized as a partial update; every field has a fixed value for a given
/// intent, which is what makes the write idempotent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PremiumGrant<'a> {
    role: Role,
    payment_status: PaymentStatus,
    payment_intent_id: &'a str,
    payment_date: DateTime<Utc>,
    last_payment_verification: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerificationStamp {
    last_payment_verification: DateTime<Utc>,
}

/// Client for the per-user document store.
#[derive(Clone)]
pub struct UserDirectory {
    inner: Arc<UserDirectoryInner>,
}

struct UserDirectoryInner {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
}

impl UserDirectory {
    /// Create a new document store client.
    #[must_use]
    pub fn new(config: &DirectoryConfig) -> Self {
        Self {
            inner: Arc::new(UserDirectoryInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        }
    }

    fn record_url(&self, uid: &Uid) -> String {
        format!("{}/users/{}", self.inner.api_url, uid)
    }

    /// Fetch a user record by uid.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the request fails; a missing record is
    /// `Ok(None)`, not an error.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn get(&self, uid: &Uid) -> Result<Option<UserRecord>, DirectoryError> {
        let response = self
            .inner
            .client
            .get(self.record_url(uid))
            .bearer_auth(self.inner.api_key.expose_secret())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }

        Ok(Some(response.json().await?))
    }

    /// Create the record for a freshly provisioned account.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the store rejects the write.
    #[instrument(skip(self, record), fields(uid = %uid))]
    pub async fn create(&self, uid: &Uid, record: &UserRecord) -> Result<(), DirectoryError> {
        let response = self
            .inner
            .client
            .put(self.record_url(uid))
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }

        Ok(())
    }

    /// Flip a user to premium after a verified payment.
    ///
    /// Pure overwrite: running this twice for the same intent re-applies the
    /// same values (timestamps move, nothing accumulates).
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the store rejects the write.
    #[instrument(skip(self), fields(uid = %uid, intent = %payment_intent_id))]
    pub async fn grant_premium(
        &self,
        uid: &Uid,
        payment_intent_id: &str,
    ) -> Result<(), DirectoryError> {
        let now = Utc::now();
        let grant = PremiumGrant {
            role: Role::Premium,
            payment_status: PaymentStatus::Completed,
            payment_intent_id,
            payment_date: now,
            last_payment_verification: now,
        };

        let response = self
            .inner
            .client
            .patch(self.record_url(uid))
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(&grant)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }

        Ok(())
    }

    /// Stamp a successful re-verification of the stored payment intent.
    ///
    /// Touches only `lastPaymentVerification`; the role and payment fields
    /// are never written outside the full handshake.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the store rejects the write.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn record_verification(&self, uid: &Uid) -> Result<(), DirectoryError> {
        let stamp = VerificationStamp {
            last_payment_verification: Utc::now(),
        };

        let response = self
            .inner
            .client
            .patch(self.record_url(uid))
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(&stamp)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }

        Ok(())
    }
}
