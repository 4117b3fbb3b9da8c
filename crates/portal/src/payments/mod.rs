//! Payment processor client.
//!
//! Creates and retrieves payment intents over the processor's REST API.
//! The processor's hosted confirmation UI collects card details in the
//! browser; this server only ever sees intent objects, never card data.
//!
//! Verification always re-fetches the intent by ID from the processor and
//! never trusts a client-supplied status - see
//! [`crate::services::verification`].

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::PaymentsConfig;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor rejected the request.
    #[error("payment processor error: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// The processor returned an intent without a client secret.
    #[error("payment intent has no client secret")]
    MissingClientSecret,
}

/// Processor-side status of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
        };
        write!(f, "{s}")
    }
}

/// A payment intent as reported by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: IntentStatus,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    /// Unix timestamp of intent creation.
    pub created: i64,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorBody {
    error: ProcessorError,
}

#[derive(Debug, Deserialize)]
struct ProcessorError {
    #[serde(default)]
    message: String,
}

/// Client for the payment processor API.
#[derive(Clone)]
pub struct PaymentsClient {
    inner: Arc<PaymentsClientInner>,
}

struct PaymentsClientInner {
    client: reqwest::Client,
    api_url: String,
    secret_key: SecretString,
}

impl PaymentsClient {
    /// Create a new payment processor client.
    #[must_use]
    pub fn new(config: &PaymentsConfig) -> Self {
        Self {
            inner: Arc::new(PaymentsClientInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.clone(),
            }),
        }
    }

    /// Create a payment intent for the given amount.
    ///
    /// The amount is always a server-side constant at the call site; this
    /// client never sees client-supplied amounts.
    ///
    /// # Errors
    ///
    /// Returns `PaymentsError` if the processor rejects the request.
    #[instrument(skip(self))]
    pub async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentsError> {
        let params = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let response = self
            .inner
            .client
            .post(format!("{}/v1/payment_intents", self.inner.api_url))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        self.parse_intent(response).await
    }

    /// Retrieve a payment intent by ID.
    ///
    /// # Errors
    ///
    /// Returns `PaymentsError` if the processor request fails.
    #[instrument(skip(self), fields(intent = %id))]
    pub async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentsError> {
        let response = self
            .inner
            .client
            .get(format!("{}/v1/payment_intents/{id}", self.inner.api_url))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;

        self.parse_intent(response).await
    }

    async fn parse_intent(
        &self,
        response: reqwest::Response,
    ) -> Result<PaymentIntent, PaymentsError> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ProcessorErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(PaymentsError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parses_processor_payload() {
        let json = r#"{
            "id": "pi_3MtwBwLkdIwHu7ix28a3tqPa",
            "object": "payment_intent",
            "amount": 4999,
            "currency": "gbp",
            "client_secret": "pi_3MtwBwLkdIwHu7ix28a3tqPa_secret_YrKJUKribcBKcG7e",
            "created": 1680800504,
            "status": "succeeded"
        }"#;

        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.id, "pi_3MtwBwLkdIwHu7ix28a3tqPa");
        assert_eq!(intent.status, IntentStatus::Succeeded);
        assert_eq!(intent.amount, 4999);
        assert_eq!(intent.currency, "gbp");
    }

    #[test]
    fn test_intent_status_display_matches_wire_format() {
        assert_eq!(IntentStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(
            IntentStatus::RequiresPaymentMethod.to_string(),
            "requires_payment_method"
        );

        // Display must match the serde wire format so rejection reasons echo
        // exactly what the processor reported.
        let wire = serde_json::to_string(&IntentStatus::Processing).unwrap();
        assert_eq!(wire, format!("\"{}\"", IntentStatus::Processing));
    }

    #[test]
    fn test_intent_without_client_secret() {
        let json = r#"{
            "id": "pi_1",
            "amount": 4999,
            "currency": "gbp",
            "created": 1680800504,
            "status": "processing"
        }"#;

        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.client_secret, None);
    }
}
