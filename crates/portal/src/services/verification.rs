//! Payment verification handshake.
//!
//! A client arriving back from the processor's hosted confirmation carries
//! three redirect parameters; all of them are untrusted hints. The only
//! facts this module acts on are re-fetched from the processor by intent ID:
//!
//! 1. the redirect status must report success (cheap early exit),
//! 2. the presented client secret must equal the one the processor issued
//!    for this intent (defeats cross-session replay with another intent),
//! 3. the processor-reported status must be `succeeded`,
//! 4. the processor-reported amount must equal the fixed premium price
//!    exactly (defeats amount tampering).
//!
//! Only when all four hold does the user record flip to premium, and the
//! write is asserted with a read-back before success is reported. Every
//! failure resolves to a typed rejection; the handshake never ends anywhere
//! other than verified or rejected.
//!
//! Re-verification (later visits to the premium area) reuses checks 3 and 4
//! against the stored intent ID as a read-only gate: it can demote access
//! for the session but never writes the role.

use thiserror::Error;
use tracing::{info, instrument, warn};

use reseller_core::{PaymentStatus, Role, Uid};

use crate::config::PREMIUM_PLAN_AMOUNT_MINOR;
use crate::directory::{UserDirectory, UserRecord};
use crate::error::AppError;
use crate::payments::{IntentStatus, PaymentIntent, PaymentsClient};

/// The redirect status the processor reports on a successful confirmation.
const REDIRECT_SUCCEEDED: &str = "succeeded";

/// Reasons a payment verification is rejected.
///
/// Terminal for the attempt: the user retries the whole flow or contacts
/// support, there is no partial recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The return-URL redirect status did not report success.
    #[error("Payment was not successful")]
    RedirectNotSuccessful,

    /// The presented client secret does not match the intent's.
    #[error("Invalid client secret")]
    ClientSecretMismatch,

    /// The processor does not consider the payment succeeded.
    #[error("Payment not successful. Status: {0}")]
    StatusNotSucceeded(IntentStatus),

    /// The charged amount is not the premium plan price.
    #[error("Invalid payment amount. Expected {expected}, received {received}")]
    AmountMismatch { expected: i64, received: i64 },

    /// No payment intent is recorded for this user.
    #[error("No payment on record")]
    NoPaymentOnRecord,
}

/// Check the redirect status from the return URL.
///
/// # Errors
///
/// Returns `Rejection::RedirectNotSuccessful` for anything but success.
pub fn check_redirect_status(redirect_status: &str) -> Result<(), Rejection> {
    if redirect_status == REDIRECT_SUCCEEDED {
        Ok(())
    } else {
        Err(Rejection::RedirectNotSuccessful)
    }
}

/// Check a re-fetched intent against the presented secret and the fixed
/// expected amount.
///
/// Check order is fixed: secret, then status, then amount. The amount check
/// runs even when everything else looks fine, so an otherwise-successful
/// payment for the wrong amount is still rejected.
///
/// # Errors
///
/// Returns the first failing check as a `Rejection`.
pub fn check_intent(
    intent: &PaymentIntent,
    presented_secret: &str,
    expected_amount: i64,
) -> Result<(), Rejection> {
    if intent.client_secret.as_deref() != Some(presented_secret) {
        return Err(Rejection::ClientSecretMismatch);
    }

    if intent.status != IntentStatus::Succeeded {
        return Err(Rejection::StatusNotSucceeded(intent.status));
    }

    if intent.amount != expected_amount {
        return Err(Rejection::AmountMismatch {
            expected: expected_amount,
            received: intent.amount,
        });
    }

    Ok(())
}

/// Check a stored intent for re-verification: status and amount only.
///
/// No secret check here - the intent ID comes from the user record, not
/// from the client.
///
/// # Errors
///
/// Returns the first failing check as a `Rejection`.
pub fn check_stored_intent(
    intent: &PaymentIntent,
    expected_amount: i64,
) -> Result<(), Rejection> {
    if intent.status != IntentStatus::Succeeded {
        return Err(Rejection::StatusNotSucceeded(intent.status));
    }

    if intent.amount != expected_amount {
        return Err(Rejection::AmountMismatch {
            expected: expected_amount,
            received: intent.amount,
        });
    }

    Ok(())
}

/// Outcome of a premium re-verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverifyOutcome {
    /// The stored payment still checks out.
    Confirmed,
    /// Access must be demoted for this session; the stored role is left
    /// untouched.
    Demoted(String),
}

/// Payment verification service.
///
/// Stateless: every call independently re-derives truth from the processor
/// and the document store.
pub struct VerificationService<'a> {
    payments: &'a PaymentsClient,
    directory: &'a UserDirectory,
}

impl<'a> VerificationService<'a> {
    /// Create a new verification service.
    #[must_use]
    pub const fn new(payments: &'a PaymentsClient, directory: &'a UserDirectory) -> Self {
        Self {
            payments,
            directory,
        }
    }

    /// Run the full verification handshake and flip the user to premium.
    ///
    /// `redirect_status` is checked when present (the return-URL flow); API
    /// callers that no longer have it may omit it.
    ///
    /// The grant is a pure overwrite keyed by the intent ID, so re-running
    /// the handshake for the same intent is safe.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Verification` for any failed check,
    /// `AppError::Payments`/`AppError::Directory` when a collaborator is
    /// unreachable, and `AppError::Internal` if the grant does not survive
    /// the read-back.
    #[instrument(skip(self, presented_secret), fields(uid = %uid, intent = %intent_id))]
    pub async fn verify_and_grant(
        &self,
        uid: &Uid,
        intent_id: &str,
        presented_secret: &str,
        redirect_status: Option<&str>,
    ) -> Result<(), AppError> {
        if let Some(status) = redirect_status {
            check_redirect_status(status)?;
        }

        // Never trust the client-supplied status: re-fetch from the source
        // of truth.
        let intent = self.payments.retrieve_intent(intent_id).await?;
        check_intent(&intent, presented_secret, PREMIUM_PLAN_AMOUNT_MINOR)?;

        self.directory.grant_premium(uid, intent_id).await?;

        // Read-after-write: assert the flip took effect before reporting
        // success.
        let record = self
            .directory
            .get(uid)
            .await?
            .ok_or_else(|| AppError::Internal("user record vanished after premium grant".into()))?;

        if record.role != Role::Premium
            || record.payment_status != Some(PaymentStatus::Completed)
            || record.payment_intent_id.as_deref() != Some(intent_id)
        {
            return Err(AppError::Internal(
                "premium grant did not persist".into(),
            ));
        }

        info!(%uid, "premium grant verified");
        Ok(())
    }

    /// Re-verify a premium user's stored payment.
    ///
    /// Read-only gate: on any failure - missing intent, unreachable
    /// processor, status or amount mismatch - access is demoted for the
    /// session without mutating the stored role. A successful pass stamps
    /// `lastPaymentVerification` on the record.
    #[instrument(skip(self, record), fields(uid = %uid))]
    pub async fn reverify(&self, uid: &Uid, record: &UserRecord) -> ReverifyOutcome {
        let Some(intent_id) = record.payment_intent_id.as_deref() else {
            return ReverifyOutcome::Demoted(Rejection::NoPaymentOnRecord.to_string());
        };

        let intent = match self.payments.retrieve_intent(intent_id).await {
            Ok(intent) => intent,
            Err(err) => {
                warn!(%uid, error = %err, "re-verification fetch failed");
                return ReverifyOutcome::Demoted(err.to_string());
            }
        };

        if let Err(rejection) = check_stored_intent(&intent, PREMIUM_PLAN_AMOUNT_MINOR) {
            warn!(%uid, reason = %rejection, "re-verification rejected stored payment");
            return ReverifyOutcome::Demoted(rejection.to_string());
        }

        if let Err(err) = self.directory.record_verification(uid).await {
            // The gate already passed; a failed stamp is not a demotion.
            warn!(%uid, error = %err, "failed to stamp re-verification");
        }

        ReverifyOutcome::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(status: IntentStatus, amount: i64, secret: &str) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".to_string(),
            status,
            amount,
            currency: "gbp".to_string(),
            client_secret: Some(secret.to_string()),
            created: 1_680_800_504,
        }
    }

    #[test]
    fn test_all_checks_pass() {
        let intent = intent(IntentStatus::Succeeded, 4999, "X");
        assert_eq!(check_intent(&intent, "X", 4999), Ok(()));
    }

    #[test]
    fn test_amount_mismatch_rejected_despite_success() {
        // An otherwise-successful payment for the wrong amount must still be
        // rejected.
        let intent = intent(IntentStatus::Succeeded, 5000, "X");
        assert_eq!(
            check_intent(&intent, "X", 4999),
            Err(Rejection::AmountMismatch {
                expected: 4999,
                received: 5000
            })
        );
    }

    #[test]
    fn test_secret_mismatch_rejected_before_status() {
        // A replayed intent ID from another session fails on the secret,
        // whatever its status.
        let intent = intent(IntentStatus::Processing, 4999, "X");
        assert_eq!(
            check_intent(&intent, "Y", 4999),
            Err(Rejection::ClientSecretMismatch)
        );
    }

    #[test]
    fn test_missing_secret_rejected() {
        let mut intent = intent(IntentStatus::Succeeded, 4999, "X");
        intent.client_secret = None;
        assert_eq!(
            check_intent(&intent, "X", 4999),
            Err(Rejection::ClientSecretMismatch)
        );
    }

    #[test]
    fn test_unsucceeded_status_rejected() {
        let intent = intent(IntentStatus::Processing, 4999, "X");
        assert_eq!(
            check_intent(&intent, "X", 4999),
            Err(Rejection::StatusNotSucceeded(IntentStatus::Processing))
        );
    }

    #[test]
    fn test_redirect_status_gate() {
        assert_eq!(check_redirect_status("succeeded"), Ok(()));
        assert_eq!(
            check_redirect_status("failed"),
            Err(Rejection::RedirectNotSuccessful)
        );
        assert_eq!(
            check_redirect_status(""),
            Err(Rejection::RedirectNotSuccessful)
        );
    }

    #[test]
    fn test_stored_intent_checks_status_and_amount() {
        let ok = intent(IntentStatus::Succeeded, 4999, "irrelevant");
        assert_eq!(check_stored_intent(&ok, 4999), Ok(()));

        let refunded = intent(IntentStatus::Canceled, 4999, "irrelevant");
        assert_eq!(
            check_stored_intent(&refunded, 4999),
            Err(Rejection::StatusNotSucceeded(IntentStatus::Canceled))
        );

        let tampered = intent(IntentStatus::Succeeded, 1, "irrelevant");
        assert!(matches!(
            check_stored_intent(&tampered, 4999),
            Err(Rejection::AmountMismatch { .. })
        ));
    }

    #[test]
    fn test_rejection_messages_are_user_facing() {
        assert_eq!(
            Rejection::ClientSecretMismatch.to_string(),
            "Invalid client secret"
        );
        assert_eq!(
            Rejection::AmountMismatch {
                expected: 4999,
                received: 5000
            }
            .to_string(),
            "Invalid payment amount. Expected 4999, received 5000"
        );
        assert_eq!(
            Rejection::StatusNotSucceeded(IntentStatus::Processing).to_string(),
            "Payment not successful. Status: processing"
        );
    }
}
