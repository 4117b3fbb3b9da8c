//! Role resolution against the document store.
//!
//! A user's role is never trusted from a cache across sessions: it is
//! re-derived from the user record on each new session. Lookups are retried
//! a bounded number of times with a fixed backoff, and exhaustion resolves
//! to the least-privileged role. There is no path through here that grants
//! premium on failure.

use std::time::Duration;

use tracing::warn;

use reseller_core::{Role, Uid};

use crate::directory::{DirectoryError, UserDirectory};

/// Maximum role lookup attempts per resolution.
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between lookup attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// A source of role lookups, abstracted for testing the retry policy.
pub trait RoleSource {
    /// Fetch the role stored for `uid`.
    fn fetch_role(
        &self,
        uid: &Uid,
    ) -> impl Future<Output = Result<Role, DirectoryError>> + Send;
}

impl RoleSource for UserDirectory {
    async fn fetch_role(&self, uid: &Uid) -> Result<Role, DirectoryError> {
        // A missing record is a real answer: least privilege.
        Ok(self
            .get(uid)
            .await?
            .map(|record| record.role)
            .unwrap_or_default())
    }
}

/// Resolve a user's role with bounded retries.
///
/// Tries up to [`MAX_ATTEMPTS`] lookups with [`RETRY_BACKOFF`] between them.
/// If every attempt fails the role resolves to [`Role::Free`].
pub async fn resolve_role<S: RoleSource + Sync>(source: &S, uid: &Uid) -> Role {
    for attempt in 1..=MAX_ATTEMPTS {
        match source.fetch_role(uid).await {
            Ok(role) => return role,
            Err(err) => {
                warn!(
                    %uid,
                    attempt,
                    error = %err,
                    "role lookup failed"
                );
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }

    warn!(%uid, "role lookup exhausted retries, defaulting to free");
    Role::Free
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use reqwest::StatusCode;

    use super::*;

    struct FlakySource {
        calls: AtomicU32,
        succeed_on: Option<u32>,
        role: Role,
    }

    impl FlakySource {
        const fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: None,
                role: Role::Premium,
            }
        }

        const fn succeeding_on(attempt: u32, role: Role) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on: Some(attempt),
                role,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RoleSource for FlakySource {
        async fn fetch_role(&self, _uid: &Uid) -> Result<Role, DirectoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.succeed_on {
                Some(n) if call >= n => Ok(self.role),
                _ => Err(DirectoryError::Status(StatusCode::SERVICE_UNAVAILABLE)),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_resolve_to_free() {
        let source = FlakySource::failing();
        let uid = Uid::new("u1");

        let role = resolve_role(&source, &uid).await;

        assert_eq!(role, Role::Free);
        assert_eq!(source.calls(), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_second_attempt() {
        let source = FlakySource::succeeding_on(2, Role::Premium);
        let uid = Uid::new("u1");

        let role = resolve_role(&source, &uid).await;

        assert_eq!(role, Role::Premium);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_retry() {
        let source = FlakySource::succeeding_on(1, Role::Free);
        let uid = Uid::new("u1");

        let role = resolve_role(&source, &uid).await;

        assert_eq!(role, Role::Free);
        assert_eq!(source.calls(), 1);
    }
}
