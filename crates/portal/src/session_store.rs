//! Per-session authentication state.
//!
//! [`AuthSession`] wraps the signed-cookie session and owns the lifecycle of
//! the authenticated identity and its derived role:
//!
//! - `sign_in` / `sign_out` are the auth-state-change events; both clear the
//!   cached role and reset the fire-once redirect gate, so each identity
//!   change gets a fresh resolution and a fresh redirect budget;
//! - the role is resolved at most once per identity change (the
//!   3-attempt/1-second-backoff policy in [`crate::services::roles`]) and
//!   cached in the session afterwards - never across sessions;
//! - the cached role can be demoted for the session (after a failed premium
//!   re-verification) without touching the stored user record.
//!
//! The role cache is the `loading` tri-state: identity present with no
//! cached role means resolution is pending.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use reseller_core::{Plan, Role};

use crate::directory::UserDirectory;
use crate::error::AppError;
use crate::guard::{RedirectGate, SessionView};
use crate::models::session::{CurrentUser, SessionSnapshot, keys};
use crate::models::Cart;
use crate::services::roles::resolve_role;

/// The session's authentication state, as an extractor.
#[derive(Clone)]
pub struct AuthSession {
    session: Session,
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".into()))?;

        Ok(Self { session })
    }
}

impl AuthSession {
    /// Establish a session for a freshly authenticated identity.
    ///
    /// Clears the cached role and redirect gate: this is an auth-state
    /// change, so role resolution and the redirect budget start over.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn sign_in(&self, user: &CurrentUser) -> Result<(), AppError> {
        // Fresh session ID on privilege change
        self.session.cycle_id().await?;
        self.session.insert(keys::CURRENT_USER, user).await?;
        self.session.remove::<Role>(keys::ROLE).await?;
        self.session
            .remove::<RedirectGate>(keys::REDIRECT_GATE)
            .await?;
        Ok(())
    }

    /// Tear the session down entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be destroyed.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.session.flush().await?;
        Ok(())
    }

    /// The current identity, if any.
    pub async fn current_user(&self) -> Option<CurrentUser> {
        self.session
            .get(keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
    }

    /// The role cached for this session, if already resolved.
    pub async fn cached_role(&self) -> Option<Role> {
        self.session.get(keys::ROLE).await.ok().flatten()
    }

    /// Resolve the current identity's role, at most once per identity
    /// change.
    ///
    /// Returns `None` for an anonymous session. The first call after a
    /// sign-in runs the retrying document-store lookup and caches the
    /// answer; later calls return the cache.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session itself cannot be written; a
    /// failing lookup resolves to `Role::Free` instead of erroring.
    pub async fn resolve_role(&self, directory: &UserDirectory) -> Result<Option<Role>, AppError> {
        let Some(user) = self.current_user().await else {
            return Ok(None);
        };

        if let Some(role) = self.cached_role().await {
            return Ok(Some(role));
        }

        let role = resolve_role(directory, &user.uid).await;
        self.session.insert(keys::ROLE, role).await?;
        Ok(Some(role))
    }

    /// Demote the session's cached role to free.
    ///
    /// Session-local only: the stored user record is never written here.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn demote(&self) -> Result<(), AppError> {
        self.session.insert(keys::ROLE, Role::Free).await?;
        Ok(())
    }

    /// Promote the session's cached role after a verified payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn promote(&self) -> Result<(), AppError> {
        self.session.insert(keys::ROLE, Role::Premium).await?;
        Ok(())
    }

    /// The session as the client guard sees it, resolving the role if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn view(&self, directory: &UserDirectory) -> Result<SessionView, AppError> {
        match self.resolve_role(directory).await? {
            Some(role) => Ok(SessionView::Authenticated { role }),
            None => Ok(SessionView::Anonymous),
        }
    }

    /// A reportable snapshot of the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn snapshot(&self, directory: &UserDirectory) -> Result<SessionSnapshot, AppError> {
        let Some(user) = self.current_user().await else {
            return Ok(SessionSnapshot::anonymous());
        };

        let role = self.resolve_role(directory).await?;

        Ok(SessionSnapshot {
            authenticated: true,
            uid: Some(user.uid),
            email: Some(user.email),
            role,
            loading: role.is_none(),
        })
    }

    /// Attempt to fire the redirect gate; true the first time per resolved
    /// session only.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn redirect_once(&self) -> Result<bool, AppError> {
        let mut gate: RedirectGate = self
            .session
            .get(keys::REDIRECT_GATE)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

        let fired = gate.try_fire();
        self.session.insert(keys::REDIRECT_GATE, &gate).await?;
        Ok(fired)
    }

    /// Record that a premium signup is awaiting payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_pending_plan(&self, plan: Plan) -> Result<(), AppError> {
        self.session.insert(keys::PENDING_PLAN, plan).await?;
        Ok(())
    }

    /// The plan awaiting payment, if any.
    pub async fn pending_plan(&self) -> Option<Plan> {
        self.session.get(keys::PENDING_PLAN).await.ok().flatten()
    }

    /// Discard the pending-plan marker once the handshake reaches a
    /// terminal state.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear_pending_plan(&self) -> Result<(), AppError> {
        self.session.remove::<Plan>(keys::PENDING_PLAN).await?;
        Ok(())
    }

    /// The session cart (empty if none yet).
    pub async fn cart(&self) -> Cart {
        self.session
            .get(keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Store the session cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_cart(&self, cart: &Cart) -> Result<(), AppError> {
        self.session.insert(keys::CART, cart).await?;
        Ok(())
    }
}
