//! Application services.
//!
//! Stateless orchestration over the external-service clients:
//!
//! - [`auth`] - signup/login across identity provider and document store
//! - [`roles`] - role resolution with bounded retries, fail-safe to free
//! - [`verification`] - the payment verification handshake and the
//!   read-only premium re-verification gate

pub mod auth;
pub mod roles;
pub mod verification;

pub use auth::{AuthError, AuthService, SignupDetails};
pub use roles::resolve_role;
pub use verification::{ReverifyOutcome, VerificationService};
