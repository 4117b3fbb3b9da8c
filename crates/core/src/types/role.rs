//! Role, plan, and payment-status enums.
//!
//! These gate which dashboard and catalog a user may reach. `Role` is stored
//! on the user record in the document store; `Plan` is only ever a
//! client-side selection and never grants anything by itself.

use serde::{Deserialize, Serialize};

/// Coarse entitlement tag for a portal user.
///
/// `Premium` must only ever be written together with a completed payment
/// status and the payment intent ID that unlocked it. Any failure to
/// determine a user's role resolves to `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Free,
    Premium,
}

impl Role {
    /// The dashboard path a user with this role belongs on.
    #[must_use]
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Self::Free => "/dashboard",
            Self::Premium => "/premium-dashboard",
        }
    }

    /// Whether this role unlocks the premium area.
    #[must_use]
    pub const fn is_premium(self) -> bool {
        matches!(self, Self::Premium)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// The plan a visitor picked on the landing page before signing up.
///
/// Selecting `Premium` does not change the stored role - it only routes the
/// new account into the payment flow. The role flips after the payment
/// verification handshake completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    /// Whether this plan requires the payment flow before it is active.
    #[must_use]
    pub const fn requires_payment(self) -> bool {
        matches!(self, Self::Premium)
    }
}

/// Payment status recorded on the user record.
///
/// Only ever written alongside a role transition to premium; absent until
/// then (modeled as `Option<PaymentStatus>` on the record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Free).unwrap(), "\"free\"");
        assert_eq!(
            serde_json::to_string(&Role::Premium).unwrap(),
            "\"premium\""
        );

        let role: Role = serde_json::from_str("\"premium\"").unwrap();
        assert_eq!(role, Role::Premium);
    }

    #[test]
    fn test_role_defaults_to_free() {
        assert_eq!(Role::default(), Role::Free);
    }

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(Role::Free.dashboard_path(), "/dashboard");
        assert_eq!(Role::Premium.dashboard_path(), "/premium-dashboard");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("free".parse::<Role>().unwrap(), Role::Free);
        assert_eq!("premium".parse::<Role>().unwrap(), Role::Premium);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_plan_requires_payment() {
        assert!(Plan::Premium.requires_payment());
        assert!(!Plan::Free.requires_payment());
    }

    #[test]
    fn test_payment_status_serde() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
