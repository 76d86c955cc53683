//! Rules applied to protocol messages sent to the identity provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an outgoing OpenID Connect protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Authorization request that starts an interactive sign-in.
    Authentication,
    /// RP-initiated logout (end-session) request.
    Logout,
    /// Back-channel token request.
    Token,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Logout => write!(f, "logout"),
            Self::Token => write!(f, "token"),
        }
    }
}

/// Returns true if `prompt=login` must be set on the outgoing message.
///
/// Only authentication requests get it, so users always re-enter
/// credentials instead of silently reusing a provider session.
#[must_use]
pub fn should_force_login_prompt(kind: RequestKind) -> bool {
    matches!(kind, RequestKind::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_requests_force_login() {
        assert!(should_force_login_prompt(RequestKind::Authentication));
    }

    #[test]
    fn logout_requests_never_force_login() {
        assert!(!should_force_login_prompt(RequestKind::Logout));
    }

    #[test]
    fn token_requests_never_force_login() {
        assert!(!should_force_login_prompt(RequestKind::Token));
    }

    #[test]
    fn request_kind_display() {
        assert_eq!(RequestKind::Authentication.to_string(), "authentication");
        assert_eq!(RequestKind::Logout.to_string(), "logout");
    }
}
