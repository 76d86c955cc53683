//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: failures establishing or reading a sign-in
//! - `AuthorizationError`: an authenticated identity is refused

use rootcause::Report;
use std::fmt;

/// A Result type alias using rootcause's Report for error handling.
///
/// Each layer adds its own context via `.context()` as errors propagate.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Session cookie is missing, undecodable or malformed.
    InvalidSession { session_id: String },
    /// Session has expired.
    SessionExpired { session_id: String },
    /// OIDC provider returned an error.
    ProviderError { provider: String, reason: String },
    /// Missing required claim in token.
    MissingClaim { claim: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSession { session_id } => {
                write!(f, "invalid session: {session_id}")
            }
            Self::SessionExpired { session_id } => {
                write!(f, "session has expired: {session_id}")
            }
            Self::ProviderError { provider, reason } => {
                write!(f, "OIDC provider '{provider}' error: {reason}")
            }
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from authorization operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// No session.
    NotAuthenticated,
    /// The identity is not in the allow-list.
    NotAllowListed { identity: String },
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => {
                write!(f, "user is not authenticated")
            }
            Self::NotAllowListed { identity } => {
                write!(f, "identity '{identity}' is not allowed to use this application")
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_error_session_expired_display() {
        let err = AuthenticationError::SessionExpired {
            session_id: "sess_123".to_string(),
        };
        assert!(err.to_string().contains("expired"));
        assert!(err.to_string().contains("sess_123"));
    }

    #[test]
    fn authentication_error_provider_error_display() {
        let err = AuthenticationError::ProviderError {
            provider: "https://login.microsoftonline.com/tenant".to_string(),
            reason: "access_denied".to_string(),
        };
        assert!(err.to_string().contains("login.microsoftonline.com"));
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn authentication_error_missing_claim_display() {
        let err = AuthenticationError::MissingClaim {
            claim: "sub".to_string(),
        };
        assert_eq!(err.to_string(), "missing required claim: sub");
    }

    #[test]
    fn authorization_error_not_allow_listed_display() {
        let err = AuthorizationError::NotAllowListed {
            identity: "mallory@example.com".to_string(),
        };
        assert!(err.to_string().contains("mallory@example.com"));
    }
}
