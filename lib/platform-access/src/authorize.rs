//! Post-authentication authorization against the allow-list.
//!
//! Runs once per sign-in, after the identity provider's ID token has been
//! validated and before any session is issued. A rejected identity is sent
//! to the invalid-user page and never gets a session cookie.

use crate::allow_list::AllowList;
use crate::claims::{ClaimSet, claim_type};
use std::sync::Arc;

/// Path of the page shown to identities that are not allow-listed.
pub const INVALID_USER_PATH: &str = "/Account/InvalidUser";

/// Query parameter carrying the rejected identity.
pub const INVALID_USER_PARAM: &str = "upn";

/// Outcome of authorizing one authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The identity is allow-listed; the session may be established.
    Allow {
        /// The resolved UPN or email.
        identity: String,
    },
    /// The identity is not allow-listed, or none could be resolved.
    Reject {
        /// The resolved UPN or email; empty when neither claim was usable.
        identity: String,
    },
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Returns the identity the decision was made for.
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::Allow { identity } | Self::Reject { identity } => identity,
        }
    }

    /// Returns the invalid-user redirect location for a rejection.
    ///
    /// `None` for [`Decision::Allow`].
    #[must_use]
    pub fn redirect_location(&self) -> Option<String> {
        match self {
            Self::Allow { .. } => None,
            Self::Reject { identity } => Some(invalid_user_location(identity)),
        }
    }
}

/// Builds `/Account/InvalidUser?upn=<identity>` with the identity
/// percent-encoded. Only RFC 3986 unreserved characters are left as-is.
#[must_use]
pub fn invalid_user_location(identity: &str) -> String {
    format!(
        "{INVALID_USER_PATH}?{INVALID_USER_PARAM}={}",
        urlencoding::encode(identity)
    )
}

/// Resolves the identity to authorize: the UPN claim, or the email claim
/// when the UPN is absent or blank.
#[must_use]
pub fn resolve_identity(claims: &ClaimSet) -> Option<&str> {
    [claim_type::UPN, claim_type::EMAIL]
        .into_iter()
        .filter_map(|claim| claims.first(claim))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Decides whether authenticated identities may use the application.
///
/// Cheap to clone; the allow-list is shared.
#[derive(Debug, Clone)]
pub struct Authorizer {
    allow_list: Arc<AllowList>,
}

impl Authorizer {
    /// Creates an authorizer over the given allow-list.
    #[must_use]
    pub fn new(allow_list: AllowList) -> Self {
        Self {
            allow_list: Arc::new(allow_list),
        }
    }

    /// Returns the allow-list in use.
    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Authorizes the validated claims of one identity.
    #[must_use]
    pub fn authorize(&self, claims: &ClaimSet) -> Decision {
        let Some(identity) = resolve_identity(claims) else {
            tracing::warn!("rejecting sign-in without a upn or email claim");
            return Decision::Reject {
                identity: String::new(),
            };
        };

        if self.allow_list.contains(identity) {
            tracing::info!(identity, "sign-in allowed");
            Decision::Allow {
                identity: identity.to_string(),
            }
        } else {
            tracing::warn!(identity, "sign-in rejected: identity not in allow-list");
            Decision::Reject {
                identity: identity.to_string(),
            }
        }
    }

    /// Returns true if an already-resolved identity is still allow-listed.
    #[must_use]
    pub fn permits(&self, identity: &str) -> bool {
        !identity.trim().is_empty() && self.allow_list.contains(identity.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorizer(raw: &str) -> Authorizer {
        Authorizer::new(AllowList::load(Some(raw)))
    }

    #[test]
    fn upn_match_is_allowed() {
        let claims = ClaimSet::new().with_claim(claim_type::UPN, "alice@example.com");
        let decision = authorizer("alice@example.com").authorize(&claims);

        assert_eq!(
            decision,
            Decision::Allow {
                identity: "alice@example.com".to_string()
            }
        );
        assert_eq!(decision.redirect_location(), None);
    }

    #[test]
    fn upn_match_ignores_case() {
        let claims = ClaimSet::new().with_claim(claim_type::UPN, "ALICE@EXAMPLE.COM");
        assert!(authorizer("alice@example.com").authorize(&claims).is_allowed());
    }

    #[test]
    fn email_is_used_when_upn_absent() {
        let claims = ClaimSet::new().with_claim(claim_type::EMAIL, "guest@partner.org");
        let decision = authorizer("alice@example.com;guest@partner.org").authorize(&claims);

        assert!(decision.is_allowed());
        assert_eq!(decision.identity(), "guest@partner.org");
    }

    #[test]
    fn email_is_used_when_upn_blank() {
        let claims = ClaimSet::new()
            .with_claim(claim_type::UPN, "   ")
            .with_claim(claim_type::EMAIL, "guest@partner.org");
        let decision = authorizer("guest@partner.org").authorize(&claims);

        assert!(decision.is_allowed());
    }

    #[test]
    fn upn_takes_precedence_over_email() {
        let claims = ClaimSet::new()
            .with_claim(claim_type::UPN, "alice@example.com")
            .with_claim(claim_type::EMAIL, "guest@partner.org");
        let decision = authorizer("guest@partner.org").authorize(&claims);

        assert_eq!(
            decision,
            Decision::Reject {
                identity: "alice@example.com".to_string()
            }
        );
    }

    #[test]
    fn no_identity_claims_is_rejected_with_empty_upn() {
        let claims = ClaimSet::new().with_claim(claim_type::SUBJECT, "abc");
        let decision = authorizer("alice@example.com").authorize(&claims);

        assert!(!decision.is_allowed());
        assert_eq!(decision.identity(), "");
        assert_eq!(
            decision.redirect_location().as_deref(),
            Some("/Account/InvalidUser?upn=")
        );
    }

    #[test]
    fn empty_allow_list_rejects_everyone() {
        let authorizer = Authorizer::new(AllowList::load(None));
        for identity in ["alice@example.com", "bob@example.com", "x"] {
            let claims = ClaimSet::new().with_claim(claim_type::UPN, identity);
            assert!(!authorizer.authorize(&claims).is_allowed(), "{identity}");
        }
    }

    #[test]
    fn unlisted_identity_is_redirected() {
        let claims = ClaimSet::new().with_claim(claim_type::UPN, "mallory@example.com");
        let decision = authorizer("alice@example.com").authorize(&claims);

        assert_eq!(
            decision.redirect_location().as_deref(),
            Some("/Account/InvalidUser?upn=mallory%40example.com")
        );
    }

    #[test]
    fn redirect_encodes_reserved_characters() {
        let location = invalid_user_location("bob smith@x.com");
        assert_eq!(location, "/Account/InvalidUser?upn=bob%20smith%40x.com");

        let location = invalid_user_location("a&b=c#d?e/f+g");
        let query = location
            .strip_prefix("/Account/InvalidUser?upn=")
            .expect("prefix");
        assert!(
            !query.contains(['&', '=', '#', '?', '/', '+', ' ']),
            "{query}"
        );
    }

    #[test]
    fn redirect_keeps_unreserved_characters() {
        assert_eq!(
            invalid_user_location("a.b-c_d~e@X.com"),
            "/Account/InvalidUser?upn=a.b-c_d~e%40X.com"
        );
    }

    #[test]
    fn permits_checks_resolved_identity() {
        let authorizer = authorizer("alice@example.com");
        assert!(authorizer.permits("Alice@Example.com"));
        assert!(!authorizer.permits("bob@example.com"));
        assert!(!authorizer.permits("  "));
    }
}
