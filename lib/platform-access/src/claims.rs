//! Claims of a validated identity.
//!
//! A [`ClaimSet`] is only ever built from an ID token whose signature,
//! issuer, audience, expiry and nonce have already been verified.

use serde_json::Value;
use std::collections::BTreeMap;

/// Claim type identifiers read by the sign-in policy.
pub mod claim_type {
    /// User principal name, issued for members of the tenant.
    pub const UPN: &str = "upn";
    /// Email address. Guests and other external identities carry this
    /// instead of a UPN.
    pub const EMAIL: &str = "email";
    /// Subject identifier.
    pub const SUBJECT: &str = "sub";
    /// Display name.
    pub const NAME: &str = "name";
    /// Fallback display name used by some providers.
    pub const PREFERRED_USERNAME: &str = "preferred_username";
}

/// Read-only mapping from claim type to its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    claims: BTreeMap<String, Vec<String>>,
}

impl ClaimSet {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value for a claim type.
    #[must_use]
    pub fn with_claim(mut self, claim_type: &str, value: impl Into<String>) -> Self {
        self.claims
            .entry(claim_type.to_string())
            .or_default()
            .push(value.into());
        self
    }

    /// Builds a claim set from a decoded JWT payload.
    ///
    /// Strings, numbers and booleans become single values. Arrays contribute
    /// each scalar element. Nested objects and nulls are skipped.
    #[must_use]
    pub fn from_json(payload: &Value) -> Self {
        let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if let Some(object) = payload.as_object() {
            for (claim_type, value) in object {
                let values: Vec<String> = match value {
                    Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
                    other => scalar_to_string(other).into_iter().collect(),
                };
                if !values.is_empty() {
                    claims.insert(claim_type.clone(), values);
                }
            }
        }
        Self { claims }
    }

    /// Returns the first value of a claim type, if present.
    #[must_use]
    pub fn first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .get(claim_type)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the subject claim, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.first(claim_type::SUBJECT)
    }

    /// Returns a human-readable name: `name`, then `preferred_username`.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.first(claim_type::NAME)
            .or_else(|| self.first(claim_type::PREFERRED_USERNAME))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_flattens_scalars_and_arrays() {
        let payload = json!({
            "sub": "abc",
            "upn": "alice@contoso.com",
            "groups": ["g1", "g2", {"nested": true}],
            "iat": 1700000000,
            "email_verified": true,
            "address": {"country": "NZ"},
            "nickname": null
        });

        let claims = ClaimSet::from_json(&payload);

        assert_eq!(claims.subject(), Some("abc"));
        assert_eq!(claims.first(claim_type::UPN), Some("alice@contoso.com"));
        assert_eq!(claims.first("groups"), Some("g1"));
        assert_eq!(claims.first("iat"), Some("1700000000"));
        assert_eq!(claims.first("email_verified"), Some("true"));
        assert_eq!(claims.first("address"), None);
        assert_eq!(claims.first("nickname"), None);
    }

    #[test]
    fn from_json_non_object_is_empty() {
        assert!(ClaimSet::from_json(&json!("token")).is_empty());
        assert!(ClaimSet::from_json(&json!([1, 2])).is_empty());
    }

    #[test]
    fn missing_claim_has_no_values() {
        let claims = ClaimSet::new();
        assert_eq!(claims.first(claim_type::EMAIL), None);
    }

    #[test]
    fn display_name_falls_back_to_preferred_username() {
        let claims = ClaimSet::new().with_claim(claim_type::PREFERRED_USERNAME, "alice");
        assert_eq!(claims.display_name(), Some("alice"));

        let claims = claims.with_claim(claim_type::NAME, "Alice Liddell");
        assert_eq!(claims.display_name(), Some("Alice Liddell"));
    }

    #[test]
    fn first_value_wins() {
        let claims = ClaimSet::new()
            .with_claim(claim_type::UPN, "alice@contoso.com")
            .with_claim(claim_type::UPN, "alias@contoso.com");
        assert_eq!(claims.first(claim_type::UPN), Some("alice@contoso.com"));
    }
}
