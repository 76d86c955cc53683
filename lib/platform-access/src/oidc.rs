//! OIDC (OpenID Connect) configuration for the single identity tenant.
//!
//! The authority is derived from an identity provider instance URL and a
//! tenant identifier, e.g. `https://login.microsoftonline.com/` and
//! `<tenant-guid>/v2.0`. The result must equal the issuer the provider
//! advertises.

use serde::{Deserialize, Serialize};

/// Configuration for the OIDC identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret. Public clients rely on PKCE alone.
    #[serde(default)]
    client_secret: Option<String>,
    /// Base URL of the identity provider instance.
    #[serde(default)]
    instance: String,
    /// Tenant identifier appended to the instance to form the authority.
    tenant_id: String,
    /// The redirect URI for the OAuth2 callback (e.g. "https://app.example.com/auth/callback").
    redirect_uri: String,
    /// Where the provider sends the browser after sign-out.
    post_logout_redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

/// Appends a `/` unless the value already ends with one.
fn ensure_trailing_slash(value: &str) -> String {
    if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    }
}

impl OidcConfig {
    /// Creates a new OIDC configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        client_id: String,
        instance: String,
        tenant_id: String,
        redirect_uri: String,
        post_logout_redirect_uri: String,
    ) -> Self {
        Self {
            client_id,
            client_secret: None,
            instance,
            tenant_id,
            redirect_uri,
            post_logout_redirect_uri,
            scopes: default_scopes(),
        }
    }

    /// Returns the authority (issuer) URL: instance, `/`, tenant.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}{}", ensure_trailing_slash(&self.instance), self.tenant_id)
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret, if configured.
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> &str {
        &self.post_logout_redirect_uri
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(instance: &str) -> OidcConfig {
        OidcConfig::new(
            "client-id".to_string(),
            instance.to_string(),
            "contoso.onmicrosoft.com".to_string(),
            "https://app.example.com/auth/callback".to_string(),
            "https://app.example.com/".to_string(),
        )
    }

    #[test]
    fn new_config_has_defaults() {
        let config = config("https://login.microsoftonline.com/");

        assert_eq!(config.client_id(), "client-id");
        assert_eq!(config.client_secret(), None);
        assert_eq!(config.scopes(), vec!["openid", "email", "profile"]);
        assert_eq!(config.post_logout_redirect_uri(), "https://app.example.com/");
    }

    #[test]
    fn authority_joins_instance_and_tenant() {
        assert_eq!(
            config("https://login.microsoftonline.com/").authority(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com"
        );
    }

    #[test]
    fn authority_adds_missing_slash() {
        assert_eq!(
            config("https://login.microsoftonline.com").authority(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com"
        );
    }

    #[test]
    fn authority_with_empty_instance() {
        assert_eq!(config("").authority(), "/contoso.onmicrosoft.com");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "client_id": "my-client",
            "instance": "https://login.microsoftonline.com/",
            "tenant_id": "tenant",
            "redirect_uri": "https://app.example.com/auth/callback",
            "post_logout_redirect_uri": "https://app.example.com/"
        }"#;

        let config: OidcConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.client_id(), "my-client");
        assert_eq!(config.client_secret(), None);
        assert_eq!(config.scopes(), vec!["openid", "email", "profile"]);
        assert_eq!(
            config.authority(),
            "https://login.microsoftonline.com/tenant"
        );
    }

    #[test]
    fn scopes_parses_comma_separated() {
        let json = r#"{
            "client_id": "my-client",
            "tenant_id": "tenant",
            "redirect_uri": "https://app.example.com/callback",
            "post_logout_redirect_uri": "https://app.example.com/",
            "scopes": "openid, email, profile, offline_access"
        }"#;

        let config: OidcConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(
            config.scopes(),
            vec!["openid", "email", "profile", "offline_access"]
        );
    }
}
