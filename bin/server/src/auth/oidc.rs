//! OIDC client implementation using the openidconnect crate.
//!
//! The identity library owns the protocol: discovery, PKCE, state and nonce
//! handling, ID token signature and claim validation. This module only wires
//! in the login prompt rule and turns a validated token into a [`ClaimSet`].

use base64::Engine;
use openidconnect::core::{CoreAuthPrompt, CoreAuthenticationFlow, CoreClient};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndSessionUrl, EndpointMaybeSet,
    EndpointNotSet, EndpointSet, IssuerUrl, LogoutRequest, Nonce, PkceCodeChallenge,
    PkceCodeVerifier, PostLogoutRedirectUrl, ProviderMetadataWithLogout, RedirectUrl, Scope,
    TokenResponse,
};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use stickers_platform_access::{ClaimSet, OidcConfig, RequestKind, should_force_login_prompt};
use tracing::{debug, instrument};

/// Client as produced from discovered provider metadata.
type ConfiguredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// OIDC client for authenticating users against the configured tenant.
pub struct OidcClient {
    client: ConfiguredClient,
    http_client: reqwest::Client,
    end_session_url: Option<EndSessionUrl>,
    config: OidcConfig,
}

/// Data needed to complete the OIDC callback.
///
/// Kept in an encrypted cookie between the login redirect and the callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

/// Result of a successful token exchange.
#[derive(Debug)]
pub struct TokenResult {
    /// Claims of the validated ID token.
    pub claims: ClaimSet,
}

/// Returns the `prompt` value to send for a given request kind.
fn prompt_for(kind: RequestKind) -> Option<CoreAuthPrompt> {
    should_force_login_prompt(kind).then_some(CoreAuthPrompt::Login)
}

impl OidcClient {
    /// Creates a new OIDC client by discovering the provider metadata at the
    /// configured authority.
    #[instrument(skip(config), fields(authority = %config.authority()))]
    pub async fn discover(config: OidcConfig) -> Result<Self, Report<OidcError>> {
        let issuer_url = IssuerUrl::new(config.authority())
            .map_err(|e| OidcError::Configuration(format!("invalid authority: {}", e)))?;

        let http_client = http_client()?;

        let provider_metadata =
            ProviderMetadataWithLogout::discover_async(issuer_url, &http_client)
                .await
                .map_err(|e| OidcError::Discovery(format!("failed to discover provider: {}", e)))?;

        debug!("discovered OIDC provider metadata");

        Self::from_provider_metadata(config, provider_metadata, http_client)
    }

    /// Creates a client from already-known provider metadata.
    pub fn from_provider_metadata(
        config: OidcConfig,
        provider_metadata: ProviderMetadataWithLogout,
        http_client: reqwest::Client,
    ) -> Result<Self, Report<OidcError>> {
        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid redirect URI: {}", e)))?;

        // Fail at start-up rather than on the first sign-out.
        PostLogoutRedirectUrl::new(config.post_logout_redirect_uri().to_string()).map_err(
            |e| OidcError::Configuration(format!("invalid post-logout redirect URI: {}", e)),
        )?;

        let end_session_url = provider_metadata
            .additional_metadata()
            .end_session_endpoint
            .clone();

        let client = CoreClient::from_provider_metadata(
            provider_metadata,
            ClientId::new(config.client_id().to_string()),
            config
                .client_secret()
                .map(|secret| ClientSecret::new(secret.to_string())),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            client,
            http_client,
            end_session_url,
            config,
        })
    }

    /// Generates the authorization URL for redirecting the user.
    pub fn authorization_url(&self) -> (String, AuthState) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // `openid` is always sent by the library.
        for scope in self.config.scopes() {
            if scope != "openid" {
                auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
            }
        }

        if let Some(prompt) = prompt_for(RequestKind::Authentication) {
            auth_request = auth_request.add_prompt(prompt);
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code for tokens and returns the claims of
    /// the validated ID token.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<TokenResult, Report<OidcError>> {
        let pkce_verifier = PkceCodeVerifier::new(state.pkce_verifier.clone());

        let token_request = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| OidcError::TokenExchange(format!("token endpoint error: {}", e)))?;

        let token_response = token_request
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http_client)
            .await
            .map_err(|e| OidcError::TokenExchange(format!("token exchange failed: {}", e)))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| OidcError::TokenExchange("no ID token in response".to_string()))?;

        // Signature, issuer, audience, expiry and nonce.
        let nonce = Nonce::new(state.nonce.clone());
        let verified = id_token
            .claims(&self.client.id_token_verifier(), &nonce)
            .map_err(|e| {
                OidcError::TokenValidation(format!("ID token validation failed: {}", e))
            })?;

        debug!(subject = %verified.subject().as_str(), "ID token validated");

        let claims = claims_from_token_response(&token_response)?;

        Ok(TokenResult { claims })
    }

    /// Builds the provider's end-session URL.
    ///
    /// Returns `None` if the provider does not advertise an end-session
    /// endpoint.
    pub fn logout_url(&self) -> Option<String> {
        let end_session_url = self.end_session_url.clone()?;

        debug_assert!(prompt_for(RequestKind::Logout).is_none());

        let mut request = LogoutRequest::from(end_session_url)
            .set_client_id(ClientId::new(self.config.client_id().to_string()));

        if let Ok(post_logout) =
            PostLogoutRedirectUrl::new(self.config.post_logout_redirect_uri().to_string())
        {
            request = request.set_post_logout_redirect_uri(post_logout);
        }

        Some(request.http_get_url().to_string())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }
}

fn http_client() -> Result<reqwest::Client, Report<OidcError>> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| {
            OidcError::Configuration(format!("failed to create HTTP client: {}", e)).into()
        })
}

/// Extracts every claim from the raw ID token of a token response.
///
/// Only called once the token has been validated; the payload is read
/// directly so that non-standard claims such as `upn` are available.
fn claims_from_token_response<TR>(token_response: &TR) -> Result<ClaimSet, Report<OidcError>>
where
    TR: serde::Serialize,
{
    let response_json = serde_json::to_value(token_response).map_err(|e| {
        OidcError::TokenValidation(format!("Failed to serialize token response: {}", e))
    })?;

    let id_token_str = response_json
        .get("id_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| OidcError::TokenValidation("No id_token in response".to_string()))?;

    claims_from_jwt(id_token_str)
}

/// Decodes the payload of a compact JWT into a claim set. Does not verify.
fn claims_from_jwt(jwt: &str) -> Result<ClaimSet, Report<OidcError>> {
    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(OidcError::TokenValidation("Invalid JWT format".to_string()).into());
    }

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| OidcError::TokenValidation(format!("Failed to decode JWT payload: {}", e)))?;

    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| OidcError::TokenValidation(format!("Failed to parse JWT payload: {}", e)))?;

    Ok(ClaimSet::from_json(&payload))
}

/// OIDC-related errors.
#[derive(Debug)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// Token validation failed.
    TokenValidation(String),
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
            Self::TokenExchange(msg) => write!(f, "OIDC token exchange error: {}", msg),
            Self::TokenValidation(msg) => write!(f, "OIDC token validation error: {}", msg),
        }
    }
}

impl std::error::Error for OidcError {}
