//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use stickers_platform_access::{
    AuthenticationError, ClaimSet, Decision, Session, claim_type, invalid_user_location,
};
use time::Duration as TimeDuration;

use super::{AUTH_STATE_COOKIE, AppState, SESSION_COOKIE, oidc::AuthState};

/// Query parameters for the OIDC callback.
///
/// The provider sends either `code` and `state`, or `error`.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (auth_url, auth_state) = state.oidc_client.authorization_url();

    // Store the auth state in an encrypted cookie for validation on callback
    let auth_state_json = serde_json::to_string(&auth_state)
        .map_err(|e| AuthError::Session(format!("failed to serialize auth state: {e}")))?;

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    Ok((jar.add(cookie), Redirect::to(&auth_url)))
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(error) = query.error {
        return Err(AuthError::Provider(AuthenticationError::ProviderError {
            provider: state.oidc_client.config().authority(),
            reason: match query.error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            },
        }));
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Err(AuthError::MissingCode);
    };

    // Retrieve and validate auth state from cookie
    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;

    let auth_state: AuthState =
        serde_json::from_str(auth_state_cookie.value()).map_err(|_| AuthError::InvalidAuthState)?;

    // Validate CSRF token
    if returned_state != auth_state.csrf_token {
        return Err(AuthError::CsrfMismatch);
    }

    // Exchange the authorization code for a validated ID token
    let token_result = state
        .oidc_client
        .exchange_code(&code, &auth_state)
        .await
        .map_err(|e| AuthError::TokenExchange(format!("{e:?}")))?;

    complete_sign_in(&state, &token_result.claims, jar)
}

/// Applies the allow-list to validated claims and issues the session.
///
/// On rejection no session cookie is written (an existing one is removed)
/// and the browser is sent to the invalid-user page.
pub(crate) fn complete_sign_in(
    state: &AppState,
    claims: &ClaimSet,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), AuthError> {
    let jar = jar.remove(Cookie::build(AUTH_STATE_COOKIE).path("/"));

    let identity = match state.authorizer.authorize(claims) {
        Decision::Allow { identity } => identity,
        Decision::Reject { identity } => {
            let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
            return Ok((jar, Redirect::to(&invalid_user_location(&identity))));
        }
    };

    let subject = claims.subject().ok_or_else(|| {
        AuthError::Authentication(AuthenticationError::MissingClaim {
            claim: claim_type::SUBJECT.to_string(),
        })
    })?;

    let session_duration = state.session_duration;
    let session = Session::new(subject.to_string(), identity, session_duration)
    .with_display_name(claims.display_name().map(str::to_string));

    let ticket = session
        .to_ticket()
        .map_err(|e| AuthError::Session(format!("{e:?}")))?;

    // Set session cookie
    let session_cookie = Cookie::build((SESSION_COOKIE, ticket))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(session_duration.num_seconds()));

    tracing::info!(
        session_id = %session.id(),
        identity = session.identity(),
        "session established"
    );

    Ok((jar.add(session_cookie), Redirect::to("/")))
}

/// Logs out the user by removing their session and signing out at the provider.
pub async fn logout(State(state): State<Arc<AppState>>, jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));

    match state.oidc_client.logout_url() {
        Some(url) => (jar, Redirect::to(&url)),
        None => (jar, Redirect::to("/")),
    }
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    MissingCode,
    MissingAuthState,
    InvalidAuthState,
    CsrfMismatch,
    Provider(AuthenticationError),
    Authentication(AuthenticationError),
    TokenExchange(String),
    Session(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingCode => (StatusCode::BAD_REQUEST, "Missing authorization code"),
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::Provider(err) => {
                tracing::warn!(error = %err, "Identity provider returned an error");
                (StatusCode::UNAUTHORIZED, "Sign-in was not completed")
            }
            Self::Authentication(err) => {
                tracing::error!(error = %err, "Authentication failed");
                (StatusCode::UNAUTHORIZED, "Authentication failed")
            }
            Self::TokenExchange(msg) => {
                tracing::error!("Token exchange failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
            Self::Session(msg) => {
                tracing::error!("Session error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
