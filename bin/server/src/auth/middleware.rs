//! Session extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use std::sync::Arc;
use stickers_platform_access::{AuthenticationError, AuthorizationError, Session};

use super::{AppState, SESSION_COOKIE};

/// Extractor for requiring a signed-in user.
///
/// If there is no valid session, the user is redirected to the login route.
pub struct RequireSession(pub Session);

impl<S> FromRequestParts<S> for RequireSession
where
    Arc<AppState>: FromRef<S>,
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::InternalError)?;

        let session_cookie = jar
            .get(SESSION_COOKIE)
            .ok_or(AuthRejection::NotAuthenticated)?;

        let session = Session::from_ticket(session_cookie.value()).map_err(|e| {
            tracing::debug!(error = ?e, "discarding undecodable session cookie");
            AuthRejection::NotAuthenticated
        })?;

        if session.is_expired() {
            let err = AuthenticationError::SessionExpired {
                session_id: session.id().to_string(),
            };
            tracing::debug!(error = %err, "session rejected");
            return Err(AuthRejection::SessionExpired);
        }

        // The allow-list may have changed since the cookie was issued.
        if !app_state.authorizer.permits(session.identity()) {
            let err = AuthorizationError::NotAllowListed {
                identity: session.identity().to_string(),
            };
            tracing::warn!(error = %err, session_id = %session.id(), "session rejected");
            return Err(AuthRejection::AccessDenied);
        }

        Ok(RequireSession(session))
    }
}

/// Rejection type for session extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
    SessionExpired,
    AccessDenied,
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated | Self::SessionExpired => {
                Redirect::to("/auth/login").into_response()
            }
            Self::AccessDenied => (
                StatusCode::FORBIDDEN,
                "Access denied - you are not authorized to use this application",
            )
                .into_response(),
            Self::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
