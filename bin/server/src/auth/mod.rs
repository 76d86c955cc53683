//! Authentication module for the stickers server.
//!
//! This module provides:
//! - OIDC authentication against the single configured tenant
//! - Allow-list authorization of every sign-in before a session is issued
//! - Encrypted cookie sessions and extractors for Axum routes
//!
//! # Sign-in flow
//!
//! `Unauthenticated -> TokenReceived -> TokenValidated -> [allow-list] ->
//! SessionEstablished | RedirectedToInvalidUser`. Protocol and token
//! validation failures end the request before the allow-list is consulted.

pub mod middleware;
pub mod oidc;
pub mod routes;

use crate::config::SessionConfig;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use chrono::TimeDelta;
use std::sync::Arc;
use stickers_platform_access::Authorizer;

pub use middleware::RequireSession;
pub use oidc::OidcClient;
pub use routes::{callback, login, logout};

/// Session cookie name.
pub(crate) const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (for CSRF protection during OIDC flow).
pub(crate) const AUTH_STATE_COOKIE: &str = "auth_state";

/// Shared application state.
pub struct AppState {
    /// OIDC client for authentication.
    pub oidc_client: OidcClient,
    /// Allow-list authorizer applied after token validation.
    pub authorizer: Authorizer,
    /// Session configuration.
    pub session_config: SessionConfig,
    /// Checked lifetime of new sessions, from [`SessionConfig::duration`].
    pub session_duration: TimeDelta,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        oidc_client: OidcClient,
        authorizer: Authorizer,
        session_config: SessionConfig,
        session_duration: TimeDelta,
    ) -> Self {
        Self {
            oidc_client,
            authorizer,
            session_config,
            session_duration,
        }
    }
}

/// Router state: the shared application state plus the cookie key.
#[derive(Clone)]
pub struct ServerState {
    pub app_state: Arc<AppState>,
    pub cookie_key: Key,
}

impl FromRef<ServerState> for Arc<AppState> {
    fn from_ref(state: &ServerState) -> Self {
        state.app_state.clone()
    }
}

impl FromRef<ServerState> for Key {
    fn from_ref(state: &ServerState) -> Self {
        state.cookie_key.clone()
    }
}
