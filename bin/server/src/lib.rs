//! stickers web server.
//!
//! Signs users in against a single OpenID Connect tenant, admits only the
//! identities in the configured allow-list, and keeps them signed in with an
//! encrypted session cookie.

pub mod auth;
pub mod config;
pub mod pages;

use auth::ServerState;
use axum::{Router, routing::get};
use stickers_platform_access::INVALID_USER_PATH;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/healthz", get(pages::healthz))
        .route(INVALID_USER_PATH, get(pages::invalid_user))
        // Auth routes
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
