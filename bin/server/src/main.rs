use std::sync::Arc;
use stickers_platform_access::Authorizer;
use stickers_server::{
    auth::{AppState, OidcClient, ServerState},
    config::ServerConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // The allow-list is fixed for the lifetime of the process.
    let allow_list = config.valid_upns;
    if allow_list.is_empty() {
        tracing::warn!("VALID_UPNS is empty; every sign-in will be rejected");
    } else {
        tracing::info!(entries = allow_list.len(), "Loaded sign-in allow-list");
    }
    let authorizer = Authorizer::new(allow_list);

    let cookie_key = config
        .session
        .cookie_key()
        .expect("invalid session cookie key");
    let session_duration = config
        .session
        .duration()
        .expect("invalid session duration");

    // Initialize OIDC client
    tracing::info!(authority = %config.oidc.authority(), "Discovering OIDC provider...");
    let oidc_client = OidcClient::discover(config.oidc)
        .await
        .expect("failed to discover OIDC provider");

    let state = ServerState {
        app_state: Arc::new(AppState::new(
            oidc_client,
            authorizer,
            config.session,
            session_duration,
        )),
        cookie_key,
    };

    let app = stickers_server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
