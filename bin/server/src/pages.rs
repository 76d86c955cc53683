//! Server-rendered pages.

use axum::{extract::Query, response::Html};
use leptos::prelude::*;
use serde::Deserialize;
use stickers_platform_access::Session;

use crate::auth::RequireSession;

/// Query parameters of the invalid-user page.
#[derive(Debug, Deserialize)]
pub struct InvalidUserQuery {
    #[serde(default)]
    upn: String,
}

/// Wraps page content in the document shell and renders it.
fn render_page(title: &'static str, content: impl IntoView + 'static) -> Html<String> {
    let document = view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <title>{title}</title>
            </head>
            <body>
                <main>{content}</main>
            </body>
        </html>
    };
    Html(document.to_html())
}

/// Landing page for signed-in users.
pub async fn home(RequireSession(session): RequireSession) -> Html<String> {
    render_page("Stickers", home_view(&session))
}

fn home_view(session: &Session) -> impl IntoView + 'static {
    let name = session
        .display_name()
        .unwrap_or(session.identity())
        .to_string();
    let identity = session.identity().to_string();

    view! {
        <h1>"Welcome, " {name}</h1>
        <p>"Signed in as " <strong>{identity}</strong></p>
        <p><a href="/auth/logout">"Sign out"</a></p>
    }
}

/// Shown after the allow-list rejected a sign-in.
pub async fn invalid_user(Query(query): Query<InvalidUserQuery>) -> Html<String> {
    render_page("Access denied", invalid_user_view(query.upn))
}

fn invalid_user_view(upn: String) -> impl IntoView + 'static {
    let account = if upn.trim().is_empty() {
        "Your account".to_string()
    } else {
        format!("The account {upn}")
    };

    view! {
        <h1>"Access denied"</h1>
        <p>{account} " is not allowed to use this application."</p>
        <p>"Ask an administrator to add it, or "<a href="/auth/login">"sign in with a different account"</a>"."</p>
    }
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}
