//! HTTP trigger endpoints for the consent flow.
//!
//! `GET /` redirects to the provider consent page; the provider calls
//! back with a code, which is exchanged for a credential and used to
//! launch one triage pass. The response confirms launch, not completion:
//! individual message failures are observable only through logs.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use serde::Deserialize;
use tracing::error;

use crate::auth::OAuthClient;
use crate::pipeline::Orchestrator;

/// Shared state for the trigger routes.
#[derive(Clone)]
pub struct AppState {
    pub oauth: Arc<OAuthClient>,
    pub orchestrator: Arc<Orchestrator>,
}

/// GET / — redirect the browser to the provider consent page.
async fn consent(State(state): State<AppState>) -> Response {
    match state.oauth.consent_url() {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            error!(error = %e, "Cannot build consent URL");
            (StatusCode::INTERNAL_SERVER_ERROR, "Consent URL misconfigured").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
}

/// GET /oauth/callback — exchange the code and launch a triage pass.
async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code else {
        return (StatusCode::BAD_REQUEST, "Authorization code missing.").into_response();
    };

    let credential = match state.oauth.exchange_code(&code).await {
        Ok(credential) => credential,
        Err(e) => {
            error!(error = %e, "Token exchange failed");
            return (StatusCode::BAD_GATEWAY, "Could not authenticate with the mailbox provider.")
                .into_response();
        }
    };

    match state.orchestrator.launch_pass(credential).await {
        Ok(handle) => {
            // Drain in the background; the caller only waits for launch.
            tokio::spawn(async move {
                handle.wait().await;
            });
            (
                StatusCode::OK,
                "You have successfully authenticated and replies to your inbox are on \
                 their way. You can now close this tab.",
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Triage pass failed to launch");
            (StatusCode::BAD_GATEWAY, "Triage pass failed to start.").into_response()
        }
    }
}

/// Build the trigger routes.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(consent))
        .route("/oauth/callback", get(callback))
        .with_state(state)
}
