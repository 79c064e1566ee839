use crate::gateway::GoogleCalendarGateway;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for the Google OAuth routes.
#[derive(Clone)]
pub struct GcalState {
    pub gateway: Arc<GoogleCalendarGateway>,
}

#[derive(Deserialize, Debug)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /gcal/auth - redirect the browser to the Google consent screen.
pub async fn auth_handler(State(state): State<GcalState>) -> Response {
    match state.gateway.auth_url() {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            error!("Cannot build Google consent URL: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Google OAuth is not configured" })),
            )
                .into_response()
        }
    }
}

/// GET /gcal/oauth2callback - exchange the authorization code for tokens.
pub async fn oauth_callback_handler(
    State(state): State<GcalState>,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    if let Some(error) = params.error {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": format!("Google authorization failed: {}", error) })),
        )
            .into_response();
    }

    let Some(code) = params.code else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Missing authorization code" })),
        )
            .into_response();
    };

    match state.gateway.exchange_code(&code).await {
        Ok(()) => {
            info!("Google account linked");
            Json(json!({ "message": "Google account linked successfully" })).into_response()
        }
        Err(e) => {
            error!("OAuth code exchange failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": "Token exchange with Google failed" })),
            )
                .into_response()
        }
    }
}

/// GET /gcal/revoke - revoke and forget the stored tokens.
pub async fn revoke_handler(State(state): State<GcalState>) -> Response {
    match state.gateway.revoke().await {
        Ok(()) => Json(json!({ "message": "Google account unlinked" })).into_response(),
        Err(e) => {
            error!("Failed to clear Google tokens: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to unlink Google account" })),
            )
                .into_response()
        }
    }
}

/// GET /gcal/status - report whether a Google account is linked.
pub async fn status_handler(State(state): State<GcalState>) -> Response {
    let status = state.gateway.token_store().status().await;
    Json(status).into_response()
}
