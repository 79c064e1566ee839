use crate::handlers::{auth_handler, oauth_callback_handler, revoke_handler, status_handler, GcalState};
use axum::{routing::get, Router};

/// Routes for the Google OAuth lifecycle, nested under /gcal.
pub fn routes(state: GcalState) -> Router {
    Router::new()
        .route("/gcal/auth", get(auth_handler))
        .route("/gcal/oauth2callback", get(oauth_callback_handler))
        .route("/gcal/revoke", get(revoke_handler))
        .route("/gcal/status", get(status_handler))
        .with_state(state)
}
