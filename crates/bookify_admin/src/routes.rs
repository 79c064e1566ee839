use crate::handlers::{
    cancel_meeting_handler, delete_meeting_handler, login_handler, meetings_list_handler,
    profile_handler, require_admin, settings_get_handler, settings_put_handler,
    team_create_handler, team_delete_handler, team_list_handler, update_email_handler,
    update_password_handler, AdminState,
};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use bookify_common::services::{CalendarService, NotificationService};

/// The admin API under /admin. Everything except login sits behind the
/// bearer-token middleware.
pub fn routes<C, N>(state: AdminState<C, N>) -> Router
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let protected = Router::new()
        .route("/admin/profile", get(profile_handler))
        .route("/admin/update-email", put(update_email_handler::<C, N>))
        .route("/admin/update-password", put(update_password_handler::<C, N>))
        .route("/admin/settings", get(settings_get_handler::<C, N>))
        .route("/admin/settings", put(settings_put_handler::<C, N>))
        .route("/admin/meetings", get(meetings_list_handler::<C, N>))
        .route("/admin/delete-meeting/{id}", delete(delete_meeting_handler::<C, N>))
        .route("/admin/cancel-meeting/{id}", post(cancel_meeting_handler::<C, N>))
        .route("/admin/team", get(team_list_handler::<C, N>))
        .route("/admin/team", post(team_create_handler::<C, N>))
        .route("/admin/team/{id}", delete(team_delete_handler::<C, N>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin::<C, N>,
        ));

    Router::new()
        .route("/admin/login", post(login_handler::<C, N>))
        .merge(protected)
        .with_state(state)
}
