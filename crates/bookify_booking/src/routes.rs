use crate::handlers::{send_mail_handler, BookingState};
use axum::{routing::post, Router};
use bookify_common::services::{CalendarService, NotificationService};

/// The public booking route.
pub fn routes<C, N>(state: BookingState<C, N>) -> Router
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    Router::new()
        .route("/send-mail", post(send_mail_handler::<C, N>))
        .with_state(state)
}
