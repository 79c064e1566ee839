use crate::logic::{BookingOrchestrator, BookingRequest};
use axum::{extract::State, response::Response, Json};
use bookify_common::handle_json_result;
use bookify_common::services::{CalendarService, NotificationService};
use std::sync::Arc;

/// Shared state for the public booking route.
pub struct BookingState<C, N> {
    pub orchestrator: Arc<BookingOrchestrator<C, N>>,
}

impl<C, N> Clone for BookingState<C, N> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
        }
    }
}

/// POST /send-mail - accept a booking request from the public form.
pub async fn send_mail_handler<C, N>(
    State(state): State<BookingState<C, N>>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<crate::logic::BookingOutcome>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    handle_json_result(state.orchestrator.book(request).await)
}
