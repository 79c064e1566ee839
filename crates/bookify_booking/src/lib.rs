//! The booking flow: request validation, window computation, calendar
//! creation, persistence, and participant notification.

pub mod handlers;
pub mod logic;
pub mod routes;

pub use handlers::BookingState;
pub use logic::{
    compute_window, dedup_recipients, format_local, BookingOrchestrator, BookingOutcome,
    BookingRequest, MeetingWindow,
};
