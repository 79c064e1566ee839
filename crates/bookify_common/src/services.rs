//! Service abstractions for external services.
//!
//! Trait definitions for the calendar provider and the mail transport.
//! The orchestrator and the admin API depend on these seams rather than on
//! concrete clients, which keeps the booking flow testable with in-process
//! doubles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result.
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Details of a calendar event to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetails {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone name the provider should render the event in.
    pub time_zone: String,
    /// Attendee emails, requester first, deduplicated.
    pub attendees: Vec<String>,
    /// Whether the provider should mail invites to attendees.
    pub send_invites: bool,
}

/// Result of a successful event creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub event_id: String,
    pub hangout_link: Option<String>,
    pub html_link: Option<String>,
}

/// Outcome of a delete call. Deleting an already-gone event is not an
/// error condition for the caller's larger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFoundIgnored,
}

/// A trait for calendar provider operations.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a calendar event, returning its id and links.
    fn create_event(&self, event: EventDetails) -> BoxFuture<'_, CreatedEvent, Self::Error>;

    /// Delete a calendar event by id.
    fn delete_event(&self, event_id: &str) -> BoxFuture<'_, DeleteOutcome, Self::Error>;
}

/// Result of a mail dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailDelivery {
    /// Transport-assigned message id, when the transport reports one.
    pub message_id: Option<String>,
    /// The recipients the message was addressed to.
    pub recipients: Vec<String>,
}

/// A trait for the outbound mail transport.
///
/// Recipients are passed as an already-deduplicated set; the transport
/// serializes them into one addressed call.
pub trait NotificationService: Send + Sync {
    /// Error type returned by mail operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send one HTML message to the full recipient set.
    fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> BoxFuture<'_, MailDelivery, Self::Error>;
}
