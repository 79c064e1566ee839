//! Outbound email for the booking backend: SMTP transport and HTML templates.

pub mod error;
pub mod service;
pub mod templates;

pub use error::MailError;
pub use service::SmtpNotificationService;
pub use templates::{
    render, BookingFallbackAdminEmail, BookingFallbackRequesterEmail, MeetingCancelledEmail,
    MeetingScheduledEmail,
};
