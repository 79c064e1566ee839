//! Askama HTML templates for the booking notification emails.

use crate::error::MailError;
use askama::Template;

/// Confirmation sent to every participant when the calendar event exists.
#[derive(Template)]
#[template(path = "email/meeting_scheduled.html")]
pub struct MeetingScheduledEmail<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub start_local: &'a str,
    pub end_local: &'a str,
    pub meet_link: Option<&'a str>,
    pub event_link: Option<&'a str>,
    pub message: &'a str,
    /// Everyone this message was sent to; listed in the body so each
    /// participant can see who else was notified.
    pub recipients: &'a [String],
}

/// Raw request dump sent to staff when calendar creation failed.
#[derive(Template)]
#[template(path = "email/booking_fallback_admin.html")]
pub struct BookingFallbackAdminEmail<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub start_local: &'a str,
    pub company_name: Option<&'a str>,
    pub message: &'a str,
    pub guests: &'a [String],
}

/// Soft acknowledgement sent to the requester in the degraded path.
#[derive(Template)]
#[template(path = "email/booking_fallback_requester.html")]
pub struct BookingFallbackRequesterEmail<'a> {
    pub name: &'a str,
    pub start_local: &'a str,
}

/// Notice sent to the requester when an admin cancels the meeting.
#[derive(Template)]
#[template(path = "email/meeting_cancelled.html")]
pub struct MeetingCancelledEmail<'a> {
    pub name: &'a str,
    pub start_local: &'a str,
}

pub fn render<T: Template>(template: &T) -> Result<String, MailError> {
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_email_includes_links_when_present() {
        let recipients = vec![
            "ada@example.com".to_string(),
            "admin@example.com".to_string(),
        ];
        let html = render(&MeetingScheduledEmail {
            name: "Ada",
            email: "ada@example.com",
            start_local: "2024-05-01 10:00 IST",
            end_local: "2024-05-01 10:30 IST",
            meet_link: Some("https://meet.google.com/abc"),
            event_link: Some("https://calendar.google.com/evt"),
            message: "Quarterly sync",
            recipients: &recipients,
        })
        .unwrap();
        assert!(html.contains("Ada"));
        assert!(html.contains("https://meet.google.com/abc"));
        assert!(html.contains("https://calendar.google.com/evt"));
        assert!(html.contains("Quarterly sync"));
    }

    #[test]
    fn scheduled_email_omits_missing_links() {
        let recipients = vec!["ada@example.com".to_string()];
        let html = render(&MeetingScheduledEmail {
            name: "Ada",
            email: "ada@example.com",
            start_local: "2024-05-01 10:00 IST",
            end_local: "2024-05-01 10:30 IST",
            meet_link: None,
            event_link: None,
            message: "",
            recipients: &recipients,
        })
        .unwrap();
        assert!(!html.contains("Join with Google Meet"));
        assert!(!html.contains("View the calendar event"));
        assert!(!html.contains("Notes:"));
    }

    #[test]
    fn scheduled_email_names_every_recipient() {
        let recipients = vec![
            "ada@example.com".to_string(),
            "admin@example.com".to_string(),
            "sam@example.com".to_string(),
        ];
        let html = render(&MeetingScheduledEmail {
            name: "Ada",
            email: "ada@example.com",
            start_local: "2024-05-01 10:00 IST",
            end_local: "2024-05-01 10:30 IST",
            meet_link: None,
            event_link: None,
            message: "",
            recipients: &recipients,
        })
        .unwrap();
        assert!(html.contains("Recipients: ada@example.com, admin@example.com, sam@example.com"));
    }

    #[test]
    fn fallback_admin_email_lists_guests() {
        let guests = vec!["g1@example.com".to_string(), "g2@example.com".to_string()];
        let html = render(&BookingFallbackAdminEmail {
            name: "Ada",
            email: "ada@example.com",
            phone: "+91 99999 00000",
            start_local: "2024-05-01 10:00 IST",
            company_name: Some("Acme"),
            message: "Need a demo",
            guests: &guests,
        })
        .unwrap();
        assert!(html.contains("g1@example.com"));
        assert!(html.contains("g2@example.com"));
        assert!(html.contains("Acme"));
        assert!(html.contains("Manual Scheduling"));
    }

    #[test]
    fn cancellation_email_names_the_slot() {
        let html = render(&MeetingCancelledEmail {
            name: "Ada",
            start_local: "2024-05-01 10:00 IST",
        })
        .unwrap();
        assert!(html.contains("cancelled"));
        assert!(html.contains("2024-05-01 10:00 IST"));
    }
}
