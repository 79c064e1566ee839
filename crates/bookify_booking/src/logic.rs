//! Booking orchestration.
//!
//! Validates the inbound request, computes the meeting window, attempts
//! calendar-event creation, persists the attempt, and fans out notifications.
//! The calendar call is the only step that changes the shape of the outcome:
//! persistence and mail are best-effort side channels that are logged and
//! never escalate into a booking failure.

use bookify_common::error::{validation_error, BookifyError};
use bookify_common::services::{CalendarService, EventDetails, NotificationService};
use bookify_config::{AdminConfig, BookingConfig};
use bookify_db::repositories::{
    MeetingRepository, NewMeeting, Settings, SettingsRepository, SqlMeetingRepository,
    SqlSettingsRepository, SqlTeamMemberRepository, TeamMemberRepository,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// The public booking form payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub meeting_date: Option<String>,
    #[serde(default)]
    pub meeting_time: Option<String>,
    /// Extra guest emails supplied by the form.
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industries: Option<String>,
    #[serde(default)]
    pub job_titles: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub monthly_contacts: Option<String>,
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map(str::trim).unwrap_or("").is_empty()
}

impl BookingRequest {
    /// Check the required fields. Has no side effects; the orchestrator
    /// touches no store before this passes.
    pub fn validate(&self) -> Result<(), BookifyError> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push("name");
        }
        if is_blank(&self.email) {
            missing.push("email");
        }
        if is_blank(&self.meeting_date) {
            missing.push("meetingDate");
        }
        if is_blank(&self.meeting_time) {
            missing.push("meetingTime");
        }
        if is_blank(&self.message) {
            missing.push("message");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(validation_error(&format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Guest emails with blanks dropped and whitespace trimmed.
    fn guests(&self) -> Vec<String> {
        self.attendees
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect()
    }
}

/// The computed meeting time window.
#[derive(Debug, Clone, Copy)]
pub struct MeetingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// True when the requested date/time could not be parsed and the window
    /// was substituted with now + 1 hour.
    pub substituted: bool,
}

/// Parse `date` ("%Y-%m-%d") and `time` ("%H:%M") in the given zone. An
/// unparseable input yields a window starting one hour from now; the
/// substitution is surfaced through `substituted` and in the response times
/// rather than silently, so the requester can see what was booked.
pub fn compute_window(
    date: &str,
    time: &str,
    time_zone: Tz,
    duration_minutes: i64,
) -> MeetingWindow {
    let parsed = chrono::NaiveDateTime::parse_from_str(
        &format!("{} {}", date.trim(), time.trim()),
        "%Y-%m-%d %H:%M",
    )
    .ok()
    .and_then(|naive| time_zone.from_local_datetime(&naive).earliest())
    .map(|local| local.with_timezone(&Utc));

    let (start, substituted) = match parsed {
        Some(start) => (start, false),
        None => (Utc::now() + Duration::hours(1), true),
    };

    MeetingWindow {
        start,
        end: start + Duration::minutes(duration_minutes),
        substituted,
    }
}

/// Deduplicate emails case-insensitively, keeping the first occurrence and
/// its original casing. Order is stable.
pub fn dedup_recipients<I>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for email in emails {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Format an instant in the booking zone for responses and email bodies.
pub fn format_local(instant: DateTime<Utc>, time_zone: Tz) -> String {
    instant
        .with_timezone(&time_zone)
        .format("%Y-%m-%d %H:%M %Z")
        .to_string()
}

/// The response body for a booking attempt. Both the linked and unlinked
/// paths report success; the links distinguish them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_link: Option<String>,
    pub admin_email: Option<String>,
    pub start: String,
    pub end: String,
}

/// Coordinates the booking flow across the calendar gateway, the stores,
/// and the mail transport.
pub struct BookingOrchestrator<C, N> {
    calendar: Arc<C>,
    mailer: Arc<N>,
    meetings: SqlMeetingRepository,
    settings: SqlSettingsRepository,
    team: SqlTeamMemberRepository,
    booking: BookingConfig,
    /// Address booking notifications fall back to when settings carry none.
    notify_email: Option<String>,
}

impl<C, N> BookingOrchestrator<C, N>
where
    C: CalendarService,
    N: NotificationService,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calendar: Arc<C>,
        mailer: Arc<N>,
        meetings: SqlMeetingRepository,
        settings: SqlSettingsRepository,
        team: SqlTeamMemberRepository,
        booking: BookingConfig,
        admin: &AdminConfig,
    ) -> Self {
        Self {
            calendar,
            mailer,
            meetings,
            settings,
            team,
            booking,
            notify_email: admin.notify_email.clone(),
        }
    }

    fn time_zone(&self) -> Tz {
        match self.booking.time_zone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                warn!(
                    zone = %self.booking.time_zone,
                    "Unknown booking time zone, falling back to Asia/Kolkata"
                );
                chrono_tz::Asia::Kolkata
            }
        }
    }

    /// Read the settings row, falling back to configured defaults when the
    /// store is unavailable. A storage hiccup must not block the calendar
    /// call or email delivery.
    async fn load_settings(&self) -> Settings {
        match self
            .settings
            .get_or_create(
                self.notify_email.as_deref(),
                self.booking.default_duration_minutes,
            )
            .await
        {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Settings store unavailable, using configured defaults: {}", e);
                Settings {
                    admin_email: self.notify_email.clone(),
                    default_duration_minutes: self.booking.default_duration_minutes,
                    send_invites: true,
                    mail_sender: None,
                }
            }
        }
    }

    async fn team_emails(&self) -> Vec<String> {
        match self.team.list().await {
            Ok(members) => members.into_iter().map(|m| m.email).collect(),
            Err(e) => {
                warn!("Team store unavailable, notifying without team: {}", e);
                Vec::new()
            }
        }
    }

    async fn persist_attempt(&self, meeting: NewMeeting) {
        if let Err(e) = self.meetings.create(meeting).await {
            warn!("Failed to persist booking attempt: {}", e);
        }
    }

    async fn notify(&self, recipients: &[String], subject: &str, html: &str) {
        if recipients.is_empty() {
            return;
        }
        if let Err(e) = self.mailer.send(recipients, subject, html).await {
            warn!(subject, "Notification send failed: {}", e);
        }
    }

    /// Run one booking attempt end to end.
    pub async fn book(&self, request: BookingRequest) -> Result<BookingOutcome, BookifyError> {
        request.validate()?;

        // Validated above.
        let name = request.name.clone().unwrap_or_default();
        let requester = request.email.clone().unwrap_or_default();
        let message = request.message.clone().unwrap_or_default();
        let date = request.meeting_date.clone().unwrap_or_default();
        let time = request.meeting_time.clone().unwrap_or_default();

        let settings = self.load_settings().await;
        let time_zone = self.time_zone();
        let window = compute_window(&date, &time, time_zone, settings.default_duration_minutes);
        if window.substituted {
            warn!(
                date = %date,
                time = %time,
                "Unparseable meeting date/time, substituting now + 1 hour"
            );
        }

        let guests = request.guests();
        let event_attendees = dedup_recipients(
            std::iter::once(requester.clone()).chain(guests.iter().cloned()),
        );

        let details = EventDetails {
            summary: format!("Meeting with {}", name),
            description: Some(message.clone()),
            start: window.start,
            end: window.end,
            time_zone: time_zone.name().to_string(),
            attendees: event_attendees.clone(),
            send_invites: settings.send_invites,
        };

        let start_local = format_local(window.start, time_zone);
        let end_local = format_local(window.end, time_zone);

        let mut record = NewMeeting {
            name: name.clone(),
            email: requester.clone(),
            phone: request.phone.clone(),
            message: request.message.clone(),
            attendees: event_attendees,
            company_name: request.company_name.clone(),
            industries: request.industries.clone(),
            job_titles: request.job_titles.clone(),
            priority: request.priority.clone(),
            monthly_contacts: request.monthly_contacts.clone(),
            start: window.start,
            end: window.end,
            time_zone: time_zone.name().to_string(),
            hangout_link: None,
            html_link: None,
            event_id: None,
        };

        match self.calendar.create_event(details).await {
            Ok(created) => {
                info!(event_id = %created.event_id, "Calendar event created");
                record.hangout_link = created.hangout_link.clone();
                record.html_link = created.html_link.clone();
                record.event_id = Some(created.event_id);
                self.persist_attempt(record).await;

                let recipients = dedup_recipients(
                    std::iter::once(requester.clone())
                        .chain(settings.admin_email.iter().cloned())
                        .chain(self.team_emails().await)
                        .chain(guests),
                );
                let body = bookify_mail::render(&bookify_mail::MeetingScheduledEmail {
                    name: &name,
                    email: &requester,
                    start_local: &start_local,
                    end_local: &end_local,
                    meet_link: created.hangout_link.as_deref(),
                    event_link: created.html_link.as_deref(),
                    message: &message,
                    recipients: &recipients,
                });
                match body {
                    Ok(html) => self.notify(&recipients, "Meeting Scheduled", &html).await,
                    Err(e) => warn!("Failed to render confirmation email: {}", e),
                }

                Ok(BookingOutcome {
                    success: true,
                    message: "Meeting scheduled successfully".to_string(),
                    meet_link: created.hangout_link,
                    event_link: created.html_link,
                    admin_email: settings.admin_email,
                    start: start_local,
                    end: end_local,
                })
            }
            Err(e) => {
                warn!("Calendar event creation failed, entering fallback: {}", e);
                self.persist_attempt(record).await;

                let staff = dedup_recipients(
                    settings
                        .admin_email
                        .iter()
                        .cloned()
                        .chain(self.team_emails().await),
                );
                let admin_body = bookify_mail::render(&bookify_mail::BookingFallbackAdminEmail {
                    name: &name,
                    email: &requester,
                    phone: request.phone.as_deref().unwrap_or(""),
                    start_local: &start_local,
                    company_name: request.company_name.as_deref(),
                    message: &message,
                    guests: &guests,
                });
                match admin_body {
                    Ok(html) => {
                        self.notify(&staff, "Meeting Request Needs Manual Scheduling", &html)
                            .await
                    }
                    Err(e) => warn!("Failed to render fallback staff email: {}", e),
                }

                let requester_body =
                    bookify_mail::render(&bookify_mail::BookingFallbackRequesterEmail {
                        name: &name,
                        start_local: &start_local,
                    });
                match requester_body {
                    Ok(html) => {
                        self.notify(
                            &[requester],
                            "We Received Your Meeting Request",
                            &html,
                        )
                        .await
                    }
                    Err(e) => warn!("Failed to render fallback requester email: {}", e),
                }

                Ok(BookingOutcome {
                    success: true,
                    message: "Your meeting request has been received; our team will confirm the slot shortly"
                        .to_string(),
                    meet_link: None,
                    event_link: None,
                    admin_email: settings.admin_email,
                    start: start_local,
                    end: end_local,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_reports_every_missing_field() {
        let request = BookingRequest {
            email: Some("ada@example.com".to_string()),
            meeting_time: Some("  ".to_string()),
            ..Default::default()
        };
        let err = request.validate().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("name"));
        assert!(text.contains("meetingDate"));
        assert!(text.contains("meetingTime"));
        assert!(text.contains("message"));
        assert!(!text.contains("email"));
    }

    #[test]
    fn window_is_computed_in_the_booking_zone() {
        let window = compute_window("2024-05-01", "10:00", chrono_tz::Asia::Kolkata, 30);
        assert!(!window.substituted);
        // 10:00 IST is 04:30 UTC.
        assert_eq!(window.start.to_rfc3339(), "2024-05-01T04:30:00+00:00");
        assert_eq!(window.end - window.start, Duration::minutes(30));
    }

    #[test]
    fn unparseable_window_substitutes_an_hour_from_now() {
        let before = Utc::now();
        let window = compute_window("not-a-date", "10:00", chrono_tz::Asia::Kolkata, 45);
        assert!(window.substituted);
        assert!(window.start >= before + Duration::minutes(59));
        assert!(window.start <= Utc::now() + Duration::minutes(61));
        assert_eq!(window.end - window.start, Duration::minutes(45));
    }

    #[test]
    fn recipient_dedup_is_case_insensitive_and_order_stable() {
        let recipients = dedup_recipients(
            [
                "Ada@Example.com",
                "team@example.com",
                "ada@example.com",
                "",
                " guest@example.com ",
                "TEAM@example.com",
            ]
            .into_iter()
            .map(String::from),
        );
        assert_eq!(
            recipients,
            vec!["Ada@Example.com", "team@example.com", "guest@example.com"]
        );
    }

    #[test]
    fn local_formatting_uses_the_zone_abbreviation() {
        let window = compute_window("2024-05-01", "10:00", chrono_tz::Asia::Kolkata, 30);
        let formatted = format_local(window.start, chrono_tz::Asia::Kolkata);
        assert_eq!(formatted, "2024-05-01 10:00 IST");
    }
}
