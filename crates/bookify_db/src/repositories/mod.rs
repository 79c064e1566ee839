//! Stores for the Bookify domain documents.
//!
//! Each store is a trait plus a SQL implementation over [`crate::DbClient`].
//! Timestamps persist as unix milliseconds so range filters stay plain
//! integer comparisons under the Any driver.

pub mod admin;
pub mod meeting;
pub mod settings;
pub mod team_member;

pub use admin::{AdminCredential, AdminRepository, SqlAdminRepository};
pub use meeting::{
    Meeting, MeetingFilter, MeetingRepository, MeetingStatus, NewMeeting, SqlMeetingRepository,
};
pub use settings::{Settings, SettingsRepository, SettingsUpdate, SqlSettingsRepository};
pub use team_member::{NewTeamMember, SqlTeamMemberRepository, TeamMember, TeamMemberRepository};

use chrono::{DateTime, Utc};

pub(crate) fn utc_to_ms(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn ms_to_utc(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}
