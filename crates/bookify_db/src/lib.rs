//! Persistent stores for Bookify
//!
//! A database-agnostic layer over SQLx's Any driver (SQLite by default)
//! holding the four Bookify document stores: administrator credentials, the
//! singleton settings row, the team directory, and meeting records.

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::{
    AdminCredential, AdminRepository, Meeting, MeetingFilter, MeetingRepository, MeetingStatus,
    NewMeeting, NewTeamMember, Settings, SettingsRepository, SettingsUpdate, SqlAdminRepository,
    SqlMeetingRepository, SqlSettingsRepository, SqlTeamMemberRepository, TeamMember,
    TeamMemberRepository,
};
