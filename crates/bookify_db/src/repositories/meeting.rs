//! Store for booking attempts and their calendar/email outcome.
//!
//! Every booking attempt creates a row, whether or not the calendar call
//! succeeded; the link columns are empty on the fallback path. Invariant:
//! `start < end` for every persisted row.

use crate::error::DbError;
use crate::repositories::{ms_to_utc, utc_to_ms};
use crate::DbClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle state of a meeting record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Scheduled,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(MeetingStatus::Scheduled),
            "cancelled" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }
}

/// A persisted booking attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    /// Ordered, deduplicated attendee emails, requester first.
    pub attendees: Vec<String>,
    pub company_name: Option<String>,
    pub industries: Option<String>,
    pub job_titles: Option<String>,
    pub priority: Option<String>,
    pub monthly_contacts: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
    pub hangout_link: Option<String>,
    pub html_link: Option<String>,
    pub event_id: Option<String>,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a booking attempt.
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub attendees: Vec<String>,
    pub company_name: Option<String>,
    pub industries: Option<String>,
    pub job_titles: Option<String>,
    pub priority: Option<String>,
    pub monthly_contacts: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
    pub hangout_link: Option<String>,
    pub html_link: Option<String>,
    pub event_id: Option<String>,
}

/// Filters for listing meetings; all present filters apply conjunctively.
#[derive(Debug, Clone, Default)]
pub struct MeetingFilter {
    /// Case-insensitive substring over name and email.
    pub search: Option<String>,
    /// Inclusive lower bound on `start`.
    pub start_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `start`.
    pub start_to: Option<DateTime<Utc>>,
    pub status: Option<MeetingStatus>,
}

/// Store interface for meeting records.
pub trait MeetingRepository {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn create(
        &self,
        meeting: NewMeeting,
    ) -> impl std::future::Future<Output = Result<Meeting, DbError>> + Send;

    fn find_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Meeting>, DbError>> + Send;

    /// List meetings matching the filter, sorted by start ascending.
    fn list(
        &self,
        filter: &MeetingFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Meeting>, DbError>> + Send;

    fn set_status(
        &self,
        id: &str,
        status: MeetingStatus,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Returns false when no row matched the id.
    fn delete(&self, id: &str) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<i64, DbError>> + Send;
}

/// SQL implementation of the meeting store.
#[derive(Debug, Clone)]
pub struct SqlMeetingRepository {
    db_client: DbClient,
}

impl SqlMeetingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn row_to_meeting(row: &sqlx::any::AnyRow) -> Result<Meeting, DbError> {
        let attendees_json: String = row.try_get("attendees").map_err(DbError::from)?;
        let attendees: Vec<String> = serde_json::from_str(&attendees_json)
            .map_err(|e| DbError::QueryError(format!("bad attendees column: {}", e)))?;
        let status_text: String = row.try_get("status").map_err(DbError::from)?;
        let status = MeetingStatus::parse(&status_text)
            .ok_or_else(|| DbError::QueryError(format!("bad status column: {}", status_text)))?;

        Ok(Meeting {
            id: row.try_get("id").map_err(DbError::from)?,
            name: row.try_get("name").map_err(DbError::from)?,
            email: row.try_get("email").map_err(DbError::from)?,
            phone: row.try_get("phone").map_err(DbError::from)?,
            message: row.try_get("message").map_err(DbError::from)?,
            attendees,
            company_name: row.try_get("company_name").map_err(DbError::from)?,
            industries: row.try_get("industries").map_err(DbError::from)?,
            job_titles: row.try_get("job_titles").map_err(DbError::from)?,
            priority: row.try_get("priority").map_err(DbError::from)?,
            monthly_contacts: row.try_get("monthly_contacts").map_err(DbError::from)?,
            start: ms_to_utc(row.try_get("start_ms").map_err(DbError::from)?),
            end: ms_to_utc(row.try_get("end_ms").map_err(DbError::from)?),
            time_zone: row.try_get("time_zone").map_err(DbError::from)?,
            hangout_link: row.try_get("hangout_link").map_err(DbError::from)?,
            html_link: row.try_get("html_link").map_err(DbError::from)?,
            event_id: row.try_get("event_id").map_err(DbError::from)?,
            status,
            created_at: ms_to_utc(row.try_get("created_at_ms").map_err(DbError::from)?),
        })
    }
}

const MEETING_COLUMNS: &str = "id, name, email, phone, message, attendees, company_name, \
     industries, job_titles, priority, monthly_contacts, start_ms, end_ms, time_zone, \
     hangout_link, html_link, event_id, status, created_at_ms";

impl MeetingRepository for SqlMeetingRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing meeting schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS meetings (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                message TEXT,
                attendees TEXT NOT NULL DEFAULT '[]',
                company_name TEXT,
                industries TEXT,
                job_titles TEXT,
                priority TEXT,
                monthly_contacts TEXT,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL,
                time_zone TEXT NOT NULL DEFAULT 'Asia/Kolkata',
                hangout_link TEXT,
                html_link TEXT,
                event_id TEXT,
                status TEXT NOT NULL DEFAULT 'scheduled',
                created_at_ms INTEGER NOT NULL,
                CHECK (start_ms < end_ms)
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn create(&self, meeting: NewMeeting) -> Result<Meeting, DbError> {
        let attendees_json = serde_json::to_string(&meeting.attendees)
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let created = Meeting {
            id: Uuid::new_v4().to_string(),
            name: meeting.name,
            email: meeting.email,
            phone: meeting.phone,
            message: meeting.message,
            attendees: meeting.attendees,
            company_name: meeting.company_name,
            industries: meeting.industries,
            job_titles: meeting.job_titles,
            priority: meeting.priority,
            monthly_contacts: meeting.monthly_contacts,
            start: meeting.start,
            end: meeting.end,
            time_zone: meeting.time_zone,
            hangout_link: meeting.hangout_link,
            html_link: meeting.html_link,
            event_id: meeting.event_id,
            status: MeetingStatus::Scheduled,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO meetings (id, name, email, phone, message, attendees, company_name,
                industries, job_titles, priority, monthly_contacts, start_ms, end_ms, time_zone,
                hangout_link, html_link, event_id, status, created_at_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(&created.id)
        .bind(&created.name)
        .bind(&created.email)
        .bind(created.phone.as_deref())
        .bind(created.message.as_deref())
        .bind(&attendees_json)
        .bind(created.company_name.as_deref())
        .bind(created.industries.as_deref())
        .bind(created.job_titles.as_deref())
        .bind(created.priority.as_deref())
        .bind(created.monthly_contacts.as_deref())
        .bind(utc_to_ms(created.start))
        .bind(utc_to_ms(created.end))
        .bind(&created.time_zone)
        .bind(created.hangout_link.as_deref())
        .bind(created.html_link.as_deref())
        .bind(created.event_id.as_deref())
        .bind(created.status.as_str())
        .bind(utc_to_ms(created.created_at))
        .execute(self.db_client.pool())
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Meeting>, DbError> {
        let sql = format!("SELECT {} FROM meetings WHERE id = $1", MEETING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await?;

        row.as_ref().map(Self::row_to_meeting).transpose()
    }

    async fn list(&self, filter: &MeetingFilter) -> Result<Vec<Meeting>, DbError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut placeholder = 0;
        let mut next = || {
            placeholder += 1;
            format!("${}", placeholder)
        };

        if filter.search.is_some() {
            let a = next();
            let b = next();
            clauses.push(format!(
                "(LOWER(name) LIKE {} ESCAPE '\\' OR LOWER(email) LIKE {} ESCAPE '\\')",
                a, b
            ));
        }
        if filter.start_from.is_some() {
            clauses.push(format!("start_ms >= {}", next()));
        }
        if filter.start_to.is_some() {
            clauses.push(format!("start_ms <= {}", next()));
        }
        if filter.status.is_some() {
            clauses.push(format!("status = {}", next()));
        }

        let mut sql = format!("SELECT {} FROM meetings", MEETING_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY start_ms ASC");

        let mut query = sqlx::query(&sql);
        if let Some(search) = &filter.search {
            // The term is a literal substring: LIKE wildcards in it are escaped.
            let escaped = search
                .to_lowercase()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            let pattern = format!("%{}%", escaped);
            query = query.bind(pattern.clone()).bind(pattern);
        }
        if let Some(from) = filter.start_from {
            query = query.bind(utc_to_ms(from));
        }
        if let Some(to) = filter.start_to {
            query = query.bind(utc_to_ms(to));
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }

        let rows = query.fetch_all(self.db_client.pool()).await?;
        rows.iter().map(Self::row_to_meeting).collect()
    }

    async fn set_status(&self, id: &str, status: MeetingStatus) -> Result<(), DbError> {
        sqlx::query("UPDATE meetings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(self.db_client.pool())
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM meetings WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM meetings")
            .fetch_one(self.db_client.pool())
            .await?;
        row.try_get("n").map_err(DbError::from)
    }
}
