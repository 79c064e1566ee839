//! Store for the team directory.
//!
//! Team members supply the extra notification recipients for every booking;
//! their lifecycle is independent from meetings.

use crate::error::DbError;
use crate::repositories::{ms_to_utc, utc_to_ms};
use crate::DbClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

/// A team member receiving booking notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a team member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Store interface for the team directory.
pub trait TeamMemberRepository {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn list(&self) -> impl std::future::Future<Output = Result<Vec<TeamMember>, DbError>> + Send;

    fn create(
        &self,
        member: NewTeamMember,
    ) -> impl std::future::Future<Output = Result<TeamMember, DbError>> + Send;

    /// Returns false when no row matched the id.
    fn delete(&self, id: &str) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}

/// SQL implementation of the team directory.
#[derive(Debug, Clone)]
pub struct SqlTeamMemberRepository {
    db_client: DbClient,
}

impl SqlTeamMemberRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn row_to_member(row: &sqlx::any::AnyRow) -> Result<TeamMember, DbError> {
        Ok(TeamMember {
            id: row.try_get("id").map_err(DbError::from)?,
            name: row.try_get("name").map_err(DbError::from)?,
            email: row.try_get("email").map_err(DbError::from)?,
            role: row.try_get("role").map_err(DbError::from)?,
            created_at: ms_to_utc(row.try_get("created_at_ms").map_err(DbError::from)?),
        })
    }
}

impl TeamMemberRepository for SqlTeamMemberRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing team member schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS team_members (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT,
                created_at_ms INTEGER NOT NULL
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn list(&self) -> Result<Vec<TeamMember>, DbError> {
        let rows = sqlx::query(
            "SELECT id, name, email, role, created_at_ms FROM team_members ORDER BY created_at_ms",
        )
        .fetch_all(self.db_client.pool())
        .await?;

        rows.iter().map(Self::row_to_member).collect()
    }

    async fn create(&self, member: NewTeamMember) -> Result<TeamMember, DbError> {
        let created = TeamMember {
            id: Uuid::new_v4().to_string(),
            name: member.name,
            email: member.email,
            role: member.role,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO team_members (id, name, email, role, created_at_ms) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&created.id)
        .bind(&created.name)
        .bind(&created.email)
        .bind(created.role.as_deref())
        .bind(utc_to_ms(created.created_at))
        .execute(self.db_client.pool())
        .await?;

        Ok(created)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
