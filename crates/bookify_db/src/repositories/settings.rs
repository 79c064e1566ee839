//! Store for the singleton settings document.
//!
//! The settings row is pinned to `id = 1` and every write is an atomic
//! `ON CONFLICT` upsert, so concurrent bookings cannot create a second
//! settings document.

use crate::error::DbError;
use crate::DbClient;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::debug;

/// The mutable application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub admin_email: Option<String>,
    pub default_duration_minutes: i64,
    /// Whether the calendar provider should mail invites to attendees.
    pub send_invites: bool,
    pub mail_sender: Option<String>,
}

/// A full replacement for the settings document, applied as one upsert.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub admin_email: Option<String>,
    pub default_duration_minutes: Option<i64>,
    pub send_invites: Option<bool>,
    pub mail_sender: Option<String>,
}

/// Store interface for the settings document.
pub trait SettingsRepository {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Read the settings, creating the default row if absent. The create is
    /// an `ON CONFLICT DO NOTHING` insert, so two concurrent callers end up
    /// with the same single row.
    fn get_or_create(
        &self,
        default_admin_email: Option<&str>,
        default_duration_minutes: i64,
    ) -> impl std::future::Future<Output = Result<Settings, DbError>> + Send;

    /// Apply an update as a single atomic upsert and return the new state.
    fn upsert(
        &self,
        update: SettingsUpdate,
    ) -> impl std::future::Future<Output = Result<Settings, DbError>> + Send;
}

/// SQL implementation of the settings store.
#[derive(Debug, Clone)]
pub struct SqlSettingsRepository {
    db_client: DbClient,
}

impl SqlSettingsRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn row_to_settings(row: &sqlx::any::AnyRow) -> Result<Settings, DbError> {
        let send_invites: i64 = row.try_get("send_invites").map_err(DbError::from)?;
        Ok(Settings {
            admin_email: row.try_get("admin_email").map_err(DbError::from)?,
            default_duration_minutes: row
                .try_get("default_duration_minutes")
                .map_err(DbError::from)?,
            send_invites: send_invites != 0,
            mail_sender: row.try_get("mail_sender").map_err(DbError::from)?,
        })
    }

    async fn fetch(&self) -> Result<Option<Settings>, DbError> {
        let row = sqlx::query(
            "SELECT admin_email, default_duration_minutes, send_invites, mail_sender \
             FROM settings WHERE id = 1",
        )
        .fetch_optional(self.db_client.pool())
        .await?;

        row.as_ref().map(Self::row_to_settings).transpose()
    }
}

impl SettingsRepository for SqlSettingsRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing settings schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                admin_email TEXT,
                default_duration_minutes INTEGER NOT NULL DEFAULT 30,
                send_invites INTEGER NOT NULL DEFAULT 1,
                mail_sender TEXT,
                created_at_ms INTEGER NOT NULL
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn get_or_create(
        &self,
        default_admin_email: Option<&str>,
        default_duration_minutes: i64,
    ) -> Result<Settings, DbError> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, admin_email, default_duration_minutes, send_invites, created_at_ms)
            VALUES (1, $1, $2, 1, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(default_admin_email)
        .bind(default_duration_minutes)
        .bind(Utc::now().timestamp_millis())
        .execute(self.db_client.pool())
        .await?;

        self.fetch().await?.ok_or_else(|| {
            DbError::QueryError("settings row missing after insert".to_string())
        })
    }

    async fn upsert(&self, update: SettingsUpdate) -> Result<Settings, DbError> {
        // COALESCE keeps the current value for fields the update omits.
        sqlx::query(
            r#"
            INSERT INTO settings (id, admin_email, default_duration_minutes, send_invites, mail_sender, created_at_ms)
            VALUES (1, $1, COALESCE($2, 30), COALESCE($3, 1), $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                admin_email = COALESCE($1, settings.admin_email),
                default_duration_minutes = COALESCE($2, settings.default_duration_minutes),
                send_invites = COALESCE($3, settings.send_invites),
                mail_sender = COALESCE($4, settings.mail_sender)
            "#,
        )
        .bind(update.admin_email.as_deref())
        .bind(update.default_duration_minutes)
        .bind(update.send_invites.map(i64::from))
        .bind(update.mail_sender.as_deref())
        .bind(Utc::now().timestamp_millis())
        .execute(self.db_client.pool())
        .await?;

        self.fetch().await?.ok_or_else(|| {
            DbError::QueryError("settings row missing after upsert".to_string())
        })
    }
}
