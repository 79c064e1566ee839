//! Store for administrator credentials.
//!
//! Invariant: at most one credential per email; the password is stored only
//! as a bcrypt hash and never logged.

use crate::error::DbError;
use crate::repositories::{ms_to_utc, utc_to_ms};
use crate::DbClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use tracing::{debug, error};
use uuid::Uuid;

/// An administrator credential.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCredential {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Store interface for administrator credentials.
pub trait AdminRepository {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<i64, DbError>> + Send;

    fn create(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> impl std::future::Future<Output = Result<AdminCredential, DbError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<AdminCredential>, DbError>> + Send;

    fn find_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<AdminCredential>, DbError>> + Send;

    fn update_email(
        &self,
        id: &str,
        email: &str,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;
}

/// SQL implementation of the administrator credential store.
#[derive(Debug, Clone)]
pub struct SqlAdminRepository {
    db_client: DbClient,
}

impl SqlAdminRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    fn row_to_credential(row: &sqlx::any::AnyRow) -> Result<AdminCredential, DbError> {
        Ok(AdminCredential {
            id: row.try_get("id").map_err(DbError::from)?,
            email: row.try_get("email").map_err(DbError::from)?,
            password_hash: row.try_get("password_hash").map_err(DbError::from)?,
            display_name: row.try_get("display_name").map_err(DbError::from)?,
            created_at: ms_to_utc(row.try_get("created_at_ms").map_err(DbError::from)?),
        })
    }
}

impl AdminRepository for SqlAdminRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing admin credential schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS admins (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                display_name TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            )
        "#;

        self.db_client.execute(query).await
    }

    async fn count(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM admins")
            .fetch_one(self.db_client.pool())
            .await?;
        row.try_get("n").map_err(DbError::from)
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<AdminCredential, DbError> {
        let credential = AdminCredential {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO admins (id, email, password_hash, display_name, created_at_ms)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&credential.id)
        .bind(&credential.email)
        .bind(&credential.password_hash)
        .bind(&credential.display_name)
        .bind(utc_to_ms(credential.created_at))
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to insert admin credential: {}", e);
            DbError::from(e)
        })?;

        Ok(credential)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminCredential>, DbError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, display_name, created_at_ms FROM admins WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.db_client.pool())
        .await?;

        row.as_ref().map(Self::row_to_credential).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AdminCredential>, DbError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, display_name, created_at_ms FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db_client.pool())
        .await?;

        row.as_ref().map(Self::row_to_credential).transpose()
    }

    async fn update_email(&self, id: &str, email: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE admins SET email = $1 WHERE id = $2")
            .bind(email)
            .bind(id)
            .execute(self.db_client.pool())
            .await?;
        Ok(())
    }

    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE admins SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.db_client.pool())
            .await?;
        Ok(())
    }
}
