//! Startup-sequence tests. The SMTP relay and Google account are absent;
//! bootstrap must still produce a working application.

use bookify_backend::bootstrap;
use bookify_config::{
    AdminConfig, AppConfig, BookingConfig, DatabaseConfig, ServerConfig, SmtpConfig,
};
use bookify_db::repositories::{
    AdminRepository, SettingsRepository, SqlAdminRepository, SqlSettingsRepository,
};
use bookify_db::DbClient;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("bookify.db").display()),
        },
        booking: BookingConfig::default(),
        admin: AdminConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 12,
            initial_email: Some("root@example.com".to_string()),
            initial_password: Some("correct horse".to_string()),
            notify_email: Some("root@example.com".to_string()),
        },
        google: None,
        smtp: Some(SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            sender: "Bookify <noreply@example.com>".to_string(),
        }),
    }
}

#[tokio::test]
async fn bootstrap_seeds_admin_and_settings() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let url = config.database.url.clone();

    let app = bootstrap(config).await.unwrap();
    assert_eq!(app.config.server.port, 0);

    let db = DbClient::from_url(&url).await.unwrap();
    let admins = SqlAdminRepository::new(db.clone());
    assert_eq!(admins.count().await.unwrap(), 1);
    let admin = admins
        .find_by_email("root@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.display_name, "Administrator");

    let settings = SqlSettingsRepository::new(db);
    let row = settings.get_or_create(None, 99).await.unwrap();
    // The row was created during bootstrap with the configured defaults,
    // not the values passed here.
    assert_eq!(row.admin_email.as_deref(), Some("root@example.com"));
    assert_eq!(row.default_duration_minutes, 30);
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let dir = TempDir::new().unwrap();

    bootstrap(test_config(&dir)).await.unwrap();
    bootstrap(test_config(&dir)).await.unwrap();

    let url = test_config(&dir).database.url;
    let db = DbClient::from_url(&url).await.unwrap();
    let admins = SqlAdminRepository::new(db);
    assert_eq!(admins.count().await.unwrap(), 1);
}

#[tokio::test]
async fn bootstrap_requires_smtp_config() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.smtp = None;

    let err = bootstrap(config).await.unwrap_err();
    assert!(err.to_string().contains("SMTP"));
}
