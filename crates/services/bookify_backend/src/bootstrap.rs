//! Ordered startup sequence.
//!
//! Fatal steps: configuration, database connection, schema creation, and
//! the SMTP transport construction. Everything else (seeding the admin
//! credential, the settings row, loading persisted Google tokens, probing
//! the SMTP relay) is warn-and-continue so a degraded collaborator never
//! prevents the service from binding.

use axum::{routing::get, Json, Router};
use bookify_admin::{hash_password, AdminState, AuthContext};
use bookify_booking::{BookingOrchestrator, BookingState};
use bookify_common::error::{config_error, persistence_error, BookifyError};
use bookify_config::AppConfig;
use bookify_db::repositories::{
    AdminRepository, MeetingRepository, SettingsRepository, SqlAdminRepository,
    SqlMeetingRepository, SqlSettingsRepository, SqlTeamMemberRepository, TeamMemberRepository,
};
use bookify_db::DbClient;
use bookify_gcal::{FileTokenStore, GcalState, GoogleCalendarGateway};
use bookify_mail::SmtpNotificationService;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// The assembled application: the merged router plus the configuration it
/// was built from.
#[derive(Debug)]
pub struct App {
    pub config: Arc<AppConfig>,
    pub router: Router,
}

async fn liveness() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Seed the first admin credential when the store is empty. Failures here
/// are logged; login simply stays unusable until an admin exists.
async fn ensure_initial_admin(admins: &SqlAdminRepository, config: &AppConfig) {
    let count = match admins.count().await {
        Ok(count) => count,
        Err(e) => {
            warn!("Could not check admin credential store: {}", e);
            return;
        }
    };
    if count > 0 {
        return;
    }

    let (Some(email), Some(password)) = (
        config.admin.initial_email.as_deref(),
        config.admin.initial_password.as_deref(),
    ) else {
        warn!("Admin store is empty and no initial credential is configured");
        return;
    };

    let hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Could not hash initial admin password: {}", e);
            return;
        }
    };
    match admins.create(email, &hash, "Administrator").await {
        Ok(_) => info!(email, "Seeded initial admin credential"),
        Err(e) => warn!("Could not seed initial admin credential: {}", e),
    }
}

/// Run the startup sequence and assemble the router. Callable from tests
/// without binding a listener.
pub async fn bootstrap(config: AppConfig) -> Result<App, BookifyError> {
    let config = Arc::new(config);

    // Database and schemas. Nothing works without the store.
    let db = DbClient::from_config(&config.database)
        .await
        .map_err(persistence_error)?;
    let admins = SqlAdminRepository::new(db.clone());
    let settings = SqlSettingsRepository::new(db.clone());
    let meetings = SqlMeetingRepository::new(db.clone());
    let team = SqlTeamMemberRepository::new(db.clone());
    admins.init_schema().await.map_err(persistence_error)?;
    settings.init_schema().await.map_err(persistence_error)?;
    meetings.init_schema().await.map_err(persistence_error)?;
    team.init_schema().await.map_err(persistence_error)?;
    info!("Database ready");

    // Mail transport. Construction only validates the relay name; the
    // connection probe below is best-effort.
    let smtp = config
        .smtp
        .as_ref()
        .ok_or_else(|| config_error("SMTP configuration is required"))?;
    let mailer = Arc::new(
        SmtpNotificationService::new(smtp)
            .map_err(|e| config_error(format!("Invalid SMTP configuration: {}", e)))?,
    );

    // Calendar gateway. An unlinked or unconfigured Google account leaves
    // every booking on the fallback path rather than failing startup.
    let google = config.google.clone().unwrap_or_default();
    let token_store = Arc::new(FileTokenStore::new(google.token_file.clone()));
    match token_store.load().await {
        Ok(true) => info!("Loaded persisted Google tokens"),
        Ok(false) => info!("No Google account linked yet"),
        Err(e) => warn!("Could not load Google token file: {}", e),
    }
    let gateway = Arc::new(GoogleCalendarGateway::new(google, token_store));

    ensure_initial_admin(&admins, &config).await;

    if let Err(e) = settings
        .get_or_create(
            config.admin.notify_email.as_deref(),
            config.booking.default_duration_minutes,
        )
        .await
    {
        warn!("Could not ensure settings row: {}", e);
    }

    if let Err(e) = mailer.verify().await {
        warn!("SMTP relay not reachable at startup: {}", e);
    }

    let booking_state = BookingState {
        orchestrator: Arc::new(BookingOrchestrator::new(
            gateway.clone(),
            mailer.clone(),
            meetings.clone(),
            settings.clone(),
            team.clone(),
            config.booking.clone(),
            &config.admin,
        )),
    };
    let admin_state = AdminState {
        admins,
        settings,
        meetings,
        team,
        calendar: gateway.clone(),
        mailer,
        auth: AuthContext::new(&config.admin),
        booking: config.booking.clone(),
        notify_email: config.admin.notify_email.clone(),
    };
    let gcal_state = GcalState { gateway };

    let router = Router::new()
        .route("/", get(liveness))
        .merge(bookify_booking::routes::routes(booking_state))
        .merge(bookify_admin::routes::routes(admin_state))
        .merge(bookify_gcal::routes::routes(gcal_state))
        .layer(CorsLayer::permissive());

    Ok(App { config, router })
}
