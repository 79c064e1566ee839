//! Typed configuration for Bookify.
//!
//! Configuration is layered: `config/default.yml` (if present) first, then
//! `APP_*` environment variables (`APP_SERVER__PORT`, `APP_DATABASE__URL`,
//! ...). A `.env` file is loaded once before either source is read.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;

pub mod models;

pub use models::{
    AdminConfig, AppConfig, BookingConfig, DatabaseConfig, GoogleConfig, ServerConfig, SmtpConfig,
};

static DOTENV_LOADED: OnceCell<()> = OnceCell::new();

/// Load `.env` exactly once per process. Missing files are fine.
pub fn ensure_dotenv_loaded() {
    DOTENV_LOADED.get_or_init(|| {
        let _ = dotenv::dotenv();
    });
}

/// Loads the application configuration.
///
/// Every mandatory field has a development default so the service starts
/// with nothing but a database path; production deployments override via
/// environment variables.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let config = Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5000)?
        .set_default("database.url", "sqlite://data/bookify.db")?
        .set_default("booking.time_zone", "Asia/Kolkata")?
        .set_default("booking.default_duration_minutes", 30)?
        .set_default("admin.jwt_secret", "secret")?
        .set_default("admin.token_ttl_hours", 12)?
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_without_any_sources() {
        let config = load_config().expect("default config should load");
        assert_eq!(config.booking.default_duration_minutes, 30);
        assert_eq!(config.booking.time_zone, "Asia/Kolkata");
        assert_eq!(config.admin.token_ttl_hours, 12);
        assert!(!config.database.url.is_empty());
    }
}
