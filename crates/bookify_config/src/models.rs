use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://data/bookify.db, overridable via APP_DATABASE__URL
}

// --- Booking Config ---
// The fixed zone bookings are interpreted in, and the event duration used
// when the settings store has no explicit value yet.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    pub time_zone: String,
    pub default_duration_minutes: i64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            time_zone: "Asia/Kolkata".to_string(),
            default_duration_minutes: 30,
        }
    }
}

// --- Google OAuth / Calendar Config ---
// Holds the OAuth2 client for the user-consent flow. Tokens themselves live
// in the persisted token file, not in config.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleConfig {
    pub client_id: Option<String>, // GOOGLE_CLIENT_ID / APP_GOOGLE__CLIENT_ID
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub token_file: String, // where exchanged tokens are persisted
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://localhost:5000/gcal/oauth2callback".to_string(),
            token_file: "data/google_tokens.json".to_string(),
        }
    }
}

// --- SMTP Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String, // APP_SMTP__PASSWORD, never logged
    pub sender: String,   // From: address
}

// --- Admin / Auth Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Seed credential created at bootstrap when the store is empty.
    #[serde(default)]
    pub initial_email: Option<String>,
    #[serde(default)]
    pub initial_password: Option<String>,
    /// Address booking notifications fall back to when settings carry none.
    #[serde(default)]
    pub notify_email: Option<String>,
}

fn default_token_ttl_hours() -> i64 {
    12
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    pub admin: AdminConfig,

    // --- Optional external integrations ---
    #[serde(default)]
    pub google: Option<GoogleConfig>,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}
