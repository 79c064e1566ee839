//! Google Calendar gateway.
//!
//! Wraps the Calendar v3 REST surface with the user-consent OAuth2 flow:
//! consent URL, code exchange, transparent access-token refresh, revoke,
//! and event create/delete. Access tokens are refreshed through the token
//! store before each authenticated call.

use crate::token_store::{FileTokenStore, StoredTokens, TokenStoreError};
use bookify_common::services::{
    BoxFuture, CalendarService, CreatedEvent, DeleteOutcome, EventDetails,
};
use bookify_common::HTTP_CLIENT;
use bookify_config::GoogleConfig;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const CALENDAR_EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

/// Refresh slightly before the recorded expiry to absorb clock skew.
const EXPIRY_MARGIN_MS: i64 = 60_000;

/// Errors from the calendar gateway.
#[derive(Error, Debug)]
pub enum GcalError {
    #[error("Google OAuth client credentials are not configured")]
    MissingClientConfig,
    #[error("No Google account is linked")]
    NotLinked,
    #[error("Google API request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Google API returned an error: {message} (Status: {status})")]
    ApiError { status: u16, message: String },
    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

// Calendar v3 responds in camelCase.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InsertedEvent {
    id: String,
    #[serde(default)]
    hangout_link: Option<String>,
    #[serde(default)]
    html_link: Option<String>,
}

/// Google Calendar gateway holding the OAuth client config and token store.
pub struct GoogleCalendarGateway {
    config: GoogleConfig,
    tokens: Arc<FileTokenStore>,
}

impl GoogleCalendarGateway {
    pub fn new(config: GoogleConfig, tokens: Arc<FileTokenStore>) -> Self {
        Self { config, tokens }
    }

    pub fn token_store(&self) -> Arc<FileTokenStore> {
        self.tokens.clone()
    }

    fn client_credentials(&self) -> Result<(&str, &str), GcalError> {
        match (&self.config.client_id, &self.config.client_secret) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(GcalError::MissingClientConfig),
        }
    }

    /// Build the consent-screen redirect URL.
    pub fn auth_url(&self) -> Result<String, GcalError> {
        let (client_id, _) = self.client_credentials()?;
        let query = serde_urlencoded::to_string([
            ("client_id", client_id),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", CALENDAR_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ])
        .unwrap_or_default();
        Ok(format!("{}?{}", GOOGLE_AUTH_URL, query))
    }

    /// Exchange an authorization code for tokens and persist them.
    pub async fn exchange_code(&self, code: &str) -> Result<(), GcalError> {
        let (client_id, client_secret) = self.client_credentials()?;

        let response = HTTP_CLIENT
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let tokens = Self::parse_token_response(response).await?;
        info!("OAuth code exchange completed; persisting Google tokens");
        self.store_token_response(tokens).await
    }

    /// Best-effort server-side revoke, then clear the persisted file.
    pub async fn revoke(&self) -> Result<(), GcalError> {
        let snapshot = self.tokens.snapshot().await;
        let token = snapshot
            .refresh_token
            .clone()
            .or_else(|| snapshot.access_token.clone());

        if let Some(token) = token {
            let result = HTTP_CLIENT
                .post(GOOGLE_REVOKE_URL)
                .form(&[("token", token.as_str())])
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    info!("Google tokens revoked server-side");
                }
                Ok(response) => {
                    warn!("Google revoke returned status {}", response.status());
                }
                Err(e) => {
                    warn!("Google revoke call failed: {}", e);
                }
            }
        }

        self.tokens.clear().await?;
        Ok(())
    }

    /// Return a valid access token, refreshing through the stored refresh
    /// token when the cached one is missing or about to expire.
    async fn ensure_access_token(&self) -> Result<String, GcalError> {
        let snapshot = self.tokens.snapshot().await;
        let now_ms = Utc::now().timestamp_millis();

        if let Some(token) = &snapshot.access_token {
            let fresh = snapshot
                .expiry_ms
                .map(|expiry| expiry - EXPIRY_MARGIN_MS > now_ms)
                .unwrap_or(false);
            if fresh {
                return Ok(token.clone());
            }
        }

        let refresh_token = snapshot.refresh_token.clone().ok_or(GcalError::NotLinked)?;
        let (client_id, client_secret) = self.client_credentials()?;

        debug!("Refreshing Google access token");
        let response = HTTP_CLIENT
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let tokens = Self::parse_token_response(response).await?;
        let access_token = tokens.access_token.clone();
        self.store_token_response(tokens).await?;
        Ok(access_token)
    }

    async fn parse_token_response(response: reqwest::Response) -> Result<TokenResponse, GcalError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GcalError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<TokenResponse>().await?)
    }

    async fn store_token_response(&self, tokens: TokenResponse) -> Result<(), GcalError> {
        let previous = self.tokens.snapshot().await;
        let stored = StoredTokens {
            access_token: Some(tokens.access_token),
            // Google omits the refresh token on repeat exchanges; keep the
            // one already on file.
            refresh_token: tokens.refresh_token.or(previous.refresh_token),
            expiry_ms: Some(Utc::now().timestamp_millis() + tokens.expires_in * 1000),
        };
        self.tokens.save(stored).await?;
        Ok(())
    }

    async fn insert_event(&self, event: EventDetails) -> Result<CreatedEvent, GcalError> {
        let access_token = self.ensure_access_token().await?;
        let send_updates = if event.send_invites { "all" } else { "none" };

        let attendees: Vec<serde_json::Value> = event
            .attendees
            .iter()
            .map(|email| json!({ "email": email }))
            .collect();

        let body = json!({
            "summary": event.summary,
            "description": event.description,
            "start": { "dateTime": event.start.to_rfc3339(), "timeZone": event.time_zone },
            "end": { "dateTime": event.end.to_rfc3339(), "timeZone": event.time_zone },
            "attendees": attendees,
            "conferenceData": {
                "createRequest": {
                    "requestId": Uuid::new_v4().to_string(),
                    "conferenceSolutionKey": { "type": "hangoutsMeet" }
                }
            }
        });

        let response = HTTP_CLIENT
            .post(CALENDAR_EVENTS_URL)
            .bearer_auth(&access_token)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", send_updates)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GcalError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let inserted = response.json::<InsertedEvent>().await?;
        info!(event_id = %inserted.id, "Created Google Calendar event");
        Ok(CreatedEvent {
            event_id: inserted.id,
            hangout_link: inserted.hangout_link,
            html_link: inserted.html_link,
        })
    }

    async fn remove_event(&self, event_id: &str) -> Result<DeleteOutcome, GcalError> {
        let access_token = self.ensure_access_token().await?;

        let response = HTTP_CLIENT
            .delete(format!("{}/{}", CALENDAR_EVENTS_URL, event_id))
            .bearer_auth(&access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeleteOutcome::Deleted);
        }
        // Deleting an already-gone event is fine for every caller here.
        if status.as_u16() == 404 || status.as_u16() == 410 {
            debug!(event_id, "Calendar event already gone; ignoring");
            return Ok(DeleteOutcome::NotFoundIgnored);
        }

        let message = response.text().await.unwrap_or_default();
        Err(GcalError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}

impl CalendarService for GoogleCalendarGateway {
    type Error = GcalError;

    fn create_event(&self, event: EventDetails) -> BoxFuture<'_, CreatedEvent, Self::Error> {
        Box::pin(async move { self.insert_event(event).await })
    }

    fn delete_event(&self, event_id: &str) -> BoxFuture<'_, DeleteOutcome, Self::Error> {
        let event_id = event_id.to_string();
        Box::pin(async move { self.remove_event(&event_id).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gateway(dir: &TempDir, with_client: bool) -> GoogleCalendarGateway {
        let config = GoogleConfig {
            client_id: with_client.then(|| "client-id".to_string()),
            client_secret: with_client.then(|| "client-secret".to_string()),
            redirect_uri: "http://localhost:5000/oauth2callback".to_string(),
            token_file: dir
                .path()
                .join("tokens.json")
                .to_string_lossy()
                .into_owned(),
        };
        let store = Arc::new(FileTokenStore::new(dir.path().join("tokens.json")));
        GoogleCalendarGateway::new(config, store)
    }

    #[test]
    fn auth_url_carries_client_and_offline_access() {
        let dir = TempDir::new().unwrap();
        let url = gateway(&dir, true).auth_url().unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn auth_url_requires_client_credentials() {
        let dir = TempDir::new().unwrap();
        let err = gateway(&dir, false).auth_url().unwrap_err();
        assert!(matches!(err, GcalError::MissingClientConfig));
    }

    #[tokio::test]
    async fn unlinked_gateway_refuses_event_creation() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir, true);
        let err = gateway.ensure_access_token().await.unwrap_err();
        assert!(matches!(err, GcalError::NotLinked));
    }

    #[test]
    fn inserted_event_reads_camel_case_links() {
        let inserted: InsertedEvent = serde_json::from_value(json!({
            "id": "evt-1",
            "hangoutLink": "https://meet.google.com/x",
            "htmlLink": "https://calendar.google.com/e"
        }))
        .unwrap();
        assert_eq!(inserted.id, "evt-1");
        assert_eq!(inserted.hangout_link.as_deref(), Some("https://meet.google.com/x"));
        assert_eq!(inserted.html_link.as_deref(), Some("https://calendar.google.com/e"));
    }
}
