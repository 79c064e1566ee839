//! Handlers for the admin API: login, profile and credential updates,
//! settings, meeting management, and the team directory.

use crate::auth::{bearer_token, hash_password, verify_password, AuthContext};
use axum::{
    extract::{Path, Query, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use bookify_common::error::{not_found, persistence_error, validation_error, BookifyError};
use bookify_common::handle_json_result;
use bookify_common::services::{CalendarService, NotificationService};
use bookify_config::BookingConfig;
use bookify_db::repositories::{
    AdminCredential, AdminRepository, Meeting, MeetingFilter, MeetingRepository, MeetingStatus,
    NewTeamMember, Settings, SettingsRepository, SettingsUpdate, SqlAdminRepository,
    SqlMeetingRepository, SqlSettingsRepository, SqlTeamMemberRepository, TeamMember,
    TeamMemberRepository,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Shared state for the admin routes.
pub struct AdminState<C, N> {
    pub admins: SqlAdminRepository,
    pub settings: SqlSettingsRepository,
    pub meetings: SqlMeetingRepository,
    pub team: SqlTeamMemberRepository,
    pub calendar: Arc<C>,
    pub mailer: Arc<N>,
    pub auth: AuthContext,
    pub booking: BookingConfig,
    /// Seed value for the settings row when none exists yet.
    pub notify_email: Option<String>,
}

impl<C, N> Clone for AdminState<C, N> {
    fn clone(&self) -> Self {
        Self {
            admins: self.admins.clone(),
            settings: self.settings.clone(),
            meetings: self.meetings.clone(),
            team: self.team.clone(),
            calendar: self.calendar.clone(),
            mailer: self.mailer.clone(),
            auth: self.auth.clone(),
            booking: self.booking.clone(),
            notify_email: self.notify_email.clone(),
        }
    }
}

impl<C, N> AdminState<C, N> {
    fn time_zone(&self) -> Tz {
        self.booking
            .time_zone
            .parse::<Tz>()
            .unwrap_or(chrono_tz::Asia::Kolkata)
    }
}

/// The authenticated admin, inserted by the middleware.
#[derive(Clone)]
pub struct CurrentAdmin(pub AdminCredential);

/// Bearer-token middleware. Failures all map to the same generic 401.
pub async fn require_admin<C, N>(
    State(state): State<AdminState<C, N>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let unauthorized = || BookifyError::AuthError.into_response();

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(unauthorized)?;
    let token = bearer_token(header).ok_or_else(unauthorized)?;
    let claims = state.auth.decode_token(token).map_err(|_| unauthorized())?;

    let admin = state
        .admins
        .find_by_id(&claims.sub)
        .await
        .map_err(|_| unauthorized())?
        .ok_or_else(unauthorized)?;

    request.extensions_mut().insert(CurrentAdmin(admin));
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AdminSummary,
}

#[derive(Debug, Serialize)]
pub struct AdminSummary {
    pub email: String,
    pub name: String,
}

/// POST /admin/login. A store outage is surfaced here, unlike the
/// best-effort paths, because there is nothing useful to degrade to.
pub async fn login_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        let admin = state
            .admins
            .find_by_email(&request.email)
            .await
            .map_err(persistence_error)?
            .ok_or(BookifyError::AuthError)?;

        if !verify_password(&request.password, &admin.password_hash)? {
            return Err(BookifyError::AuthError);
        }

        let token = state.auth.issue_token(&admin.id)?;
        Ok(LoginResponse {
            token,
            admin: AdminSummary {
                email: admin.email,
                name: admin.display_name,
            },
        })
    }
    .await;
    handle_json_result(result)
}

/// GET /admin/profile
pub async fn profile_handler(
    Extension(CurrentAdmin(admin)): Extension<CurrentAdmin>,
) -> Json<AdminCredential> {
    Json(admin)
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

/// PUT /admin/update-email
pub async fn update_email_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Extension(CurrentAdmin(admin)): Extension<CurrentAdmin>,
    Json(request): Json<UpdateEmailRequest>,
) -> Result<Json<serde_json::Value>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        if request.email.trim().is_empty() {
            return Err(validation_error("Missing email"));
        }
        match state.admins.update_email(&admin.id, request.email.trim()).await {
            Ok(()) => {}
            Err(bookify_db::DbError::Conflict(_)) => {
                return Err(validation_error(
                    "An administrator with that email already exists",
                ));
            }
            Err(e) => return Err(persistence_error(e)),
        }
        Ok(json!({
            "success": true,
            "message": "Email updated",
            "email": request.email.trim(),
        }))
    }
    .await;
    handle_json_result(result)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// PUT /admin/update-password
pub async fn update_password_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Extension(CurrentAdmin(admin)): Extension<CurrentAdmin>,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<serde_json::Value>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        if request.old_password.is_empty() || request.new_password.is_empty() {
            return Err(validation_error("Missing password info"));
        }
        if !verify_password(&request.old_password, &admin.password_hash)? {
            return Err(BookifyError::AuthError);
        }
        let new_hash = hash_password(&request.new_password)?;
        state
            .admins
            .update_password_hash(&admin.id, &new_hash)
            .await
            .map_err(persistence_error)?;
        Ok(json!({ "success": true, "message": "Password updated" }))
    }
    .await;
    handle_json_result(result)
}

/// GET /admin/settings - lazily creates the row on first read.
pub async fn settings_get_handler<C, N>(
    State(state): State<AdminState<C, N>>,
) -> Result<Json<Settings>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = state
        .settings
        .get_or_create(
            state.notify_email.as_deref(),
            state.booking.default_duration_minutes,
        )
        .await
        .map_err(persistence_error);
    handle_json_result(result)
}

#[derive(Debug, Serialize)]
pub struct SettingsSavedResponse {
    pub success: bool,
    pub message: String,
    pub settings: Settings,
}

/// PUT /admin/settings - applied as one atomic upsert.
pub async fn settings_put_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsSavedResponse>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        if update.default_duration_minutes.is_some_and(|m| m <= 0) {
            return Err(validation_error("defaultDurationMinutes must be positive"));
        }
        let settings = state
            .settings
            .upsert(update)
            .await
            .map_err(persistence_error)?;
        Ok(SettingsSavedResponse {
            success: true,
            message: "Settings saved".to_string(),
            settings,
        })
    }
    .await;
    handle_json_result(result)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingListParams {
    pub search: Option<String>,
    /// Inclusive "%Y-%m-%d" lower bound on the meeting start, in the
    /// booking zone.
    pub start_date: Option<String>,
    /// Inclusive "%Y-%m-%d" upper bound; covers the whole named day.
    pub end_date: Option<String>,
    pub status: Option<String>,
}

fn day_bound(date: &str, time_zone: Tz, end_of_day: bool) -> Result<DateTime<Utc>, BookifyError> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| validation_error(format!("Invalid date: {}", date)))?;
    let naive = if end_of_day {
        day.and_hms_opt(23, 59, 59)
    } else {
        day.and_hms_opt(0, 0, 0)
    };
    naive
        .and_then(|n| time_zone.from_local_datetime(&n).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| validation_error(format!("Invalid date: {}", date)))
}

pub(crate) fn build_meeting_filter(
    params: &MeetingListParams,
    time_zone: Tz,
) -> Result<MeetingFilter, BookifyError> {
    let mut filter = MeetingFilter {
        search: params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        ..Default::default()
    };
    if let Some(date) = params.start_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter.start_from = Some(day_bound(date, time_zone, false)?);
    }
    if let Some(date) = params.end_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter.start_to = Some(day_bound(date, time_zone, true)?);
    }
    if let Some(status) = params.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter.status = Some(
            MeetingStatus::parse(status)
                .ok_or_else(|| validation_error(format!("Unknown status: {}", status)))?,
        );
    }
    Ok(filter)
}

#[derive(Debug, Serialize)]
pub struct MeetingListResponse {
    pub meetings: Vec<Meeting>,
}

/// GET /admin/meetings - filters apply conjunctively, sorted by start.
pub async fn meetings_list_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Query(params): Query<MeetingListParams>,
) -> Result<Json<MeetingListResponse>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        let filter = build_meeting_filter(&params, state.time_zone())?;
        let meetings = state
            .meetings
            .list(&filter)
            .await
            .map_err(persistence_error)?;
        Ok(MeetingListResponse { meetings })
    }
    .await;
    handle_json_result(result)
}

/// Best-effort removal of the provider-side event. Never escalates.
async fn delete_calendar_event<C: CalendarService>(calendar: &C, meeting: &Meeting) {
    if let Some(event_id) = &meeting.event_id {
        if let Err(e) = calendar.delete_event(event_id).await {
            warn!(
                meeting_id = %meeting.id,
                "Failed to delete calendar event: {}",
                e
            );
        }
    }
}

/// DELETE /admin/delete-meeting/{id}
pub async fn delete_meeting_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        let meeting = state
            .meetings
            .find_by_id(&id)
            .await
            .map_err(persistence_error)?
            .ok_or_else(|| not_found("Not found"))?;

        delete_calendar_event(state.calendar.as_ref(), &meeting).await;
        state.meetings.delete(&id).await.map_err(persistence_error)?;
        Ok(json!({ "success": true, "message": "Meeting deleted" }))
    }
    .await;
    handle_json_result(result)
}

/// POST /admin/cancel-meeting/{id}
pub async fn cancel_meeting_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        let meeting = state
            .meetings
            .find_by_id(&id)
            .await
            .map_err(persistence_error)?
            .ok_or_else(|| not_found("Not found"))?;

        delete_calendar_event(state.calendar.as_ref(), &meeting).await;
        state
            .meetings
            .set_status(&id, MeetingStatus::Cancelled)
            .await
            .map_err(persistence_error)?;

        // Best-effort notice to the requester; the cancellation stands
        // whether or not the mail goes out.
        let start_local = meeting
            .start
            .with_timezone(&state.time_zone())
            .format("%Y-%m-%d %H:%M %Z")
            .to_string();
        match bookify_mail::render(&bookify_mail::MeetingCancelledEmail {
            name: &meeting.name,
            start_local: &start_local,
        }) {
            Ok(html) => {
                let recipients = vec![meeting.email.clone()];
                if let Err(e) = state
                    .mailer
                    .send(&recipients, "Your Meeting Has Been Cancelled", &html)
                    .await
                {
                    warn!(meeting_id = %id, "Failed to send cancellation email: {}", e);
                }
            }
            Err(e) => warn!("Failed to render cancellation email: {}", e),
        }

        Ok(json!({ "success": true, "message": "Meeting cancelled" }))
    }
    .await;
    handle_json_result(result)
}

/// GET /admin/team
pub async fn team_list_handler<C, N>(
    State(state): State<AdminState<C, N>>,
) -> Result<Json<Vec<TeamMember>>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    handle_json_result(state.team.list().await.map_err(persistence_error))
}

/// POST /admin/team
pub async fn team_create_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Json(member): Json<NewTeamMember>,
) -> Result<Json<TeamMember>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        if member.name.trim().is_empty() || member.email.trim().is_empty() {
            return Err(validation_error("Missing name or email"));
        }
        match state.team.create(member).await {
            Ok(created) => Ok(created),
            Err(bookify_db::DbError::Conflict(_)) => {
                Err(validation_error("A team member with that email already exists"))
            }
            Err(e) => Err(persistence_error(e)),
        }
    }
    .await;
    handle_json_result(result)
}

/// DELETE /admin/team/{id}
pub async fn team_delete_handler<C, N>(
    State(state): State<AdminState<C, N>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Response>
where
    C: CalendarService + 'static,
    N: NotificationService + 'static,
{
    let result = async {
        let removed = state.team.delete(&id).await.map_err(persistence_error)?;
        if !removed {
            return Err(not_found("Not found"));
        }
        Ok(json!({ "success": true, "message": "Team member removed" }))
    }
    .await;
    handle_json_result(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_filter_parses_dates_in_the_booking_zone() {
        let params = MeetingListParams {
            search: Some("  ada ".to_string()),
            start_date: Some("2024-05-01".to_string()),
            end_date: Some("2024-05-02".to_string()),
            status: Some("scheduled".to_string()),
        };
        let filter = build_meeting_filter(&params, chrono_tz::Asia::Kolkata).unwrap();
        assert_eq!(filter.search.as_deref(), Some("ada"));
        // Midnight IST is 18:30 UTC the previous day.
        assert_eq!(
            filter.start_from.unwrap().to_rfc3339(),
            "2024-04-30T18:30:00+00:00"
        );
        assert_eq!(
            filter.start_to.unwrap().to_rfc3339(),
            "2024-05-02T18:29:59+00:00"
        );
        assert_eq!(filter.status, Some(MeetingStatus::Scheduled));
    }

    #[test]
    fn meeting_filter_rejects_bad_inputs() {
        let bad_date = MeetingListParams {
            start_date: Some("May 1st".to_string()),
            ..Default::default()
        };
        assert!(build_meeting_filter(&bad_date, chrono_tz::Asia::Kolkata).is_err());

        let bad_status = MeetingListParams {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(build_meeting_filter(&bad_status, chrono_tz::Asia::Kolkata).is_err());
    }

    #[test]
    fn empty_params_build_an_unfiltered_query() {
        let filter =
            build_meeting_filter(&MeetingListParams::default(), chrono_tz::Asia::Kolkata).unwrap();
        assert!(filter.search.is_none());
        assert!(filter.start_from.is_none());
        assert!(filter.start_to.is_none());
        assert!(filter.status.is_none());
    }
}
