//! Integration tests for the Bookify stores against a throwaway SQLite file.

use bookify_db::{
    AdminRepository, DbClient, MeetingFilter, MeetingRepository, MeetingStatus, NewMeeting,
    NewTeamMember, SettingsRepository, SettingsUpdate, SqlAdminRepository, SqlMeetingRepository,
    SqlSettingsRepository, SqlTeamMemberRepository, TeamMemberRepository,
};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

async fn test_client(dir: &TempDir) -> DbClient {
    let path = dir.path().join("test.db");
    let url = format!("sqlite://{}", path.display());
    DbClient::from_url(&url).await.expect("test db")
}

fn sample_meeting(name: &str, email: &str, start_hour: u32) -> NewMeeting {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, start_hour, 0, 0).unwrap();
    NewMeeting {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        message: Some("hi".to_string()),
        attendees: vec![email.to_string()],
        company_name: None,
        industries: None,
        job_titles: None,
        priority: None,
        monthly_contacts: None,
        start,
        end: start + chrono::Duration::minutes(30),
        time_zone: "Asia/Kolkata".to_string(),
        hangout_link: None,
        html_link: None,
        event_id: None,
    }
}

#[tokio::test]
async fn settings_row_is_created_once_and_upserted_atomically() {
    let dir = TempDir::new().unwrap();
    let repo = SqlSettingsRepository::new(test_client(&dir).await);
    repo.init_schema().await.unwrap();

    let first = repo.get_or_create(Some("admin@x.com"), 30).await.unwrap();
    assert_eq!(first.admin_email.as_deref(), Some("admin@x.com"));
    assert_eq!(first.default_duration_minutes, 30);
    assert!(first.send_invites);

    // A second get_or_create must not reset anything.
    let second = repo.get_or_create(Some("other@x.com"), 45).await.unwrap();
    assert_eq!(second.admin_email.as_deref(), Some("admin@x.com"));
    assert_eq!(second.default_duration_minutes, 30);

    let updated = repo
        .upsert(SettingsUpdate {
            admin_email: None,
            default_duration_minutes: Some(45),
            send_invites: Some(false),
            mail_sender: Some("noreply@x.com".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(updated.default_duration_minutes, 45);
    assert!(!updated.send_invites);
    // Omitted fields keep their previous value.
    assert_eq!(updated.admin_email.as_deref(), Some("admin@x.com"));
}

#[tokio::test]
async fn admin_emails_are_unique() {
    let dir = TempDir::new().unwrap();
    let repo = SqlAdminRepository::new(test_client(&dir).await);
    repo.init_schema().await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 0);
    let admin = repo.create("a@x.com", "hash", "Admin").await.unwrap();
    assert!(repo.create("a@x.com", "hash2", "Dup").await.is_err());

    let found = repo.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(found.id, admin.id);

    repo.update_email(&admin.id, "b@x.com").await.unwrap();
    assert!(repo.find_by_email("a@x.com").await.unwrap().is_none());
    assert!(repo.find_by_email("b@x.com").await.unwrap().is_some());
}

#[tokio::test]
async fn team_members_round_trip_and_delete() {
    let dir = TempDir::new().unwrap();
    let repo = SqlTeamMemberRepository::new(test_client(&dir).await);
    repo.init_schema().await.unwrap();

    let member = repo
        .create(NewTeamMember {
            name: "Sam".to_string(),
            email: "sam@x.com".to_string(),
            role: Some("sales".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(repo.list().await.unwrap().len(), 1);

    assert!(repo.delete(&member.id).await.unwrap());
    assert!(!repo.delete(&member.id).await.unwrap());
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn meeting_attendees_and_status_round_trip() {
    let dir = TempDir::new().unwrap();
    let repo = SqlMeetingRepository::new(test_client(&dir).await);
    repo.init_schema().await.unwrap();

    let mut input = sample_meeting("Ann", "ann@x.com", 10);
    input.attendees = vec!["ann@x.com".to_string(), "guest@x.com".to_string()];
    input.event_id = Some("evt-1".to_string());
    let created = repo.create(input).await.unwrap();

    let loaded = repo.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(loaded.attendees, vec!["ann@x.com", "guest@x.com"]);
    assert_eq!(loaded.status, MeetingStatus::Scheduled);
    assert!(loaded.start < loaded.end);

    repo.set_status(&created.id, MeetingStatus::Cancelled)
        .await
        .unwrap();
    let cancelled = repo.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, MeetingStatus::Cancelled);

    assert!(repo.delete(&created.id).await.unwrap());
    assert!(repo.find_by_id(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn meeting_filters_apply_conjunctively() {
    let dir = TempDir::new().unwrap();
    let repo = SqlMeetingRepository::new(test_client(&dir).await);
    repo.init_schema().await.unwrap();

    let ann = repo.create(sample_meeting("Ann", "ann@x.com", 10)).await.unwrap();
    let bob = repo.create(sample_meeting("Bob", "bob@y.com", 12)).await.unwrap();
    repo.create(sample_meeting("Cara", "cara@z.com", 14))
        .await
        .unwrap();
    repo.set_status(&bob.id, MeetingStatus::Cancelled).await.unwrap();

    // Case-insensitive substring over name or email.
    let found = repo
        .list(&MeetingFilter {
            search: Some("ANN".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ann.id);

    // Status filter alone.
    let cancelled = repo
        .list(&MeetingFilter {
            status: Some(MeetingStatus::Cancelled),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, bob.id);

    // Date range and status together: Bob is inside the range but cancelled.
    let range_scheduled = repo
        .list(&MeetingFilter {
            search: None,
            start_from: Some(Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()),
            start_to: Some(Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap()),
            status: Some(MeetingStatus::Scheduled),
        })
        .await
        .unwrap();
    assert_eq!(range_scheduled.len(), 1);
    assert_eq!(range_scheduled[0].name, "Cara");

    // Results come back sorted by start ascending.
    let all = repo.list(&MeetingFilter::default()).await.unwrap();
    let starts: Vec<_> = all.iter().map(|m| m.start).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[tokio::test]
async fn meeting_search_treats_like_wildcards_literally() {
    let dir = TempDir::new().unwrap();
    let repo = SqlMeetingRepository::new(test_client(&dir).await);
    repo.init_schema().await.unwrap();

    repo.create(sample_meeting("Abc", "abc@x.com", 10)).await.unwrap();
    let literal = repo
        .create(sample_meeting("A_c", "a_c@x.com", 12))
        .await
        .unwrap();
    repo.create(sample_meeting("Pct", "100pct@x.com", 14))
        .await
        .unwrap();

    // An underscore in the term matches only itself, not any character.
    let found = repo
        .list(&MeetingFilter {
            search: Some("a_c".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, literal.id);

    // A percent sign does not turn into a wildcard either.
    let none = repo
        .list(&MeetingFilter {
            search: Some("%".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}
