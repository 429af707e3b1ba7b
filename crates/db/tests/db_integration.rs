//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `hub_test`)
//!   `TEST_DB_PASSWORD` (default: `hub_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use hub_common::{AppError, IdGenerator};
use hub_db::{
    entities::{
        application::{self, ApplicationStatus, AttendanceStatus},
        certificate,
        penalty::{self, PenaltyStatus, PenaltyType},
        post::{self, PostCategory, PostStatus},
        user::UserRole,
    },
    repositories::{
        ApplicationRepository, ApplicationStore, CertificateRepository, CertificateStore,
        PenaltyRepository, PenaltyStore, PostFilter, PostRepository, PostStore, UserRepository,
        UserStore,
    },
    test_utils::{TestDatabase, TestDbConfig},
};
use sea_orm::Set;

fn new_application(
    volunteer_id: &str,
    post_id: &str,
    attendance: AttendanceStatus,
    marked_at: Option<chrono::DateTime<Utc>>,
) -> application::ActiveModel {
    application::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        volunteer_id: Set(volunteer_id.to_string()),
        post_id: Set(post_id.to_string()),
        message: Set(None),
        status: Set(ApplicationStatus::Approved),
        attendance_status: Set(attendance),
        attendance_marked_at: Set(marked_at.map(Into::into)),
        created_at: Set(Utc::now().into()),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_token_lookup() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let user = db.seed_user(UserRole::Volunteer).await.unwrap();

    let repo = UserRepository::new(Arc::new(db.connection().clone()));
    let found = repo
        .find_by_token(user.token.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));
    assert!(repo.find_by_token("nope").await.unwrap().is_none());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_application_is_conflict() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let org = db.seed_user(UserRole::Organization).await.unwrap();
    let vol = db.seed_user(UserRole::Volunteer).await.unwrap();
    let post = db.seed_post(&org.id).await.unwrap();

    let repo = ApplicationRepository::new(Arc::new(db.connection().clone()));
    repo.create(new_application(&vol.id, &post.id, AttendanceStatus::NotMarked, None))
        .await
        .unwrap();
    let err = repo
        .create(new_application(&vol.id, &post.id, AttendanceStatus::NotMarked, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_absence_window_is_inclusive() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let org = db.seed_user(UserRole::Organization).await.unwrap();
    let vol = db.seed_user(UserRole::Volunteer).await.unwrap();
    let repo = ApplicationRepository::new(Arc::new(db.connection().clone()));

    // Postgres keeps microseconds, so pin the cutoff to whole seconds
    let cutoff = Utc::now() - Duration::days(90);
    let cutoff = cutoff - Duration::nanoseconds(i64::from(cutoff.timestamp_subsec_nanos()));

    let marks = [
        Some(cutoff),
        Some(cutoff - Duration::milliseconds(1)),
        Some(cutoff + Duration::days(1)),
    ];
    for marked_at in marks {
        let post = db.seed_post(&org.id).await.unwrap();
        repo.create(new_application(&vol.id, &post.id, AttendanceStatus::Absent, marked_at))
            .await
            .unwrap();
    }
    let present = db.seed_post(&org.id).await.unwrap();
    repo.create(new_application(
        &vol.id,
        &present.id,
        AttendanceStatus::Present,
        Some(Utc::now()),
    ))
    .await
    .unwrap();

    assert_eq!(repo.count_absences_since(&vol.id, cutoff).await.unwrap(), 2);
    assert_eq!(
        repo.find_attended_volunteer_ids(&present.id).await.unwrap(),
        vec![vol.id.clone()]
    );
    assert_eq!(repo.find_marked().await.unwrap().len(), 4);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_penalties_and_certificates() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let conn = Arc::new(db.connection().clone());
    let org = db.seed_user(UserRole::Organization).await.unwrap();
    let vol = db.seed_user(UserRole::Volunteer).await.unwrap();
    let post = db.seed_post(&org.id).await.unwrap();
    let id_gen = IdGenerator::new();

    let penalties = PenaltyRepository::new(Arc::clone(&conn));
    for status in [PenaltyStatus::Active, PenaltyStatus::Resolved] {
        penalties
            .create(penalty::ActiveModel {
                id: Set(id_gen.generate()),
                user_id: Set(vol.id.clone()),
                penalty_type: Set(PenaltyType::Suspension),
                status: Set(status),
                reason: Set("Excessive Absences".to_string()),
                description: Set(None),
                expires_at: Set(None),
                created_at: Set(Utc::now().into()),
                resolved_at: Set(None),
                issued_by: Set(None),
            })
            .await
            .unwrap();
    }
    let active = penalties
        .find_active_by_users(std::slice::from_ref(&vol.id))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(penalties.find_by_user(&vol.id).await.unwrap().len(), 2);

    let certificates = CertificateRepository::new(Arc::clone(&conn));
    let new_certificate = || certificate::ActiveModel {
        id: Set(id_gen.generate()),
        volunteer_id: Set(vol.id.clone()),
        post_id: Set(post.id.clone()),
        organization_id: Set(None),
        title: Set("Certificate of Service".to_string()),
        description: Set(None),
        certificate_url: Set(None),
        issued_date: Set(Utc::now().into()),
        verified: Set(false),
    };
    certificates.create(new_certificate()).await.unwrap();
    let err = certificates.create(new_certificate()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    db.cleanup().await.unwrap();
    assert!(certificates.find_all().await.unwrap().is_empty());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_published_search_and_delete_cascade() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let conn = Arc::new(db.connection().clone());
    let org = db.seed_user(UserRole::Organization).await.unwrap();
    let vol = db.seed_user(UserRole::Volunteer).await.unwrap();
    let seeded = db.seed_post(&org.id).await.unwrap();

    let posts = PostRepository::new(Arc::clone(&conn));
    let beach = posts
        .create(post::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            author_id: Set(org.id.clone()),
            organization_id: Set(Some(org.id.clone())),
            title: Set("Beach Cleanup".to_string()),
            description: Set("Bags and gloves provided".to_string()),
            category: Set(PostCategory::Environment),
            status: Set(PostStatus::PendingApproval),
            start_date: Set(None),
            end_date: Set(None),
            location: Set(None),
            max_volunteers: Set(Some(20)),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();

    let search = PostFilter {
        category: None,
        search: Some("beach".to_string()),
    };
    assert!(posts.find_published(&search, 100).await.unwrap().is_empty());

    let mut active: post::ActiveModel = beach.clone().into();
    active.status = Set(PostStatus::Published);
    posts.update(active).await.unwrap();

    let found = posts.find_published(&search, 100).await.unwrap();
    assert_eq!(found.iter().map(|p| &p.id).collect::<Vec<_>>(), [&beach.id]);
    let all = posts.find_published(&PostFilter::default(), 100).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].id, seeded.id);

    let applications = ApplicationRepository::new(Arc::clone(&conn));
    applications
        .create(new_application(&vol.id, &beach.id, AttendanceStatus::NotMarked, None))
        .await
        .unwrap();
    posts.delete(&beach.id).await.unwrap();
    assert!(applications.find_by_post(&beach.id).await.unwrap().is_empty());
    assert!(matches!(
        posts.delete(&beach.id).await,
        Err(AppError::NotFound(_))
    ));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
