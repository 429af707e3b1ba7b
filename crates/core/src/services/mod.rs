//! Business logic services.

#![allow(missing_docs)]

pub mod application;
pub mod attendance;
pub mod certificate;
pub mod eligibility;
pub mod moderation;
pub mod penalty;
pub mod post;
pub mod user;

pub use application::{ApplicationService, ApplyInput};
pub use attendance::{AttendanceService, AttendanceSummary, VolunteerLocks};
pub use certificate::{BulkIssueInput, BulkIssueResult, CertificateService, IssueCertificateInput};
pub use eligibility::{EligibilityGate, apply_denial, is_effective, is_suspended};
pub use moderation::{ModerationAction, ModerationService, PlatformStats};
pub use penalty::{
    CreatePenaltyInput, EscalationPolicy, MyPenalties, PenaltyService, PenaltyTemplate,
};
pub use post::{PUBLISHED_LIMIT, PostInput, PostService};
pub use user::UserService;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use hub_common::AppError;
    use hub_db::entities::{
        application::{self, ApplicationStatus, AttendanceStatus},
        penalty::PenaltyType,
        post::{self, PostCategory, PostStatus},
        user::{self, UserRole},
    };

    use super::*;
    use crate::memory::MemoryStores;

    fn user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: Some(id.to_string()),
            email: format!("{id}@example.test"),
            role,
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn post(id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: "org".to_string(),
            organization_id: None,
            title: format!("Shift {id}"),
            description: "Help out for an afternoon".to_string(),
            category: PostCategory::Community,
            status: PostStatus::Published,
            start_date: None,
            end_date: None,
            location: None,
            max_volunteers: None,
            created_at: Utc::now().into(),
        }
    }

    struct Engine {
        stores: MemoryStores,
        attendance: AttendanceService,
        applications: ApplicationService,
    }

    fn engine(stores: &MemoryStores) -> Engine {
        let penalties = PenaltyService::new(
            stores.penalties.clone(),
            stores.users.clone(),
            EscalationPolicy::default(),
        );
        let gate = EligibilityGate::new(stores.penalties.clone());
        Engine {
            stores: stores.clone(),
            attendance: AttendanceService::new(
                stores.applications.clone(),
                stores.posts.clone(),
                penalties,
            ),
            applications: ApplicationService::new(
                stores.applications.clone(),
                stores.posts.clone(),
                gate,
            ),
        }
    }

    async fn seed_events(stores: &MemoryStores, count: usize) {
        for i in 0..count {
            stores.posts.insert(post(&format!("p{i}"))).await;
            stores
                .applications
                .insert(application::Model {
                    id: format!("a{i}"),
                    volunteer_id: "vol".to_string(),
                    post_id: format!("p{i}"),
                    message: None,
                    status: ApplicationStatus::Approved,
                    attendance_status: AttendanceStatus::NotMarked,
                    attendance_marked_at: None,
                    created_at: Utc::now().into(),
                })
                .await;
        }
    }

    #[tokio::test]
    async fn test_absences_warn_then_restrict_applying() {
        let stores = MemoryStores::new();
        let org = user("org", UserRole::Organization);
        let vol = user("vol", UserRole::Volunteer);
        stores.users.insert(org.clone()).await;
        stores.users.insert(vol.clone()).await;
        seed_events(&stores, 5).await;
        stores.posts.insert(post("next")).await;
        stores.posts.insert(post("later")).await;
        let engine = engine(&stores);

        for i in 0..3 {
            engine
                .attendance
                .mark_attendance(&org, &format!("a{i}"), AttendanceStatus::Absent)
                .await
                .unwrap();
        }
        let penalties = engine.stores.penalties.all().await;
        assert_eq!(penalties.len(), 1);
        assert_eq!(penalties[0].penalty_type, PenaltyType::Warning);

        // A warning alone does not block
        engine
            .applications
            .apply(
                &vol,
                ApplyInput {
                    post_id: "next".to_string(),
                    message: None,
                },
            )
            .await
            .unwrap();

        let before = Utc::now();
        for i in 3..5 {
            engine
                .attendance
                .mark_attendance(&org, &format!("a{i}"), AttendanceStatus::Absent)
                .await
                .unwrap();
        }
        let penalties = engine.stores.penalties.all().await;
        assert_eq!(penalties.len(), 2);
        let restriction = &penalties[1];
        assert_eq!(restriction.penalty_type, PenaltyType::TemporaryRestriction);
        let expires = restriction.expires_at.unwrap().to_utc();
        assert!(expires >= before + Duration::days(30));
        assert!(expires <= Utc::now() + Duration::days(30));

        let err = engine
            .applications
            .apply(
                &vol,
                ApplyInput {
                    post_id: "later".to_string(),
                    message: None,
                },
            )
            .await
            .unwrap_err();
        match err {
            AppError::EligibilityDenied(message) => {
                assert!(message.contains("temporary restriction"));
                assert!(message.contains(&expires.format("%Y-%m-%d").to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_absences_escalate_once() {
        let stores = MemoryStores::new();
        let org = user("org", UserRole::Organization);
        stores.users.insert(org.clone()).await;
        seed_events(&stores, 3).await;
        let engine = engine(&stores);

        let marks = (0..3).map(|i| {
            let attendance = engine.attendance.clone();
            let org = org.clone();
            tokio::spawn(async move {
                attendance
                    .mark_attendance(&org, &format!("a{i}"), AttendanceStatus::Absent)
                    .await
            })
        });
        for handle in marks.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }

        let penalties = engine.stores.penalties.all().await;
        assert_eq!(penalties.len(), 1);
        assert_eq!(penalties[0].penalty_type, PenaltyType::Warning);
    }
}
