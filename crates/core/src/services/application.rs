//! Application workflow: applying, withdrawing, and reviewing.

use chrono::Utc;
use hub_common::{AppError, AppResult, IdGenerator};
use hub_db::{
    entities::{
        application::{self, ApplicationStatus, AttendanceStatus},
        post,
        user::{self, UserRole},
    },
    repositories::{DynApplicationStore, DynPostStore},
};
use sea_orm::Set;
use tracing::info;
use validator::Validate;

use super::eligibility::EligibilityGate;

/// Input for applying to a post.
#[derive(Debug, Clone, Validate)]
pub struct ApplyInput {
    pub post_id: String,
    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,
}

/// Volunteer applications to posts.
#[derive(Clone)]
pub struct ApplicationService {
    application_store: DynApplicationStore,
    post_store: DynPostStore,
    gate: EligibilityGate,
    id_gen: IdGenerator,
}

impl ApplicationService {
    /// Create a new application service.
    #[must_use]
    pub const fn new(
        application_store: DynApplicationStore,
        post_store: DynPostStore,
        gate: EligibilityGate,
    ) -> Self {
        Self {
            application_store,
            post_store,
            gate,
            id_gen: IdGenerator::new(),
        }
    }

    async fn get_post(&self, post_id: &str) -> AppResult<post::Model> {
        self.post_store
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    async fn get_application(&self, id: &str) -> AppResult<application::Model> {
        self.application_store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))
    }

    /// Apply to a post as a volunteer.
    pub async fn apply(
        &self,
        actor: &user::Model,
        input: ApplyInput,
    ) -> AppResult<application::Model> {
        if actor.role != UserRole::Volunteer {
            return Err(AppError::Forbidden("Only volunteers can apply".to_string()));
        }
        input.validate()?;

        let post = self.get_post(&input.post_id).await?;

        self.gate.check_apply(&actor.id).await?;

        if self
            .application_store
            .find_by_volunteer_and_post(&actor.id, &post.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already applied to this post".to_string()));
        }

        let model = application::ActiveModel {
            id: Set(self.id_gen.generate()),
            volunteer_id: Set(actor.id.clone()),
            post_id: Set(post.id),
            message: Set(input.message.filter(|m| !m.trim().is_empty())),
            status: Set(ApplicationStatus::Pending),
            attendance_status: Set(AttendanceStatus::NotMarked),
            attendance_marked_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let created = self.application_store.create(model).await?;
        info!(application_id = %created.id, post_id = %created.post_id, volunteer_id = %actor.id, "Application submitted");

        Ok(created)
    }

    /// Withdraw one's own application.
    pub async fn withdraw(&self, actor: &user::Model, application_id: &str) -> AppResult<()> {
        let existing = self.get_application(application_id).await?;
        if existing.volunteer_id != actor.id {
            return Err(AppError::Forbidden(
                "You can only withdraw your own applications".to_string(),
            ));
        }

        self.application_store.delete(application_id).await?;
        info!(application_id = %application_id, "Application withdrawn");
        Ok(())
    }

    /// Approve or reject an application. Only the post author may review.
    pub async fn update_status(
        &self,
        actor: &user::Model,
        application_id: &str,
        status: ApplicationStatus,
    ) -> AppResult<application::Model> {
        let existing = self.get_application(application_id).await?;
        let post = self.get_post(&existing.post_id).await?;
        if post.author_id != actor.id {
            return Err(AppError::Forbidden(
                "Only the post author can review applications".to_string(),
            ));
        }

        let mut active: application::ActiveModel = existing.into();
        active.status = Set(status);

        let updated = self.application_store.update(active).await?;
        info!(application_id = %updated.id, status = ?status, "Application reviewed");
        Ok(updated)
    }

    /// Applications to a post, newest first. Only the post author may list them.
    pub async fn list_for_post(
        &self,
        actor: &user::Model,
        post_id: &str,
    ) -> AppResult<Vec<application::Model>> {
        let post = self.get_post(post_id).await?;
        if post.author_id != actor.id {
            return Err(AppError::Forbidden(
                "Only the post author can view applications".to_string(),
            ));
        }

        self.application_store.find_by_post(post_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use hub_db::entities::{
        penalty::{self, PenaltyStatus, PenaltyType},
        post::{PostCategory, PostStatus},
    };

    use super::*;
    use crate::memory::MemoryStores;

    fn user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: None,
            email: format!("{id}@example.test"),
            role,
            token: None,
            created_at: Utc::now().into(),
        }
    }

    async fn setup() -> (ApplicationService, MemoryStores) {
        let stores = MemoryStores::new();
        stores
            .posts
            .insert(post::Model {
                id: "p1".to_string(),
                author_id: "org".to_string(),
                organization_id: None,
                title: "Beach cleanup".to_string(),
                description: "Help out for an afternoon".to_string(),
                category: PostCategory::Environment,
                status: PostStatus::Published,
                start_date: None,
                end_date: None,
                location: Some("Pier 4".to_string()),
                max_volunteers: None,
                created_at: Utc::now().into(),
            })
            .await;

        let service = ApplicationService::new(
            stores.applications.clone(),
            stores.posts.clone(),
            EligibilityGate::new(stores.penalties.clone()),
        );
        (service, stores)
    }

    fn apply_input(message: Option<&str>) -> ApplyInput {
        ApplyInput {
            post_id: "p1".to_string(),
            message: message.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_apply_creates_pending_application() {
        let (service, _) = setup().await;
        let vol = user("vol", UserRole::Volunteer);

        let created = service
            .apply(&vol, apply_input(Some("Happy to help")))
            .await
            .unwrap();
        assert_eq!(created.status, ApplicationStatus::Pending);
        assert_eq!(created.attendance_status, AttendanceStatus::NotMarked);
        assert_eq!(created.message.as_deref(), Some("Happy to help"));
    }

    #[tokio::test]
    async fn test_apply_rejections() {
        let (service, _) = setup().await;
        let vol = user("vol", UserRole::Volunteer);

        let err = service
            .apply(&user("org", UserRole::Organization), apply_input(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(m) if m == "Only volunteers can apply"));

        let err = service
            .apply(
                &vol,
                ApplyInput {
                    post_id: "missing".to_string(),
                    message: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .apply(&vol, apply_input(Some(&"x".repeat(2001))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        service.apply(&vol, apply_input(None)).await.unwrap();
        let err = service.apply(&vol, apply_input(None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(m) if m == "Already applied to this post"));
    }

    #[tokio::test]
    async fn test_suspended_volunteer_cannot_apply() {
        let (service, stores) = setup().await;
        stores
            .penalties
            .insert(penalty::Model {
                id: "pen".to_string(),
                user_id: "vol".to_string(),
                penalty_type: PenaltyType::Suspension,
                status: PenaltyStatus::Active,
                reason: "Excessive Absences".to_string(),
                description: None,
                expires_at: Some((Utc::now() + Duration::days(60)).into()),
                created_at: Utc::now().into(),
                resolved_at: None,
                issued_by: None,
            })
            .await;

        let err = service
            .apply(&user("vol", UserRole::Volunteer), apply_input(None))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::EligibilityDenied(m) if m.starts_with("Your account is suspended"))
        );
    }

    #[tokio::test]
    async fn test_review_and_withdraw_ownership() {
        let (service, _) = setup().await;
        let vol = user("vol", UserRole::Volunteer);
        let org = user("org", UserRole::Organization);
        let created = service.apply(&vol, apply_input(None)).await.unwrap();

        assert!(matches!(
            service
                .update_status(&vol, &created.id, ApplicationStatus::Approved)
                .await,
            Err(AppError::Forbidden(_))
        ));
        let approved = service
            .update_status(&org, &created.id, ApplicationStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);

        assert!(matches!(
            service.list_for_post(&vol, "p1").await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(service.list_for_post(&org, "p1").await.unwrap().len(), 1);

        assert!(matches!(
            service.withdraw(&org, &created.id).await,
            Err(AppError::Forbidden(_))
        ));
        service.withdraw(&vol, &created.id).await.unwrap();
        assert!(service.list_for_post(&org, "p1").await.unwrap().is_empty());
    }
}
