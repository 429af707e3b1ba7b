//! Certificate issuance and listing.

use std::collections::HashSet;

use chrono::Utc;
use hub_common::{AppError, AppResult, IdGenerator};
use hub_db::{
    entities::{
        certificate, post,
        user::{self, UserRole},
    },
    repositories::{DynApplicationStore, DynCertificateStore, DynPostStore},
};
use sea_orm::Set;
use serde::Serialize;
use tracing::{debug, info};
use validator::Validate;

use super::eligibility::EligibilityGate;

/// Input for issuing one certificate.
#[derive(Debug, Clone, Validate)]
pub struct IssueCertificateInput {
    pub volunteer_id: String,
    pub post_id: String,
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub certificate_url: Option<String>,
}

/// Input for issuing certificates to every attendee of a post.
#[derive(Debug, Clone, Validate)]
pub struct BulkIssueInput {
    pub post_id: String,
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub certificate_url: Option<String>,
}

/// Outcome counts of a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIssueResult {
    pub created: u64,
    pub skipped_existing: u64,
    pub skipped_penalty: u64,
    /// Always zero. Ineligible volunteers never enter the candidate set.
    pub skipped_not_eligible: u64,
}

/// Issues certificates to volunteers who attended.
#[derive(Clone)]
pub struct CertificateService {
    certificate_store: DynCertificateStore,
    application_store: DynApplicationStore,
    post_store: DynPostStore,
    gate: EligibilityGate,
    id_gen: IdGenerator,
}

impl CertificateService {
    /// Create a new certificate service.
    #[must_use]
    pub const fn new(
        certificate_store: DynCertificateStore,
        application_store: DynApplicationStore,
        post_store: DynPostStore,
        gate: EligibilityGate,
    ) -> Self {
        Self {
            certificate_store,
            application_store,
            post_store,
            gate,
            id_gen: IdGenerator::new(),
        }
    }

    /// Load a post the organization wrote.
    async fn owned_post(&self, actor: &user::Model, post_id: &str) -> AppResult<post::Model> {
        if actor.role != UserRole::Organization {
            return Err(AppError::Forbidden(
                "Only organizations can issue certificates".to_string(),
            ));
        }

        match self.post_store.find_by_id(post_id).await? {
            Some(post) if post.author_id == actor.id => Ok(post),
            _ => Err(AppError::NotFound(
                "Post not found or you don't own this post".to_string(),
            )),
        }
    }

    fn new_certificate(
        &self,
        volunteer_id: &str,
        post: &post::Model,
        title: &str,
        description: Option<String>,
        certificate_url: Option<String>,
    ) -> certificate::ActiveModel {
        certificate::ActiveModel {
            id: Set(self.id_gen.generate()),
            volunteer_id: Set(volunteer_id.to_string()),
            post_id: Set(post.id.clone()),
            organization_id: Set(post.organization_id.clone()),
            title: Set(title.to_string()),
            description: Set(description),
            certificate_url: Set(certificate_url),
            issued_date: Set(Utc::now().into()),
            verified: Set(false),
        }
    }

    /// Issue a certificate to one volunteer.
    pub async fn issue(
        &self,
        actor: &user::Model,
        input: IssueCertificateInput,
    ) -> AppResult<certificate::Model> {
        let post = self.owned_post(actor, &input.post_id).await?;
        input.validate()?;

        let application = self
            .application_store
            .find_by_volunteer_and_post(&input.volunteer_id, &post.id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Volunteer must have an approved application".to_string())
            })?;

        self.gate.check_certificate(&application).await?;

        if self
            .certificate_store
            .find_by_volunteer_and_post(&input.volunteer_id, &post.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Certificate already issued for this volunteer and post".to_string(),
            ));
        }

        let model = self.new_certificate(
            &input.volunteer_id,
            &post,
            &input.title,
            input.description,
            input.certificate_url,
        );
        let created = self.certificate_store.create(model).await?;
        info!(certificate_id = %created.id, volunteer_id = %created.volunteer_id, post_id = %created.post_id, "Certificate issued");

        Ok(created)
    }

    /// Issue certificates to every approved attendee of a post.
    ///
    /// Volunteers who already hold one are skipped first, then suspended
    /// volunteers. A unique-key conflict during creation counts as an
    /// existing certificate.
    pub async fn bulk_issue(
        &self,
        actor: &user::Model,
        input: BulkIssueInput,
    ) -> AppResult<BulkIssueResult> {
        let post = self.owned_post(actor, &input.post_id).await?;
        input.validate()?;

        let mut result = BulkIssueResult::default();

        let volunteer_ids = self
            .application_store
            .find_attended_volunteer_ids(&post.id)
            .await?;
        if volunteer_ids.is_empty() {
            return Ok(result);
        }

        let existing: HashSet<String> = self
            .certificate_store
            .find_by_posts(std::slice::from_ref(&post.id))
            .await?
            .into_iter()
            .map(|c| c.volunteer_id)
            .collect();
        let suspended = self.gate.suspended_among(&volunteer_ids).await?;

        for volunteer_id in &volunteer_ids {
            if existing.contains(volunteer_id) {
                result.skipped_existing += 1;
                continue;
            }
            if suspended.contains(volunteer_id) {
                result.skipped_penalty += 1;
                continue;
            }

            let model = self.new_certificate(
                volunteer_id,
                &post,
                &input.title,
                input.description.clone(),
                input.certificate_url.clone(),
            );
            match self.certificate_store.create(model).await {
                Ok(_) => result.created += 1,
                Err(AppError::Conflict(_)) => {
                    debug!(volunteer_id = %volunteer_id, post_id = %post.id, "Certificate created concurrently");
                    result.skipped_existing += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            post_id = %post.id,
            created = result.created,
            skipped_existing = result.skipped_existing,
            skipped_penalty = result.skipped_penalty,
            "Bulk certificate run finished"
        );

        Ok(result)
    }

    /// Certificates visible to the caller, newest first.
    ///
    /// Volunteers see their own, organizations those for posts they wrote,
    /// admins every certificate.
    pub async fn list_certificates(
        &self,
        actor: &user::Model,
    ) -> AppResult<Vec<certificate::Model>> {
        match actor.role {
            UserRole::Volunteer => self.certificate_store.find_by_volunteer(&actor.id).await,
            UserRole::Organization => {
                let post_ids = self.post_store.find_ids_by_author(&actor.id).await?;
                if post_ids.is_empty() {
                    return Ok(vec![]);
                }
                self.certificate_store.find_by_posts(&post_ids).await
            }
            UserRole::Admin => self.certificate_store.find_all().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hub_db::entities::{
        application::{self, ApplicationStatus, AttendanceStatus},
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

    fn attended(volunteer_id: &str, status: ApplicationStatus) -> application::Model {
        application::Model {
            id: format!("app-{volunteer_id}"),
            volunteer_id: volunteer_id.to_string(),
            post_id: "p1".to_string(),
            message: None,
            status,
            attendance_status: AttendanceStatus::Present,
            attendance_marked_at: Some(Utc::now().into()),
            created_at: Utc::now().into(),
        }
    }

    fn suspension(user_id: &str) -> penalty::Model {
        penalty::Model {
            id: format!("pen-{user_id}"),
            user_id: user_id.to_string(),
            penalty_type: PenaltyType::Suspension,
            status: PenaltyStatus::Active,
            reason: "Excessive Absences".to_string(),
            description: None,
            expires_at: None,
            created_at: Utc::now().into(),
            resolved_at: None,
            issued_by: None,
        }
    }

    async fn setup() -> (CertificateService, MemoryStores) {
        let stores = MemoryStores::new();
        stores
            .posts
            .insert(post::Model {
                id: "p1".to_string(),
                author_id: "org".to_string(),
                organization_id: Some("org-profile".to_string()),
                title: "Food bank shift".to_string(),
                description: "Help out for an afternoon".to_string(),
                category: PostCategory::Community,
                status: PostStatus::Closed,
                start_date: None,
                end_date: None,
                location: None,
                max_volunteers: None,
                created_at: Utc::now().into(),
            })
            .await;

        let service = CertificateService::new(
            stores.certificates.clone(),
            stores.applications.clone(),
            stores.posts.clone(),
            EligibilityGate::new(stores.penalties.clone()),
        );
        (service, stores)
    }

    fn issue_input(volunteer_id: &str) -> IssueCertificateInput {
        IssueCertificateInput {
            volunteer_id: volunteer_id.to_string(),
            post_id: "p1".to_string(),
            title: "Certificate of Service".to_string(),
            description: None,
            certificate_url: None,
        }
    }

    fn bulk_input() -> BulkIssueInput {
        BulkIssueInput {
            post_id: "p1".to_string(),
            title: "Certificate of Service".to_string(),
            description: Some("Thank you".to_string()),
            certificate_url: None,
        }
    }

    #[tokio::test]
    async fn test_issue_and_duplicate() {
        let (service, stores) = setup().await;
        let org = user("org", UserRole::Organization);
        stores
            .applications
            .insert(attended("vol", ApplicationStatus::Approved))
            .await;

        let created = service.issue(&org, issue_input("vol")).await.unwrap();
        assert_eq!(created.organization_id.as_deref(), Some("org-profile"));
        assert!(!created.verified);

        let err = service.issue(&org, issue_input("vol")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_issue_authorization() {
        let (service, stores) = setup().await;
        stores
            .applications
            .insert(attended("vol", ApplicationStatus::Approved))
            .await;

        let err = service
            .issue(&user("vol", UserRole::Volunteer), issue_input("vol"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(m) if m == "Only organizations can issue certificates"));

        let err = service
            .issue(&user("org2", UserRole::Organization), issue_input("vol"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(m) if m == "Post not found or you don't own this post"));
    }

    #[tokio::test]
    async fn test_issue_requires_approved_attendance_and_title() {
        let (service, stores) = setup().await;
        let org = user("org", UserRole::Organization);
        stores
            .applications
            .insert(attended("pending", ApplicationStatus::Pending))
            .await;

        assert!(matches!(
            service.issue(&org, issue_input("nobody")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.issue(&org, issue_input("pending")).await,
            Err(AppError::BadRequest(_))
        ));

        let mut short = issue_input("pending");
        short.title = "Hi".to_string();
        assert!(matches!(
            service.issue(&org, short).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_suspended_volunteer_gets_no_certificate() {
        let (service, stores) = setup().await;
        let org = user("org", UserRole::Organization);
        stores
            .applications
            .insert(attended("vol", ApplicationStatus::Approved))
            .await;
        stores.penalties.insert(suspension("vol")).await;

        let err = service.issue(&org, issue_input("vol")).await.unwrap_err();
        assert!(matches!(err, AppError::EligibilityDenied(_)));
    }

    #[tokio::test]
    async fn test_bulk_issue_partitions_and_reruns() {
        let (service, stores) = setup().await;
        let org = user("org", UserRole::Organization);
        for id in ["v1", "v2", "v3", "v4"] {
            stores
                .applications
                .insert(attended(id, ApplicationStatus::Approved))
                .await;
        }
        stores
            .applications
            .insert(attended("rejected", ApplicationStatus::Rejected))
            .await;
        stores.penalties.insert(suspension("v4")).await;
        service.issue(&org, issue_input("v1")).await.unwrap();

        let first = service.bulk_issue(&org, bulk_input()).await.unwrap();
        assert_eq!(
            first,
            BulkIssueResult {
                created: 2,
                skipped_existing: 1,
                skipped_penalty: 1,
                skipped_not_eligible: 0,
            }
        );

        let second = service.bulk_issue(&org, bulk_input()).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped_existing, 3);
        assert_eq!(second.skipped_penalty, 1);
    }

    #[tokio::test]
    async fn test_bulk_issue_without_attendees() {
        let (service, _) = setup().await;
        let result = service
            .bulk_issue(&user("org", UserRole::Organization), bulk_input())
            .await
            .unwrap();
        assert_eq!(result, BulkIssueResult::default());
    }

    #[tokio::test]
    async fn test_list_by_role() {
        let (service, stores) = setup().await;
        let org = user("org", UserRole::Organization);
        for id in ["v1", "v2"] {
            stores
                .applications
                .insert(attended(id, ApplicationStatus::Approved))
                .await;
        }
        service.bulk_issue(&org, bulk_input()).await.unwrap();

        let mine = service
            .list_certificates(&user("v1", UserRole::Volunteer))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].volunteer_id, "v1");

        assert_eq!(service.list_certificates(&org).await.unwrap().len(), 2);
        assert!(
            service
                .list_certificates(&user("org2", UserRole::Organization))
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            service
                .list_certificates(&user("admin", UserRole::Admin))
                .await
                .unwrap()
                .len(),
            2
        );
    }
}
