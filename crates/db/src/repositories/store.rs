//! Storage seams used by the service layer.
//!
//! Each trait is implemented by the sea-orm repository of the same entity.
//! Services hold them as `Arc<dyn …>` so the engine can run against any
//! backing store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_common::{AppError, AppResult};

use crate::entities::{
    application, certificate, penalty,
    post::{self, PostCategory, PostStatus},
    user::{self, UserRole},
};

/// Filters for the public post listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Only posts of this category.
    pub category: Option<PostCategory>,
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
}

/// Read access to accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>>;

    /// Find a user by bearer token.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>>;

    /// Users holding `role`, newest first.
    async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<user::Model>>;

    /// Number of accounts.
    async fn count_all(&self) -> AppResult<u64>;

    /// Find a user by ID, returning an error if not found.
    async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
    }
}

/// Volunteer opportunities.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a post.
    async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model>;

    /// Find a post by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>>;

    /// IDs of every post written by `author_id`.
    async fn find_ids_by_author(&self, author_id: &str) -> AppResult<Vec<String>>;

    /// PUBLISHED posts matching `filter`, newest first, at most `limit`.
    async fn find_published(&self, filter: &PostFilter, limit: u64)
    -> AppResult<Vec<post::Model>>;

    /// Posts in `status`, newest first.
    async fn find_by_status(&self, status: PostStatus) -> AppResult<Vec<post::Model>>;

    /// Number of posts.
    async fn count_all(&self) -> AppResult<u64>;

    /// Number of posts in `status`.
    async fn count_by_status(&self, status: PostStatus) -> AppResult<u64>;

    /// Update a post.
    async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model>;

    /// Delete a post together with its applications and certificates. Missing rows are `NotFound`.
    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Applications and their attendance marks.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert an application. A duplicate `(volunteer_id, post_id)` is a `Conflict`.
    async fn create(&self, model: application::ActiveModel) -> AppResult<application::Model>;

    /// Find an application by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<application::Model>>;

    /// Find the application of a volunteer to a post.
    async fn find_by_volunteer_and_post(
        &self,
        volunteer_id: &str,
        post_id: &str,
    ) -> AppResult<Option<application::Model>>;

    /// Applications of a post, newest first.
    async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<application::Model>>;

    /// Every application with a PRESENT or ABSENT mark, most recently marked first.
    async fn find_marked(&self) -> AppResult<Vec<application::Model>>;

    /// Distinct volunteers with an APPROVED application marked PRESENT on the post.
    async fn find_attended_volunteer_ids(&self, post_id: &str) -> AppResult<Vec<String>>;

    /// Count ABSENT marks of a volunteer recorded at or after `since`.
    async fn count_absences_since(&self, volunteer_id: &str, since: DateTime<Utc>)
    -> AppResult<u64>;

    /// Number of applications.
    async fn count_all(&self) -> AppResult<u64>;

    /// Update an application.
    async fn update(&self, model: application::ActiveModel) -> AppResult<application::Model>;

    /// Delete an application.
    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Penalty records.
#[async_trait]
pub trait PenaltyStore: Send + Sync {
    /// Insert a penalty.
    async fn create(&self, model: penalty::ActiveModel) -> AppResult<penalty::Model>;

    /// Find a penalty by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<penalty::Model>>;

    /// Every penalty, newest first.
    async fn find_all(&self) -> AppResult<Vec<penalty::Model>>;

    /// Every penalty of a user, newest first.
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<penalty::Model>>;

    /// Penalties with stored status ACTIVE for any of the given users.
    ///
    /// Expiry is not applied here; callers decide effectiveness at their own instant.
    async fn find_active_by_users(&self, user_ids: &[String]) -> AppResult<Vec<penalty::Model>>;

    /// Update a penalty.
    async fn update(&self, model: penalty::ActiveModel) -> AppResult<penalty::Model>;

    /// Delete a penalty. Missing rows are `NotFound`.
    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Issued certificates.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Insert a certificate. A duplicate `(volunteer_id, post_id)` is a `Conflict`.
    async fn create(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model>;

    /// Find the certificate of a volunteer for a post.
    async fn find_by_volunteer_and_post(
        &self,
        volunteer_id: &str,
        post_id: &str,
    ) -> AppResult<Option<certificate::Model>>;

    /// Certificates of a volunteer, newest first.
    async fn find_by_volunteer(&self, volunteer_id: &str) -> AppResult<Vec<certificate::Model>>;

    /// Certificates issued for any of the given posts, newest first.
    async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<certificate::Model>>;

    /// Every certificate, newest first.
    async fn find_all(&self) -> AppResult<Vec<certificate::Model>>;
}

/// Shared user store.
pub type DynUserStore = Arc<dyn UserStore>;
/// Shared post store.
pub type DynPostStore = Arc<dyn PostStore>;
/// Shared application store.
pub type DynApplicationStore = Arc<dyn ApplicationStore>;
/// Shared penalty store.
pub type DynPenaltyStore = Arc<dyn PenaltyStore>;
/// Shared certificate store.
pub type DynCertificateStore = Arc<dyn CertificateStore>;
