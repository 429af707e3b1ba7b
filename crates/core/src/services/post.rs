//! Volunteer opportunities: authoring and publication.

use chrono::{DateTime, Utc};
use hub_common::{AppError, AppResult, IdGenerator};
use hub_db::{
    entities::{
        post::{self, PostCategory, PostStatus},
        user::{self, UserRole},
    },
    repositories::{DynPostStore, PostFilter},
};
use sea_orm::Set;
use tracing::info;
use validator::Validate;

/// Most posts returned by the public listing.
pub const PUBLISHED_LIMIT: u64 = 100;

/// Editable fields of a post.
#[derive(Debug, Clone, Validate)]
pub struct PostInput {
    #[validate(length(min = 3, max = 256, message = "Title must be between 3 and 256 characters"))]
    pub title: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    pub category: PostCategory,
    #[validate(length(max = 512, message = "Location must be at most 512 characters"))]
    pub location: Option<String>,
    #[validate(range(min = 1, message = "Max volunteers must be positive"))]
    pub max_volunteers: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl PostInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end <= start
        {
            return Err(AppError::Validation(
                "End date must be after start date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Authoring and publication of posts.
#[derive(Clone)]
pub struct PostService {
    post_store: DynPostStore,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_store: DynPostStore) -> Self {
        Self {
            post_store,
            id_gen: IdGenerator::new(),
        }
    }

    /// Load a post or fail with `NotFound`.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.post_store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    async fn authored(&self, actor: &user::Model, id: &str) -> AppResult<post::Model> {
        let post = self.get(id).await?;
        if post.author_id != actor.id {
            return Err(AppError::Forbidden(
                "Only the post author can change this post".to_string(),
            ));
        }
        Ok(post)
    }

    /// Published posts, newest first.
    pub async fn list_published(&self, filter: PostFilter) -> AppResult<Vec<post::Model>> {
        self.post_store
            .find_published(&filter, PUBLISHED_LIMIT)
            .await
    }

    /// Create a post.
    ///
    /// Organization posts wait for admin approval. Posts by anyone else go
    /// live immediately.
    pub async fn create(&self, actor: &user::Model, input: PostInput) -> AppResult<post::Model> {
        input.check()?;

        let is_organization = actor.role == UserRole::Organization;
        let status = if is_organization {
            PostStatus::PendingApproval
        } else {
            PostStatus::Published
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(actor.id.clone()),
            organization_id: Set(is_organization.then(|| actor.id.clone())),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            status: Set(status),
            start_date: Set(input.start_date.map(Into::into)),
            end_date: Set(input.end_date.map(Into::into)),
            location: Set(input.location.filter(|l| !l.trim().is_empty())),
            max_volunteers: Set(input.max_volunteers),
            created_at: Set(Utc::now().into()),
        };

        let created = self.post_store.create(model).await?;
        info!(post_id = %created.id, author_id = %actor.id, status = ?created.status, "Post created");

        Ok(created)
    }

    /// Replace the editable fields of one's own post.
    ///
    /// `status` may only take a post offline (DRAFT) or close it. Going live
    /// goes through [`PostService::publish`].
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: PostInput,
        status: Option<PostStatus>,
    ) -> AppResult<post::Model> {
        let existing = self.authored(actor, id).await?;
        input.check()?;

        let status = match status {
            None => existing.status,
            Some(s @ (PostStatus::Draft | PostStatus::Closed)) => s,
            Some(_) => {
                return Err(AppError::BadRequest(
                    "A post can only be moved to DRAFT or CLOSED directly".to_string(),
                ));
            }
        };

        let mut active: post::ActiveModel = existing.into();
        active.title = Set(input.title);
        active.description = Set(input.description);
        active.category = Set(input.category);
        active.location = Set(input.location.filter(|l| !l.trim().is_empty()));
        active.max_volunteers = Set(input.max_volunteers);
        active.start_date = Set(input.start_date.map(Into::into));
        active.end_date = Set(input.end_date.map(Into::into));
        active.status = Set(status);

        let updated = self.post_store.update(active).await?;
        info!(post_id = %updated.id, status = ?updated.status, "Post updated");
        Ok(updated)
    }

    /// Put one's own draft or closed post back online.
    ///
    /// Organization posts re-enter the approval queue. Posts waiting on a
    /// moderator cannot be published by their author.
    pub async fn publish(&self, actor: &user::Model, id: &str) -> AppResult<post::Model> {
        let existing = self.authored(actor, id).await?;

        let next = match existing.status {
            PostStatus::Published => return Ok(existing),
            PostStatus::PendingApproval | PostStatus::Flagged => {
                return Err(AppError::BadRequest(
                    "Post is awaiting moderation".to_string(),
                ));
            }
            PostStatus::Draft | PostStatus::Closed if actor.role == UserRole::Organization => {
                PostStatus::PendingApproval
            }
            PostStatus::Draft | PostStatus::Closed => PostStatus::Published,
        };

        let mut active: post::ActiveModel = existing.into();
        active.status = Set(next);

        let updated = self.post_store.update(active).await?;
        info!(post_id = %updated.id, status = ?next, "Post published");
        Ok(updated)
    }

    /// Delete a post. Its author and admins may do so.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let post = self.get(id).await?;
        if post.author_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only the post author or an admin can delete this post".to_string(),
            ));
        }

        self.post_store.delete(id).await?;
        info!(post_id = %id, actor_id = %actor.id, "Post deleted");
        Ok(())
    }
}
