//! Admin moderation of posts and platform statistics.

use hub_common::{AppError, AppResult};
use hub_db::{
    entities::{
        post::{self, PostStatus},
        user,
    },
    repositories::{DynApplicationStore, DynPostStore, DynUserStore},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::penalty::require_admin;

/// What a moderator does with a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// Publish the post.
    Approve,
    /// Pull the post from the listing for review.
    Flag,
    /// Remove the post.
    Delete,
}

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_posts: u64,
    pub total_applications: u64,
    pub flagged_posts: u64,
}

/// Admin-only post moderation.
#[derive(Clone)]
pub struct ModerationService {
    post_store: DynPostStore,
    user_store: DynUserStore,
    application_store: DynApplicationStore,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        post_store: DynPostStore,
        user_store: DynUserStore,
        application_store: DynApplicationStore,
    ) -> Self {
        Self {
            post_store,
            user_store,
            application_store,
        }
    }

    async fn set_status(&self, id: &str, status: PostStatus) -> AppResult<post::Model> {
        let existing = self
            .post_store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let mut active: post::ActiveModel = existing.into();
        active.status = Set(status);
        self.post_store.update(active).await
    }

    /// Publish a post regardless of its current status.
    pub async fn approve_post(&self, admin: &user::Model, id: &str) -> AppResult<post::Model> {
        require_admin(admin)?;
        let post = self.set_status(id, PostStatus::Published).await?;
        info!(post_id = %id, admin_id = %admin.id, "Post approved");
        Ok(post)
    }

    /// Apply a moderation action. Returns the post unless it was deleted.
    pub async fn moderate(
        &self,
        admin: &user::Model,
        id: &str,
        action: ModerationAction,
    ) -> AppResult<Option<post::Model>> {
        require_admin(admin)?;

        let outcome = match action {
            ModerationAction::Approve => Some(self.set_status(id, PostStatus::Published).await?),
            ModerationAction::Flag => Some(self.set_status(id, PostStatus::Flagged).await?),
            ModerationAction::Delete => {
                self.post_store.delete(id).await?;
                None
            }
        };

        info!(post_id = %id, admin_id = %admin.id, action = ?action, "Post moderated");
        Ok(outcome)
    }

    /// Posts waiting on review after being flagged, newest first.
    pub async fn flagged_posts(&self, admin: &user::Model) -> AppResult<Vec<post::Model>> {
        require_admin(admin)?;
        self.post_store.find_by_status(PostStatus::Flagged).await
    }

    /// Posts submitted by organizations and not yet approved, newest first.
    pub async fn pending_posts(&self, admin: &user::Model) -> AppResult<Vec<post::Model>> {
        require_admin(admin)?;
        self.post_store
            .find_by_status(PostStatus::PendingApproval)
            .await
    }

    /// Current platform counters.
    pub async fn stats(&self, admin: &user::Model) -> AppResult<PlatformStats> {
        require_admin(admin)?;

        let (total_users, total_posts, total_applications, flagged_posts) = tokio::try_join!(
            self.user_store.count_all(),
            self.post_store.count_all(),
            self.application_store.count_all(),
            self.post_store.count_by_status(PostStatus::Flagged),
        )?;

        Ok(PlatformStats {
            total_users,
            total_posts,
            total_applications,
            flagged_posts,
        })
    }
}
