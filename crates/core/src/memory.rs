//! In-memory store implementations.
//!
//! These back the service and router tests. They honour the same contracts
//! as the sea-orm repositories, including unique keys and ordering.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_common::{AppError, AppResult};
use hub_db::{
    entities::{
        application::{self, ApplicationStatus, AttendanceStatus},
        certificate,
        penalty::{self, PenaltyStatus},
        post::{self, PostStatus},
        user::{self, UserRole},
    },
    repositories::{
        ApplicationStore, CertificateStore, PenaltyStore, PostFilter, PostStore, UserStore,
    },
};
use sea_orm::{ModelTrait, TryIntoModel};
use tokio::sync::RwLock;

fn into_model<A, M>(model: A) -> AppResult<M>
where
    A: TryIntoModel<M>,
    M: ModelTrait,
{
    model
        .try_into_model()
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

/// Accounts held in memory.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<Vec<user::Model>>,
}

impl MemoryUserStore {
    /// Add a user.
    pub async fn insert(&self, model: user::Model) {
        self.rows.write().await.push(model);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        Ok(self.rows.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|u| u.token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<user::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        Ok(newest_first(rows, |u| u.created_at.to_utc()))
    }

    async fn count_all(&self) -> AppResult<u64> {
        Ok(self.rows.read().await.len() as u64)
    }
}

/// Posts held in memory.
///
/// Deleting a post leaves its applications and certificates in place.
#[derive(Default)]
pub struct MemoryPostStore {
    rows: RwLock<Vec<post::Model>>,
}

impl MemoryPostStore {
    /// Add a post.
    pub async fn insert(&self, model: post::Model) {
        self.rows.write().await.push(model);
    }
}

fn matches_filter(post: &post::Model, filter: &PostFilter) -> bool {
    if filter.category.is_some_and(|c| c != post.category) {
        return false;
    }
    match filter.search.as_deref().map(str::trim) {
        Some(search) if !search.is_empty() => {
            let needle = search.to_lowercase();
            post.title.to_lowercase().contains(&needle)
                || post.description.to_lowercase().contains(&needle)
        }
        _ => true,
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        let model: post::Model = into_model(model)?;
        self.rows.write().await.push(model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Ok(self.rows.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_ids_by_author(&self, author_id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.author_id == author_id)
            .map(|p| p.id.clone())
            .collect())
    }

    async fn find_published(
        &self,
        filter: &PostFilter,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.status == PostStatus::Published && matches_filter(p, filter))
            .cloned()
            .collect();
        let mut rows = newest_first(rows, |p| p.created_at.to_utc());
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn find_by_status(&self, status: PostStatus) -> AppResult<Vec<post::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        Ok(newest_first(rows, |p| p.created_at.to_utc()))
    }

    async fn count_all(&self) -> AppResult<u64> {
        Ok(self.rows.read().await.len() as u64)
    }

    async fn count_by_status(&self, status: PostStatus) -> AppResult<u64> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.status == status)
            .count() as u64)
    }

    async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        let model: post::Model = into_model(model)?;
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|p| p.id == model.id)
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        *row = model.clone();
        Ok(model)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }
}

/// Applications held in memory.
#[derive(Default)]
pub struct MemoryApplicationStore {
    rows: RwLock<Vec<application::Model>>,
}

impl MemoryApplicationStore {
    /// Add an application as is, bypassing the unique key check.
    pub async fn insert(&self, model: application::Model) {
        self.rows.write().await.push(model);
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn create(&self, model: application::ActiveModel) -> AppResult<application::Model> {
        let model: application::Model = into_model(model)?;
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|a| a.volunteer_id == model.volunteer_id && a.post_id == model.post_id)
        {
            return Err(AppError::Conflict("Already applied to this post".to_string()));
        }
        rows.push(model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<application::Model>> {
        Ok(self.rows.read().await.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_volunteer_and_post(
        &self,
        volunteer_id: &str,
        post_id: &str,
    ) -> AppResult<Option<application::Model>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|a| a.volunteer_id == volunteer_id && a.post_id == post_id)
            .cloned())
    }

    async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<application::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|a| a.post_id == post_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| a.created_at.to_utc()))
    }

    async fn find_marked(&self) -> AppResult<Vec<application::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|a| a.attendance_status != AttendanceStatus::NotMarked)
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| {
            a.attendance_marked_at
                .map_or(DateTime::<Utc>::MIN_UTC, |t| t.to_utc())
        }))
    }

    async fn find_attended_volunteer_ids(&self, post_id: &str) -> AppResult<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        for a in self.rows.read().await.iter() {
            if a.post_id == post_id
                && a.status == ApplicationStatus::Approved
                && a.attendance_status == AttendanceStatus::Present
                && !ids.contains(&a.volunteer_id)
            {
                ids.push(a.volunteer_id.clone());
            }
        }
        Ok(ids)
    }

    async fn count_absences_since(
        &self,
        volunteer_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        let count = self
            .rows
            .read()
            .await
            .iter()
            .filter(|a| {
                a.volunteer_id == volunteer_id
                    && a.attendance_status == AttendanceStatus::Absent
                    && a.attendance_marked_at.is_some_and(|t| t.to_utc() >= since)
            })
            .count();
        Ok(count as u64)
    }

    async fn count_all(&self) -> AppResult<u64> {
        Ok(self.rows.read().await.len() as u64)
    }

    async fn update(&self, model: application::ActiveModel) -> AppResult<application::Model> {
        let model: application::Model = into_model(model)?;
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|a| a.id == model.id)
            .ok_or_else(|| AppError::NotFound(format!("Application {} not found", model.id)))?;
        *row = model.clone();
        Ok(model)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|a| a.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound(format!("Application {id} not found")));
        }
        Ok(())
    }
}

/// Penalties held in memory.
#[derive(Default)]
pub struct MemoryPenaltyStore {
    rows: RwLock<Vec<penalty::Model>>,
}

impl MemoryPenaltyStore {
    /// Add a penalty as is.
    pub async fn insert(&self, model: penalty::Model) {
        self.rows.write().await.push(model);
    }

    /// Snapshot of every stored penalty in insertion order.
    pub async fn all(&self) -> Vec<penalty::Model> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl PenaltyStore for MemoryPenaltyStore {
    async fn create(&self, model: penalty::ActiveModel) -> AppResult<penalty::Model> {
        let model: penalty::Model = into_model(model)?;
        self.rows.write().await.push(model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<penalty::Model>> {
        Ok(self.rows.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<penalty::Model>> {
        let rows = self.rows.read().await.clone();
        Ok(newest_first(rows, |p| p.created_at.to_utc()))
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<penalty::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |p| p.created_at.to_utc()))
    }

    async fn find_active_by_users(&self, user_ids: &[String]) -> AppResult<Vec<penalty::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.status == PenaltyStatus::Active && user_ids.contains(&p.user_id))
            .cloned()
            .collect();
        Ok(newest_first(rows, |p| p.created_at.to_utc()))
    }

    async fn update(&self, model: penalty::ActiveModel) -> AppResult<penalty::Model> {
        let model: penalty::Model = into_model(model)?;
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|p| p.id == model.id)
            .ok_or_else(|| AppError::NotFound(format!("Penalty {} not found", model.id)))?;
        *row = model.clone();
        Ok(model)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound(format!("Penalty {id} not found")));
        }
        Ok(())
    }
}

/// Certificates held in memory.
#[derive(Default)]
pub struct MemoryCertificateStore {
    rows: RwLock<Vec<certificate::Model>>,
}

#[async_trait]
impl CertificateStore for MemoryCertificateStore {
    async fn create(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        let model: certificate::Model = into_model(model)?;
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|c| c.volunteer_id == model.volunteer_id && c.post_id == model.post_id)
        {
            return Err(AppError::Conflict(
                "Certificate already issued for this volunteer and post".to_string(),
            ));
        }
        rows.push(model.clone());
        Ok(model)
    }

    async fn find_by_volunteer_and_post(
        &self,
        volunteer_id: &str,
        post_id: &str,
    ) -> AppResult<Option<certificate::Model>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|c| c.volunteer_id == volunteer_id && c.post_id == post_id)
            .cloned())
    }

    async fn find_by_volunteer(&self, volunteer_id: &str) -> AppResult<Vec<certificate::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| c.volunteer_id == volunteer_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |c| c.issued_date.to_utc()))
    }

    async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<certificate::Model>> {
        let rows = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| post_ids.contains(&c.post_id))
            .cloned()
            .collect();
        Ok(newest_first(rows, |c| c.issued_date.to_utc()))
    }

    async fn find_all(&self) -> AppResult<Vec<certificate::Model>> {
        let rows = self.rows.read().await.clone();
        Ok(newest_first(rows, |c| c.issued_date.to_utc()))
    }
}

/// One instance of every in-memory store, shared by the services under test.
#[derive(Clone, Default)]
pub struct MemoryStores {
    /// Accounts.
    pub users: Arc<MemoryUserStore>,
    /// Posts.
    pub posts: Arc<MemoryPostStore>,
    /// Applications.
    pub applications: Arc<MemoryApplicationStore>,
    /// Penalties.
    pub penalties: Arc<MemoryPenaltyStore>,
    /// Certificates.
    pub certificates: Arc<MemoryCertificateStore>,
}

impl MemoryStores {
    /// Create empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
