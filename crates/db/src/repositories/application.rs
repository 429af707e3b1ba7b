//! Application repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::{ApplicationStore, map_db_err};
use crate::entities::{
    Application,
    application::{self, ApplicationStatus, AttendanceStatus},
};

/// Application repository for database operations.
#[derive(Clone)]
pub struct ApplicationRepository {
    db: Arc<DatabaseConnection>,
}

impl ApplicationRepository {
    /// Create a new application repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApplicationStore for ApplicationRepository {
    async fn create(&self, model: application::ActiveModel) -> AppResult<application::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_db_err(e, "Already applied to this post"))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<application::Model>> {
        Application::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_volunteer_and_post(
        &self,
        volunteer_id: &str,
        post_id: &str,
    ) -> AppResult<Option<application::Model>> {
        Application::find()
            .filter(application::Column::VolunteerId.eq(volunteer_id))
            .filter(application::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<application::Model>> {
        Application::find()
            .filter(application::Column::PostId.eq(post_id))
            .order_by_desc(application::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_marked(&self) -> AppResult<Vec<application::Model>> {
        Application::find()
            .filter(
                application::Column::AttendanceStatus
                    .is_in([AttendanceStatus::Present, AttendanceStatus::Absent]),
            )
            .order_by_desc(application::Column::AttendanceMarkedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_attended_volunteer_ids(&self, post_id: &str) -> AppResult<Vec<String>> {
        Application::find()
            .select_only()
            .column(application::Column::VolunteerId)
            .distinct()
            .filter(application::Column::PostId.eq(post_id))
            .filter(application::Column::Status.eq(ApplicationStatus::Approved))
            .filter(application::Column::AttendanceStatus.eq(AttendanceStatus::Present))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_absences_since(
        &self,
        volunteer_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        Application::find()
            .filter(application::Column::VolunteerId.eq(volunteer_id))
            .filter(application::Column::AttendanceStatus.eq(AttendanceStatus::Absent))
            .filter(application::Column::AttendanceMarkedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_all(&self) -> AppResult<u64> {
        Application::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update(&self, model: application::ActiveModel) -> AppResult<application::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Application::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Application {id} not found")));
        }
        Ok(())
    }
}
