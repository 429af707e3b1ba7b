//! Certificate repository.

use std::sync::Arc;

use async_trait::async_trait;
use hub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use super::{CertificateStore, map_db_err};
use crate::entities::{Certificate, certificate};

/// Certificate repository for database operations.
#[derive(Clone)]
pub struct CertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateRepository {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CertificateStore for CertificateRepository {
    async fn create(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_db_err(e, "Certificate already issued for this volunteer and post"))
    }

    async fn find_by_volunteer_and_post(
        &self,
        volunteer_id: &str,
        post_id: &str,
    ) -> AppResult<Option<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::VolunteerId.eq(volunteer_id))
            .filter(certificate::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_volunteer(&self, volunteer_id: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::VolunteerId.eq(volunteer_id))
            .order_by_desc(certificate::Column::IssuedDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<certificate::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        Certificate::find()
            .filter(certificate::Column::PostId.is_in(post_ids.to_vec()))
            .order_by_desc(certificate::Column::IssuedDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_all(&self) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .order_by_desc(certificate::Column::IssuedDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
