//! Penalty repository.

use std::sync::Arc;

use async_trait::async_trait;
use hub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use super::PenaltyStore;
use crate::entities::{
    Penalty,
    penalty::{self, PenaltyStatus},
};

/// Penalty repository for database operations.
#[derive(Clone)]
pub struct PenaltyRepository {
    db: Arc<DatabaseConnection>,
}

impl PenaltyRepository {
    /// Create a new penalty repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PenaltyStore for PenaltyRepository {
    async fn create(&self, model: penalty::ActiveModel) -> AppResult<penalty::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<penalty::Model>> {
        Penalty::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_all(&self) -> AppResult<Vec<penalty::Model>> {
        Penalty::find()
            .order_by_desc(penalty::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<penalty::Model>> {
        Penalty::find()
            .filter(penalty::Column::UserId.eq(user_id))
            .order_by_desc(penalty::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_active_by_users(&self, user_ids: &[String]) -> AppResult<Vec<penalty::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        Penalty::find()
            .filter(penalty::Column::UserId.is_in(user_ids.to_vec()))
            .filter(penalty::Column::Status.eq(PenaltyStatus::Active))
            .order_by_desc(penalty::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update(&self, model: penalty::ActiveModel) -> AppResult<penalty::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Penalty::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Penalty {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::penalty::PenaltyType;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_penalty(id: &str, user_id: &str, penalty_type: PenaltyType) -> penalty::Model {
        penalty::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            penalty_type,
            status: PenaltyStatus::Active,
            reason: "Multiple Absences".to_string(),
            description: None,
            expires_at: None,
            created_at: Utc::now().into(),
            resolved_at: None,
            issued_by: None,
        }
    }

    #[tokio::test]
    async fn test_find_active_by_users_empty_input_skips_query() {
        // No query results appended: a query would fail
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PenaltyRepository::new(db);
        let result = repo.find_active_by_users(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let p1 = create_test_penalty("p1", "vol1", PenaltyType::Warning);
        let p2 = create_test_penalty("p2", "vol1", PenaltyType::TemporaryRestriction);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p2.clone(), p1.clone()]])
                .into_connection(),
        );

        let repo = PenaltyRepository::new(db);
        let result = repo.find_by_user("vol1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].penalty_type, PenaltyType::TemporaryRestriction);
    }

    #[tokio::test]
    async fn test_create_penalty() {
        let penalty = create_test_penalty("p1", "vol1", PenaltyType::Suspension);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[penalty.clone()]])
                .into_connection(),
        );

        let repo = PenaltyRepository::new(db);
        let active = penalty::ActiveModel {
            id: Set("p1".to_string()),
            user_id: Set("vol1".to_string()),
            penalty_type: Set(PenaltyType::Suspension),
            ..Default::default()
        };

        let created = repo.create(active).await.unwrap();
        assert_eq!(created.penalty_type, PenaltyType::Suspension);
    }

    #[tokio::test]
    async fn test_delete_penalty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PenaltyRepository::new(db);
        assert!(repo.delete("p1").await.is_ok());
    }
}
