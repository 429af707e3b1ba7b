//! Post repository.

use std::sync::Arc;

use async_trait::async_trait;
use hub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};

use super::{PostFilter, PostStore};
use crate::entities::{
    Post,
    post::{self, PostStatus},
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// `lower(column) LIKE '%needle%'` with the needle lowercased.
fn lower_contains(column: post::Column, needle: &str) -> Condition {
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col((Post, column)))).like(format!("%{}%", needle.to_lowercase())),
    )
}

#[async_trait]
impl PostStore for PostRepository {
    async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_ids_by_author(&self, author_id: &str) -> AppResult<Vec<String>> {
        Post::find()
            .select_only()
            .column(post::Column::Id)
            .filter(post::Column::AuthorId.eq(author_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_published(
        &self,
        filter: &PostFilter,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find().filter(post::Column::Status.eq(PostStatus::Published));

        if let Some(category) = filter.category {
            query = query.filter(post::Column::Category.eq(category));
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let search = search.trim();
            query = query.filter(
                Condition::any()
                    .add(lower_contains(post::Column::Title, search))
                    .add(lower_contains(post::Column::Description, search)),
            );
        }

        query
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_status(&self, status: PostStatus) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::Status.eq(status))
            .order_by_desc(post::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_all(&self) -> AppResult<u64> {
        Post::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_by_status(&self, status: PostStatus) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }
}
