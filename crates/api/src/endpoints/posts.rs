//! Post endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use hub_common::AppResult;
use hub_core::PostInput;
use hub_db::{
    entities::post::{self as post_entity, PostCategory, PostStatus},
    repositories::PostFilter,
};
use serde::{Deserialize, Serialize};

use super::applications::ApplicationResponse;
use crate::{
    extractors::{ApiJson, ApiQuery, AuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Post response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub organization_id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: PostCategory,
    pub status: PostStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub max_volunteers: Option<i32>,
    pub created_at: String,
}

impl From<post_entity::Model> for PostResponse {
    fn from(post: post_entity::Model) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            organization_id: post.organization_id,
            title: post.title,
            description: post.description,
            category: post.category,
            status: post.status,
            start_date: post.start_date.map(|t| t.to_rfc3339()),
            end_date: post.end_date.map(|t| t.to_rfc3339()),
            location: post.location,
            max_volunteers: post.max_volunteers,
            created_at: post.created_at.to_rfc3339(),
        }
    }
}

/// Create or update post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    pub description: String,
    pub category: PostCategory,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub max_volunteers: Option<i32>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Only honored on update.
    #[serde(default)]
    pub status: Option<PostStatus>,
}

impl PostRequest {
    fn into_parts(self) -> (PostInput, Option<PostStatus>) {
        let input = PostInput {
            title: self.title,
            description: self.description,
            category: self.category,
            location: self.location,
            max_volunteers: self.max_volunteers,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        (input, self.status)
    }
}

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default)]
    pub category: Option<PostCategory>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Published posts. No authentication required.
async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPostsQuery>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let posts = state
        .post_service
        .list_published(PostFilter {
            category: query.category,
            search: query.search,
        })
        .await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

async fn create_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let (input, _) = req.into_parts();
    let created = state.post_service.create(&user, input).await?;
    Ok(ApiResponse::created(created.into()))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&id).await?;
    Ok(ApiResponse::ok(post.into()))
}

async fn update_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<PostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let (input, status) = req.into_parts();
    let updated = state.post_service.update(&user, &id, input, status).await?;
    Ok(ApiResponse::ok(updated.into()))
}

async fn delete_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(&user, &id).await?;
    Ok(no_content())
}

async fn publish_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let published = state.post_service.publish(&user, &id).await?;
    Ok(ApiResponse::ok(published.into()))
}

/// Applications to a post, for its author.
async fn list_applications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<ApplicationResponse>>> {
    let applications = state.application_service.list_for_post(&user, &id).await?;
    Ok(ApiResponse::ok(
        applications.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/publish", post(publish_post))
        .route("/{id}/applications", get(list_applications))
}
