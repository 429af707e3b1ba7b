//! Admin endpoints: penalties, post moderation, attendance and platform stats.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use hub_common::AppResult;
use hub_core::{AttendanceSummary, CreatePenaltyInput, ModerationAction, PlatformStats};
use hub_db::entities::penalty::{PenaltyStatus, PenaltyType};
use serde::Deserialize;

use super::{penalties::PenaltyResponse, posts::PostResponse};
use crate::{
    extractors::{ApiJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Create penalty request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePenaltyRequest {
    pub user_id: String,
    #[serde(rename = "type")]
    pub penalty_type: PenaltyType,
    pub reason: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Update penalty request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePenaltyRequest {
    pub status: PenaltyStatus,
}

/// Moderation request.
#[derive(Debug, Deserialize)]
pub struct ModeratePostRequest {
    pub action: ModerationAction,
}

async fn list_penalties(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PenaltyResponse>>> {
    let penalties = state.penalty_service.list_penalties(&user).await?;
    Ok(ApiResponse::ok(penalties.into_iter().map(Into::into).collect()))
}

async fn create_penalty(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePenaltyRequest>,
) -> AppResult<ApiResponse<PenaltyResponse>> {
    let penalty = state
        .penalty_service
        .create_penalty(
            &user,
            CreatePenaltyInput {
                user_id: req.user_id,
                penalty_type: req.penalty_type,
                reason: req.reason,
                description: req.description,
                expires_at: req.expires_at,
            },
        )
        .await?;

    Ok(ApiResponse::created(penalty.into()))
}

async fn update_penalty(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdatePenaltyRequest>,
) -> AppResult<ApiResponse<PenaltyResponse>> {
    let penalty = state
        .penalty_service
        .update_status(&user, &id, req.status)
        .await?;

    Ok(ApiResponse::ok(penalty.into()))
}

async fn delete_penalty(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.penalty_service.delete_penalty(&user, &id).await?;
    Ok(no_content())
}

async fn attendance_overview(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AttendanceSummary>>> {
    let overview = state.attendance_service.attendance_overview(&user).await?;
    Ok(ApiResponse::ok(overview))
}

async fn approve_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.moderation_service.approve_post(&user, &id).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// `data` is the post after the action, or `null` once deleted.
async fn moderate_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ModeratePostRequest>,
) -> AppResult<ApiResponse<Option<PostResponse>>> {
    let post = state
        .moderation_service
        .moderate(&user, &id, req.action)
        .await?;
    Ok(ApiResponse::ok(post.map(Into::into)))
}

async fn pending_posts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let posts = state.moderation_service.pending_posts(&user).await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

async fn flagged_posts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let posts = state.moderation_service.flagged_posts(&user).await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PlatformStats>> {
    let stats = state.moderation_service.stats(&user).await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/penalties", get(list_penalties).post(create_penalty))
        .route("/penalties/{id}", put(update_penalty).delete(delete_penalty))
        .route("/attendance", get(attendance_overview))
        .route("/posts/{id}/approve", post(approve_post))
        .route("/posts/{id}/moderate", post(moderate_post))
        .route("/pending-posts", get(pending_posts))
        .route("/flagged-posts", get(flagged_posts))
        .route("/stats", get(stats))
}
