//! Application and attendance endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{patch, post, put},
};
use hub_common::AppResult;
use hub_core::ApplyInput;
use hub_db::entities::application::{self, ApplicationStatus, AttendanceStatus};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{ApiJson, AuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Application response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: String,
    pub volunteer_id: String,
    pub post_id: String,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub attendance_status: AttendanceStatus,
    pub attendance_marked_at: Option<String>,
    pub created_at: String,
}

impl From<application::Model> for ApplicationResponse {
    fn from(app: application::Model) -> Self {
        Self {
            id: app.id,
            volunteer_id: app.volunteer_id,
            post_id: app.post_id,
            message: app.message,
            status: app.status,
            attendance_status: app.attendance_status,
            attendance_marked_at: app.attendance_marked_at.map(|t| t.to_rfc3339()),
            created_at: app.created_at.to_rfc3339(),
        }
    }
}

/// Apply request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub post_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Review request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    pub status: ApplicationStatus,
}

/// Attendance request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub attendance_status: AttendanceStatus,
}

/// Apply to a post.
async fn apply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> AppResult<ApiResponse<ApplicationResponse>> {
    let created = state
        .application_service
        .apply(
            &user,
            ApplyInput {
                post_id: req.post_id,
                message: req.message,
            },
        )
        .await?;

    Ok(ApiResponse::created(created.into()))
}

/// Approve or reject an application.
async fn update_application(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateApplicationRequest>,
) -> AppResult<ApiResponse<ApplicationResponse>> {
    let updated = state
        .application_service
        .update_status(&user, &id, req.status)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Withdraw an application.
async fn withdraw(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.application_service.withdraw(&user, &id).await?;
    Ok(no_content())
}

/// Mark attendance.
async fn mark_attendance(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<MarkAttendanceRequest>,
) -> AppResult<ApiResponse<ApplicationResponse>> {
    let updated = state
        .attendance_service
        .mark_attendance(&user, &id, req.attendance_status)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(apply))
        .route("/{id}", patch(update_application).delete(withdraw))
        .route("/{id}/attendance", put(mark_attendance))
}
