//! Penalty endpoints for the signed-in user.

use axum::{Router, extract::State, routing::get};
use hub_common::AppResult;
use hub_db::entities::penalty::{self, PenaltyStatus, PenaltyType};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Penalty response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyResponse {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub penalty_type: PenaltyType,
    pub status: PenaltyStatus,
    pub reason: String,
    pub description: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub resolved_at: Option<String>,
    pub issued_by: Option<String>,
}

impl From<penalty::Model> for PenaltyResponse {
    fn from(p: penalty::Model) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            penalty_type: p.penalty_type,
            status: p.status,
            reason: p.reason,
            description: p.description,
            expires_at: p.expires_at.map(|t| t.to_rfc3339()),
            created_at: p.created_at.to_rfc3339(),
            resolved_at: p.resolved_at.map(|t| t.to_rfc3339()),
            issued_by: p.issued_by,
        }
    }
}

/// The caller's penalties.
#[derive(Serialize)]
pub struct MyPenaltiesResponse {
    pub active: Vec<PenaltyResponse>,
    pub all: Vec<PenaltyResponse>,
}

async fn my_penalties(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MyPenaltiesResponse>> {
    let mine = state.penalty_service.my_penalties(&user).await?;
    Ok(ApiResponse::ok(MyPenaltiesResponse {
        active: mine.active.into_iter().map(Into::into).collect(),
        all: mine.all.into_iter().map(Into::into).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/my", get(my_penalties))
}
