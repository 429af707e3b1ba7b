//! Volunteer directory.

use axum::{Router, extract::State, routing::get};
use hub_common::AppResult;
use hub_db::entities::user;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public profile of a volunteer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerResponse {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

impl From<user::Model> for VolunteerResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

async fn list_volunteers(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<VolunteerResponse>>> {
    let volunteers = state.user_service.list_volunteers().await?;
    Ok(ApiResponse::ok(
        volunteers.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_volunteers))
}
