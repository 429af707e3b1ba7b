//! API endpoints.

#![allow(missing_docs)]

mod admin;
mod applications;
mod certificates;
mod penalties;
mod posts;
mod volunteers;

use axum::{Json, Router};
use serde_json::{Value, json};

use crate::middleware::AppState;

pub use applications::ApplicationResponse;
pub use certificates::CertificateResponse;
pub use penalties::{MyPenaltiesResponse, PenaltyResponse};
pub use posts::PostResponse;
pub use volunteers::VolunteerResponse;

/// Create the API router, mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/applications", applications::router())
        .nest("/posts", posts::router())
        .nest("/admin", admin::router())
        .nest("/penalties", penalties::router())
        .nest("/certificates", certificates::router())
        .nest("/volunteers", volunteers::router())
}

/// Liveness check.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
