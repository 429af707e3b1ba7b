//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use hub_core::{
    ApplicationService, AttendanceService, CertificateService, ModerationService, PenaltyService,
    PostService, UserService,
};
use hub_db::repositories::DynUserStore;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_store: DynUserStore,
    pub application_service: ApplicationService,
    pub attendance_service: AttendanceService,
    pub penalty_service: PenaltyService,
    pub certificate_service: CertificateService,
    pub post_service: PostService,
    pub moderation_service: ModerationService,
    pub user_service: UserService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Unknown tokens pass through unauthenticated.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_store.find_by_token(token.trim()).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown bearer token"),
            Err(e) => tracing::warn!(error = %e, "Token lookup failed"),
        }
    }

    next.run(req).await
}
