//! Certificate endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use hub_common::AppResult;
use hub_core::{BulkIssueInput, BulkIssueResult, IssueCertificateInput};
use hub_db::entities::certificate;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{ApiJson, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Certificate response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub id: String,
    pub volunteer_id: String,
    pub post_id: String,
    pub organization_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub certificate_url: Option<String>,
    pub issued_date: String,
    pub verified: bool,
}

impl From<certificate::Model> for CertificateResponse {
    fn from(c: certificate::Model) -> Self {
        Self {
            id: c.id,
            volunteer_id: c.volunteer_id,
            post_id: c.post_id,
            organization_id: c.organization_id,
            title: c.title,
            description: c.description,
            certificate_url: c.certificate_url,
            issued_date: c.issued_date.to_rfc3339(),
            verified: c.verified,
        }
    }
}

/// Issue certificate request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificateRequest {
    pub volunteer_id: String,
    pub post_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

/// Bulk issue request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIssueRequest {
    pub post_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

async fn list_certificates(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CertificateResponse>>> {
    let certificates = state.certificate_service.list_certificates(&user).await?;
    Ok(ApiResponse::ok(
        certificates.into_iter().map(Into::into).collect(),
    ))
}

async fn issue_certificate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<IssueCertificateRequest>,
) -> AppResult<ApiResponse<CertificateResponse>> {
    let certificate = state
        .certificate_service
        .issue(
            &user,
            IssueCertificateInput {
                volunteer_id: req.volunteer_id,
                post_id: req.post_id,
                title: req.title,
                description: req.description,
                certificate_url: req.certificate_url,
            },
        )
        .await?;

    Ok(ApiResponse::created(certificate.into()))
}

async fn bulk_issue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BulkIssueRequest>,
) -> AppResult<ApiResponse<BulkIssueResult>> {
    let result = state
        .certificate_service
        .bulk_issue(
            &user,
            BulkIssueInput {
                post_id: req.post_id,
                title: req.title,
                description: req.description,
                certificate_url: req.certificate_url,
            },
        )
        .await?;

    Ok(ApiResponse::ok(result))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_certificates).post(issue_certificate))
        .route("/bulk", post(bulk_issue))
}
