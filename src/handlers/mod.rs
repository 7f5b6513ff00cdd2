//! # API Handlers
//!
//! HTTP endpoint handlers for the REST front-end. Each handler is a direct
//! call into the shared [`RepositoryService`](crate::service::RepositoryService).

use axum::response::Json;

use crate::error::ApiError;
use crate::handlers::types::{HealthResponse, SyncRequest};
use crate::models::ServiceInfo;

pub mod commits;
pub mod repositories;
pub mod types;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "root"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// An empty body means "use defaults"; anything else must be valid JSON.
pub(crate) fn parse_sync_request(body: &[u8]) -> Result<SyncRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SyncRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::invalid_request(format!("Invalid JSON body: {err}")))
}
