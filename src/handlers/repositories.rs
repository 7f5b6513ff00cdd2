//! # Repositories API Handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
};

use crate::error::ApiError;
use crate::handlers::parse_sync_request;
use crate::handlers::types::{RepositoriesResponse, SyncRequest, SyncResponse};
use crate::models::RepositoryInfo;
use crate::server::AppState;

/// List every stored repository, most starred first
#[utoipa::path(
    get,
    path = "/api/v1/repositories",
    responses(
        (status = 200, description = "Stored repositories", body = RepositoriesResponse),
        (status = 500, description = "Storage error", body = ApiError)
    ),
    tag = "repositories"
)]
pub async fn list_repositories(
    State(state): State<AppState>,
) -> Result<Json<RepositoriesResponse>, ApiError> {
    let repositories = state.service.list_repositories().await?;
    Ok(Json(repositories.into()))
}

/// Fetch one stored repository by owner and name
#[utoipa::path(
    get,
    path = "/api/v1/repositories/{owner}/{name}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("name" = String, Path, description = "Repository name")
    ),
    responses(
        (status = 200, description = "Repository", body = RepositoryInfo),
        (status = 404, description = "Repository not stored", body = ApiError),
        (status = 500, description = "Storage error", body = ApiError)
    ),
    tag = "repositories"
)]
pub async fn get_repository(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<RepositoryInfo>, ApiError> {
    let repository = state
        .service
        .get_repository(&format!("{owner}/{name}"))
        .await?;
    Ok(Json(repository))
}

/// Sync repositories from GitHub
///
/// The body is optional; without `repository_urls` the configured default
/// list is synced.
#[utoipa::path(
    post,
    path = "/api/v1/repositories/sync",
    request_body(content = SyncRequest, description = "Optional; omit to use the configured list", content_type = "application/json"),
    responses(
        (status = 200, description = "Sync finished", body = SyncResponse, example = json!({
            "message": "Successfully synced 2 repositories",
            "synced_count": 2
        })),
        (status = 400, description = "No references given or configured", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn sync_repositories(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SyncResponse>, ApiError> {
    let SyncRequest {
        repository_urls, ..
    } = parse_sync_request(&body)?;
    let report = state.service.sync_repositories(repository_urls).await?;
    Ok(Json(SyncResponse::repositories(report)))
}
