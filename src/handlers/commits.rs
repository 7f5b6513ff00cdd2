//! # Commits API Handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::ApiError;
use crate::handlers::parse_sync_request;
use crate::handlers::types::{CommitsResponse, SyncRequest, SyncResponse};
use crate::server::AppState;
use crate::service::DEFAULT_PAGE_SIZE;

/// Paging for commit listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListCommitsQuery {
    /// Page size (default: 50)
    pub limit: Option<i64>,
    /// Rows to skip (default: 0)
    pub offset: Option<i64>,
}

/// Commit count for single-repository sync
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SyncCommitsQuery {
    /// Commits to fetch (default: 50)
    pub limit: Option<i64>,
}

/// List stored commits for a repository, newest first
#[utoipa::path(
    get,
    path = "/api/v1/commits/{owner}/{name}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("name" = String, Path, description = "Repository name"),
        ListCommitsQuery
    ),
    responses(
        (status = 200, description = "Commit page with total count", body = CommitsResponse),
        (status = 500, description = "Storage error", body = ApiError)
    ),
    tag = "commits"
)]
pub async fn list_commits(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<ListCommitsQuery>,
) -> Result<Json<CommitsResponse>, ApiError> {
    let full_name = format!("{owner}/{name}");
    let page = state
        .service
        .list_commits(
            &full_name,
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(CommitsResponse::new(full_name, page)))
}

/// Sync recent commits for one repository
#[utoipa::path(
    post,
    path = "/api/v1/commits/sync/{owner}/{name}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("name" = String, Path, description = "Repository name"),
        SyncCommitsQuery
    ),
    responses(
        (status = 200, description = "Commits written", body = SyncResponse),
        (status = 502, description = "GitHub request failed", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn sync_commits(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<SyncCommitsQuery>,
) -> Result<Json<SyncResponse>, ApiError> {
    let full_name = format!("{owner}/{name}");
    let report = state
        .service
        .sync_commits(&full_name, query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .await?;
    Ok(Json(SyncResponse::commits(&full_name, report)))
}

/// Sync recent commits for every referenced repository
///
/// `synced_count` is the number of repositories processed.
#[utoipa::path(
    post,
    path = "/api/v1/commits/sync",
    request_body(content = SyncRequest, description = "Optional; omit to use the configured list", content_type = "application/json"),
    responses(
        (status = 200, description = "Repositories processed", body = SyncResponse),
        (status = 400, description = "No references given or configured", body = ApiError)
    ),
    tag = "sync"
)]
pub async fn sync_all_commits(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SyncResponse>, ApiError> {
    let request = parse_sync_request(&body)?;
    let report = state
        .service
        .sync_commits_all(
            request.repository_urls,
            request.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(SyncResponse::commits_all(report)))
}
