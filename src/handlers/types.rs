//! # Common API Types
//!
//! Request and response bodies shared by the REST handlers and the RPC
//! protocol, so both front-ends serialize the same shapes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CommitInfo, RepositoryInfo, SERVICE_NAME};
use crate::service::CommitPage;
use crate::sync_engine::{SyncFailure, SyncReport};

/// All stored repositories, most starred first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RepositoriesResponse {
    pub repositories: Vec<RepositoryInfo>,
    pub total: usize,
}

impl From<Vec<RepositoryInfo>> for RepositoriesResponse {
    fn from(repositories: Vec<RepositoryInfo>) -> Self {
        Self {
            total: repositories.len(),
            repositories,
        }
    }
}

/// One page of a repository's commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommitsResponse {
    /// `owner/name` the commits belong to
    pub repository: String,
    pub commits: Vec<CommitInfo>,
    /// Stored commits for the repository, ignoring paging
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

impl CommitsResponse {
    pub fn new(repository: impl Into<String>, page: CommitPage) -> Self {
        Self {
            repository: repository.into(),
            commits: page.commits,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Body accepted by the sync endpoints; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SyncRequest {
    /// References to sync; empty means the configured default list
    #[serde(default)]
    pub repository_urls: Vec<String>,
    /// Commits per repository (commit sync only, default 50)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Item skipped during a sync batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkippedItem {
    pub item: String,
    pub code: String,
    pub message: String,
}

impl From<SyncFailure> for SkippedItem {
    fn from(failure: SyncFailure) -> Self {
        Self {
            item: failure.item,
            code: failure.kind.error_code().to_string(),
            message: failure.message,
        }
    }
}

/// Outcome of a sync call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SyncResponse {
    pub message: String,
    /// Repositories synced for repository sync and for commit sync across
    /// repositories; commits written for single-repository commit sync
    pub synced_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedItem>,
}

impl SyncResponse {
    fn from_report(message: String, report: SyncReport) -> Self {
        Self {
            message,
            synced_count: report.count(),
            skipped: report.failures.into_iter().map(SkippedItem::from).collect(),
        }
    }

    pub fn repositories(report: SyncReport) -> Self {
        let message = format!("Successfully synced {} repositories", report.count());
        Self::from_report(message, report)
    }

    pub fn commits(full_name: &str, report: SyncReport) -> Self {
        let message = format!(
            "Successfully synced {} commits for repository: {}",
            report.count(),
            full_name
        );
        Self::from_report(message, report)
    }

    pub fn commits_all(report: SyncReport) -> Self {
        let message = format!(
            "Successfully synced commits for {} repositories",
            report.count()
        );
        Self::from_report(message, report)
    }
}

/// Static liveness payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }
}
