//! Service abstraction shared by the REST and RPC front-ends.
//!
//! Both adapters hold an `Arc<dyn RepositoryService>` and translate their
//! transport's requests into these calls, so neither carries sync logic.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::connectors::{DEFAULT_COMMIT_LIMIT, GitHubClient, GitHubError, effective_commit_limit};
use crate::error::ServiceError;
use crate::models::{CommitInfo, RepositoryInfo};
use crate::repositories::{CommitRepository, RepoRepository};
use crate::sync_engine::{SyncEngine, SyncReport};
use crate::telemetry::{TraceContext, current_trace_id, with_trace_context};

/// A page of stored commits plus the unpaged total.
#[derive(Debug, Clone)]
pub struct CommitPage {
    pub commits: Vec<CommitInfo>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Operations exposed identically by every front-end.
#[async_trait]
pub trait RepositoryService: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>, ServiceError>;

    async fn get_repository(&self, full_name: &str) -> Result<RepositoryInfo, ServiceError>;

    /// Non-positive `limit` uses the default page size; negative `offset` is 0.
    async fn list_commits(
        &self,
        full_name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<CommitPage, ServiceError>;

    async fn sync_repositories(&self, references: Vec<String>)
    -> Result<SyncReport, ServiceError>;

    async fn sync_commits(&self, full_name: &str, limit: i64) -> Result<SyncReport, ServiceError>;

    async fn sync_commits_all(
        &self,
        references: Vec<String>,
        limit: i64,
    ) -> Result<SyncReport, ServiceError>;
}

/// [`RepositoryService`] backed by the SQLite store and a [`SyncEngine`].
#[derive(Clone)]
pub struct CatalogService {
    engine: SyncEngine,
    repositories: RepoRepository,
    commits: CommitRepository,
}

impl CatalogService {
    pub fn new(engine: SyncEngine, db: Arc<DatabaseConnection>) -> Self {
        Self {
            engine,
            repositories: RepoRepository::new(db.clone()),
            commits: CommitRepository::new(db),
        }
    }

    /// Wires the GitHub client and engine from configuration.
    pub fn from_config(
        config: &AppConfig,
        db: Arc<DatabaseConnection>,
    ) -> Result<Self, GitHubError> {
        let client = Arc::new(GitHubClient::new(&config.github)?);
        let engine = SyncEngine::new(client, db.clone(), &config.github);
        Ok(Self::new(engine, db))
    }
}

#[async_trait]
impl RepositoryService for CatalogService {
    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>, ServiceError> {
        let rows = self.repositories.list().await?;
        Ok(rows.into_iter().map(RepositoryInfo::from).collect())
    }

    async fn get_repository(&self, full_name: &str) -> Result<RepositoryInfo, ServiceError> {
        Ok(self.repositories.get(full_name).await?.into())
    }

    async fn list_commits(
        &self,
        full_name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<CommitPage, ServiceError> {
        let limit = effective_commit_limit(limit).unsigned_abs();
        let offset = offset.max(0).unsigned_abs();

        let rows = self.commits.list(full_name, limit, offset).await?;
        let total = self.commits.count(full_name).await?;

        Ok(CommitPage {
            commits: rows.into_iter().map(CommitInfo::from).collect(),
            total,
            limit,
            offset,
        })
    }

    async fn sync_repositories(
        &self,
        references: Vec<String>,
    ) -> Result<SyncReport, ServiceError> {
        let engine = self.engine.clone();
        detached(async move { engine.sync_repositories(references).await }).await
    }

    async fn sync_commits(&self, full_name: &str, limit: i64) -> Result<SyncReport, ServiceError> {
        let engine = self.engine.clone();
        let full_name = full_name.to_string();
        detached(async move { engine.sync_commits(&full_name, limit).await }).await
    }

    async fn sync_commits_all(
        &self,
        references: Vec<String>,
        limit: i64,
    ) -> Result<SyncReport, ServiceError> {
        let engine = self.engine.clone();
        detached(async move { engine.sync_commits_all(references, limit).await }).await
    }
}

/// Runs sync work on its own task so it completes even if the caller's
/// future is dropped, e.g. when an HTTP client disconnects.
async fn detached<F, T>(work: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>> + Send + 'static,
    T: Send + 'static,
{
    let context = TraceContext::from_header(current_trace_id().as_deref());
    let task = with_trace_context(context, work).in_current_span();
    tokio::spawn(task).await?
}

/// Page size front-ends fall back to when the caller gives none.
pub const DEFAULT_PAGE_SIZE: i64 = DEFAULT_COMMIT_LIMIT;
