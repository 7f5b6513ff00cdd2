//! Sync engine
//!
//! Pulls repositories and commits from a [`RepositorySource`] and writes them
//! through the store. Batches are skip-and-continue: every item produces an
//! outcome, failures are logged and kept in the [`SyncReport`], and only
//! conditions that stop the batch from starting are returned as errors.

use std::sync::Arc;

use metrics::counter;
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

use crate::config::GitHubConfig;
use crate::connectors::{RepositorySource, parse_reference};
use crate::error::{ErrorKind, ServiceError};
use crate::repositories::{CommitRepository, RepoRepository};

/// One item that could not be synced.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    /// Reference, full name or SHA identifying the item
    pub item: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl SyncFailure {
    fn new(item: impl Into<String>, error: &ServiceError) -> Self {
        Self {
            item: item.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Per-item result of a batch step.
pub type ItemOutcome = Result<String, SyncFailure>;

/// Aggregate of a batch: the items that completed and the ones skipped.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub synced: Vec<String>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Number of items that completed every step.
    pub fn count(&self) -> usize {
        self.synced.len()
    }
}

impl FromIterator<ItemOutcome> for SyncReport {
    fn from_iter<I: IntoIterator<Item = ItemOutcome>>(outcomes: I) -> Self {
        let mut report = SyncReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(item) => report.synced.push(item),
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }
}

/// Orchestrates fetches and writes for the three sync operations.
#[derive(Clone)]
pub struct SyncEngine {
    source: Arc<dyn RepositorySource>,
    repositories: RepoRepository,
    commits: CommitRepository,
    default_references: Vec<String>,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn RepositorySource>,
        db: Arc<DatabaseConnection>,
        github: &GitHubConfig,
    ) -> Self {
        Self {
            source,
            repositories: RepoRepository::new(db.clone()),
            commits: CommitRepository::new(db),
            default_references: github.repositories.clone(),
        }
    }

    /// Falls back to the configured list when `references` is empty.
    pub fn resolve_references(&self, references: Vec<String>) -> Result<Vec<String>, ServiceError> {
        let resolved = if references.is_empty() {
            self.default_references.clone()
        } else {
            references
        };

        if resolved.is_empty() {
            return Err(ServiceError::NoTargets);
        }
        Ok(resolved)
    }

    /// Fetches and upserts each referenced repository in order.
    ///
    /// The report's count is the number of references that were both fetched
    /// and written.
    #[instrument(skip_all, fields(requested = references.len()))]
    pub async fn sync_repositories(
        &self,
        references: Vec<String>,
    ) -> Result<SyncReport, ServiceError> {
        let references = self.resolve_references(references)?;

        let mut outcomes = Vec::with_capacity(references.len());
        for reference in references {
            let result = self.sync_repository(&reference).await;
            let outcome = match result {
                Ok(full_name) => {
                    counter!("reposync_repositories_synced_total").increment(1);
                    info!(%reference, %full_name, "repository synced");
                    Ok(full_name)
                }
                Err(error) => {
                    counter!("reposync_repository_sync_failures_total").increment(1);
                    warn!(%reference, %error, "skipping repository");
                    Err(SyncFailure::new(reference, &error))
                }
            };
            outcomes.push(outcome);
        }

        let report: SyncReport = outcomes.into_iter().collect();
        info!(
            synced = report.count(),
            failed = report.failures.len(),
            "repository sync finished"
        );
        Ok(report)
    }

    async fn sync_repository(&self, reference: &str) -> Result<String, ServiceError> {
        let record = self.source.fetch_repository(reference).await?;
        let stored = self.repositories.upsert(&record).await?;
        Ok(stored.full_name)
    }

    /// Fetches up to `limit` commits of one repository and upserts each.
    ///
    /// A failed fetch is returned as an error; individual write failures are
    /// skipped. The report's count is the number of commits written.
    #[instrument(skip(self))]
    pub async fn sync_commits(
        &self,
        full_name: &str,
        limit: i64,
    ) -> Result<SyncReport, ServiceError> {
        let fetched = self.source.fetch_commits(full_name, limit).await?;

        let mut outcomes = Vec::with_capacity(fetched.len());
        for commit in fetched {
            let result = self.commits.upsert(&commit).await;
            let outcome = match result {
                Ok(()) => {
                    counter!("reposync_commits_synced_total").increment(1);
                    Ok(commit.sha)
                }
                Err(error) => {
                    let error = ServiceError::from(error);
                    counter!("reposync_commit_sync_failures_total").increment(1);
                    warn!(sha = %commit.sha, %error, "skipping commit");
                    Err(SyncFailure::new(commit.sha, &error))
                }
            };
            outcomes.push(outcome);
        }

        let report: SyncReport = outcomes.into_iter().collect();
        info!(synced = report.count(), "commit sync finished");
        Ok(report)
    }

    /// Runs [`sync_commits`](Self::sync_commits) for every referenced
    /// repository.
    ///
    /// The report counts repositories whose commit sync ran, not commits.
    /// Malformed references and failed fetches are skipped.
    #[instrument(skip_all, fields(requested = references.len(), limit = limit))]
    pub async fn sync_commits_all(
        &self,
        references: Vec<String>,
        limit: i64,
    ) -> Result<SyncReport, ServiceError> {
        let references = self.resolve_references(references)?;

        let mut outcomes = Vec::with_capacity(references.len());
        let mut commits_written = 0;
        for reference in references {
            let result = match parse_reference(&reference) {
                Ok(repo_ref) => {
                    let full_name = repo_ref.full_name();
                    self.sync_commits(&full_name, limit)
                        .await
                        .map(|report| (full_name, report))
                }
                Err(error) => Err(error.into()),
            };

            let outcome = match result {
                Ok((full_name, report)) => {
                    commits_written += report.count();
                    Ok(full_name)
                }
                Err(error) => {
                    warn!(%reference, %error, "skipping commits for repository");
                    Err(SyncFailure::new(reference, &error))
                }
            };
            outcomes.push(outcome);
        }

        let report: SyncReport = outcomes.into_iter().collect();
        info!(
            repositories = report.count(),
            commits = commits_written,
            "commit sync for all repositories finished"
        );
        Ok(report)
    }
}
