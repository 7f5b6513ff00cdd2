//! Source trait definition
//!
//! The sync engine depends on this seam rather than on the HTTP client, so
//! the engine can be driven by any upstream that yields the two record shapes.

use async_trait::async_trait;

use crate::connectors::github::GitHubError;
use crate::models::{CommitRecord, RepositoryRecord};

/// Upstream provider of repository and commit metadata.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Resolves a reference URL to the repository it names.
    async fn fetch_repository(&self, reference: &str) -> Result<RepositoryRecord, GitHubError>;

    /// Fetches up to `limit` of the newest commits of `full_name`.
    ///
    /// A non-positive `limit` requests the default page size.
    async fn fetch_commits(
        &self,
        full_name: &str,
        limit: i64,
    ) -> Result<Vec<CommitRecord>, GitHubError>;
}
