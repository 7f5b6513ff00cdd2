//! # Data Models
//!
//! SeaORM entities for the two stored tables, the records produced by the
//! GitHub client, and the views both front-ends serialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod commit;
pub mod repository;

pub use commit::Entity as Commit;
pub use repository::Entity as Repository;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Name reported by the root and health endpoints.
pub const SERVICE_NAME: &str = "reposync";

/// A repository as fetched from upstream, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub stars: i64,
    pub forks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A commit as fetched from upstream, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub commit_date: DateTime<Utc>,
    pub repository_full_name: String,
}

/// Stored repository as returned by both front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RepositoryInfo {
    pub id: i32,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub stars: i64,
    pub forks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
}

impl From<repository::Model> for RepositoryInfo {
    fn from(model: repository::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            full_name: model.full_name,
            description: model.description,
            url: model.url,
            language: model.language,
            stars: model.stars,
            forks: model.forks,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            synced_at: model.synced_at.with_timezone(&Utc),
        }
    }
}

/// Stored commit as returned by both front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommitInfo {
    pub id: i32,
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub commit_date: DateTime<Utc>,
    pub repository_full_name: String,
    pub synced_at: DateTime<Utc>,
}

impl From<commit::Model> for CommitInfo {
    fn from(model: commit::Model) -> Self {
        Self {
            id: model.id,
            sha: model.sha,
            message: model.message,
            author_name: model.author_name,
            author_email: model.author_email,
            commit_date: model.commit_date.with_timezone(&Utc),
            repository_full_name: model.repository_full_name,
            synced_at: model.synced_at.with_timezone(&Utc),
        }
    }
}
