//! Fixtures shared by unit tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use crate::config::AppConfig;
use crate::db::init_pool;
use crate::models::{CommitRecord, RepositoryRecord};

/// Migrated SQLite database in a temp directory; keep the `TempDir` alive.
pub async fn test_db() -> (TempDir, Arc<DatabaseConnection>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut config = AppConfig::default();
    config.database_path = dir.path().join("reposync.db");
    let db = init_pool(&config).await.expect("open test database");
    (dir, Arc::new(db))
}

pub fn repository_record(full_name: &str, stars: i64) -> RepositoryRecord {
    let name = full_name.rsplit('/').next().unwrap_or(full_name);
    RepositoryRecord {
        name: name.to_string(),
        full_name: full_name.to_string(),
        description: format!("{name} description"),
        url: format!("https://github.com/{full_name}"),
        language: "Rust".to_string(),
        stars,
        forks: stars / 2,
        created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

/// Commit dated `day` days into January 2024.
pub fn commit_record(sha: &str, full_name: &str, day: u32) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        message: format!("commit {sha}"),
        author_name: "Octo Cat".to_string(),
        author_email: "octo@example.com".to_string(),
        commit_date: Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap(),
        repository_full_name: full_name.to_string(),
    }
}
