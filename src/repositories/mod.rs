//! # Repository Layer
//!
//! Data access for the two stored tables. Writes are upserts keyed by each
//! table's natural key; reads are plain point and range queries.

use sea_orm::DbErr;
use thiserror::Error;

pub mod commit;
pub mod repository;

pub use commit::CommitRepository;
pub use repository::RepoRepository;

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("repository not found: {full_name}")]
    NotFound { full_name: String },
}
