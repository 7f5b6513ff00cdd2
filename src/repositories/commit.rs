//! Commit table access

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::StoreError;
use crate::models::CommitRecord;
use crate::models::commit::{self, Entity as Commit};

/// Repository for `commits` table operations
#[derive(Debug, Clone)]
pub struct CommitRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl CommitRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts the commit or overwrites the row with the same
    /// `(sha, repository_full_name)`, refreshing `synced_at`.
    pub async fn upsert(&self, record: &CommitRecord) -> Result<(), StoreError> {
        let active = commit::ActiveModel {
            sha: Set(record.sha.clone()),
            message: Set(record.message.clone()),
            author_name: Set(record.author_name.clone()),
            author_email: Set(record.author_email.clone()),
            commit_date: Set(record.commit_date.fixed_offset()),
            repository_full_name: Set(record.repository_full_name.clone()),
            synced_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        Commit::insert(active)
            .on_conflict(
                OnConflict::columns([commit::Column::Sha, commit::Column::RepositoryFullName])
                    .update_columns([
                        commit::Column::Message,
                        commit::Column::AuthorName,
                        commit::Column::AuthorEmail,
                        commit::Column::CommitDate,
                        commit::Column::SyncedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }

    /// One page of a repository's commits, newest first.
    pub async fn list(
        &self,
        full_name: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<commit::Model>, StoreError> {
        let rows = Commit::find()
            .filter(commit::Column::RepositoryFullName.eq(full_name))
            .order_by_desc(commit::Column::CommitDate)
            .order_by_asc(commit::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// Total stored commits for a repository, independent of paging.
    pub async fn count(&self, full_name: &str) -> Result<u64, StoreError> {
        let total = Commit::find()
            .filter(commit::Column::RepositoryFullName.eq(full_name))
            .count(&*self.db)
            .await?;
        Ok(total)
    }
}
