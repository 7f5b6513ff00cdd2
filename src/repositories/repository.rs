//! Repository table access
//!
//! Provides [`RepoRepository`], which upserts repositories by `full_name` and
//! serves the list and point lookups used by both front-ends.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::StoreError;
use crate::models::RepositoryRecord;
use crate::models::repository::{self, Entity as Repository};

/// Repository for `repositories` table operations
#[derive(Debug, Clone)]
pub struct RepoRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl RepoRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts the repository or overwrites the row sharing its `full_name`.
    ///
    /// Every column is replaced and `synced_at` is stamped with the current
    /// time. The row keeps its original `id`.
    ///
    /// # Returns
    ///
    /// The row as stored, read back by the same statement via `RETURNING`.
    pub async fn upsert(&self, record: &RepositoryRecord) -> Result<repository::Model, StoreError> {
        let active = repository::ActiveModel {
            name: Set(record.name.clone()),
            full_name: Set(record.full_name.clone()),
            description: Set(record.description.clone()),
            url: Set(record.url.clone()),
            language: Set(record.language.clone()),
            stars: Set(record.stars),
            forks: Set(record.forks),
            created_at: Set(record.created_at.fixed_offset()),
            updated_at: Set(record.updated_at.fixed_offset()),
            synced_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        let stored = Repository::insert(active)
            .on_conflict(upsert_on_conflict())
            .exec_with_returning(&*self.db)
            .await?;
        Ok(stored)
    }

    /// All repositories, most starred first; equal star counts keep insertion order.
    pub async fn list(&self) -> Result<Vec<repository::Model>, StoreError> {
        let rows = Repository::find()
            .order_by_desc(repository::Column::Stars)
            .order_by_asc(repository::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// Exact lookup by `owner/name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no row has this full name.
    pub async fn get(&self, full_name: &str) -> Result<repository::Model, StoreError> {
        Repository::find()
            .filter(repository::Column::FullName.eq(full_name))
            .one(&*self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                full_name: full_name.to_string(),
            })
    }
}

fn upsert_on_conflict() -> OnConflict {
    OnConflict::column(repository::Column::FullName)
        .update_columns([
            repository::Column::Name,
            repository::Column::Description,
            repository::Column::Url,
            repository::Column::Language,
            repository::Column::Stars,
            repository::Column::Forks,
            repository::Column::CreatedAt,
            repository::Column::UpdatedAt,
            repository::Column::SyncedAt,
        ])
        .to_owned()
}
