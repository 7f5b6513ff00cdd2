//! Migration to create the commits table.
//!
//! Commits reference their repository by full name only; there is no foreign
//! key, so commits may be written before (or without) the repository row.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Commits::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Commits::Sha).text().not_null())
                    .col(ColumnDef::new(Commits::Message).text().not_null())
                    .col(ColumnDef::new(Commits::AuthorName).text().not_null())
                    .col(ColumnDef::new(Commits::AuthorEmail).text().not_null())
                    .col(
                        ColumnDef::new(Commits::CommitDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Commits::RepositoryFullName)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Commits::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite natural key for upserts
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_sha_repository")
                    .table(Commits::Table)
                    .col(Commits::Sha)
                    .col(Commits::RepositoryFullName)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Range scans by repository ordered by date
        manager
            .create_index(
                Index::create()
                    .name("idx_commits_repository_date")
                    .table(Commits::Table)
                    .col(Commits::RepositoryFullName)
                    .col(Commits::CommitDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_commits_repository_date")
                    .table(Commits::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_commits_sha_repository")
                    .table(Commits::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Commits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Commits {
    Table,
    Id,
    Sha,
    Message,
    AuthorName,
    AuthorEmail,
    CommitDate,
    RepositoryFullName,
    SyncedAt,
}
