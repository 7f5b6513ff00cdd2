//! Database migrations for reposync.
//!
//! Creates the `repositories` and `commits` tables using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_11_20_090000_create_repositories;
mod m2025_11_20_090100_create_commits;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_11_20_090000_create_repositories::Migration),
            Box::new(m2025_11_20_090100_create_commits::Migration),
        ]
    }
}
