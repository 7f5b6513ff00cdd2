//! Commit entity model
//!
//! SeaORM entity for the `commits` table. Rows reference their repository by
//! full name only.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub sha: String,

    pub message: String,

    pub author_name: String,

    pub author_email: String,

    pub commit_date: DateTimeWithTimeZone,

    /// Unique together with `sha`
    pub repository_full_name: String,

    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
