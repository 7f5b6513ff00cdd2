//! Repository entity model
//!
//! SeaORM entity for the `repositories` table. `full_name` carries a unique
//! index and is the natural key for upserts.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Store-assigned identifier; ascending id doubles as insertion order
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// `owner/name`
    #[sea_orm(unique)]
    pub full_name: String,

    /// Empty when upstream has no description
    pub description: String,

    pub url: String,

    /// Empty when upstream reports no primary language
    pub language: String,

    pub stars: i64,

    pub forks: i64,

    /// Creation time reported by upstream
    pub created_at: DateTimeWithTimeZone,

    /// Last update time reported by upstream
    pub updated_at: DateTimeWithTimeZone,

    /// Refreshed on every write
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
