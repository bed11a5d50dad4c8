//! 版本变更记录（只追加）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "VersionHistory")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ID")]
    pub id: i64,
    #[sea_orm(column_name = "Plugin")]
    pub plugin: i32,
    #[sea_orm(column_name = "Version")]
    pub version: String,
    #[sea_orm(column_name = "Created")]
    pub created: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
