//! 上报数据的服务器实例，以 GUID 唯一标识

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "Server")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ID")]
    pub id: i32,
    #[sea_orm(column_name = "Plugin")]
    pub plugin: i32,
    #[sea_orm(column_name = "GUID", unique)]
    pub guid: String,
    #[sea_orm(column_name = "Players")]
    pub players: i32,
    #[sea_orm(column_name = "ServerVersion")]
    pub server_version: String,
    #[sea_orm(column_name = "CurrentVersion")]
    pub current_version: String,
    #[sea_orm(column_name = "Hits")]
    pub hits: i64,
    /// Unix 时间戳（秒）
    #[sea_orm(column_name = "Created")]
    pub created: i64,
    /// Unix 时间戳（秒）
    #[sea_orm(column_name = "Updated")]
    pub updated: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
