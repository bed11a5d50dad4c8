//! 每小时在线玩家数

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "PlayerTimeline")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ID")]
    pub id: i64,
    #[sea_orm(column_name = "Plugin")]
    pub plugin: i32,
    /// 已对齐到整点的 Unix 时间戳
    #[sea_orm(column_name = "Epoch")]
    pub epoch: i64,
    #[sea_orm(column_name = "Players")]
    pub players: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
