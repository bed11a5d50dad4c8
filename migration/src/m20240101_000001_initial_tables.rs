//! 初始表结构
//!
//! 表名与列名沿用旧统计库（PascalCase），已有数据可以直接接入：
//! - Plugin: 插件与全局点击数
//! - Server: 服务器实例（GUID 唯一）
//! - VersionHistory: 版本变更记录
//! - ServerTimeline / PlayerTimeline: 每小时汇总

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Plugin
        manager
            .create_table(
                Table::create()
                    .table(Plugin::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plugin::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plugin::Name).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Plugin::GlobalHits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_plugin_name")
                    .table(Plugin::Table)
                    .col(Plugin::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 2. Server
        manager
            .create_table(
                Table::create()
                    .table(Server::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Server::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Server::Plugin).integer().not_null())
                    .col(ColumnDef::new(Server::Guid).string_len(40).not_null())
                    .col(
                        ColumnDef::new(Server::Players)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Server::ServerVersion)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Server::CurrentVersion)
                            .string_len(40)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Server::Hits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Server::Created).big_integer().not_null())
                    .col(ColumnDef::new(Server::Updated).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // GUID 唯一约束：并发 fetch-or-create 依赖它来避免重复行
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_server_guid")
                    .table(Server::Table)
                    .col(Server::Guid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_server_plugin_updated")
                    .table(Server::Table)
                    .col(Server::Plugin)
                    .col(Server::Updated)
                    .to_owned(),
            )
            .await?;

        // 3. VersionHistory
        manager
            .create_table(
                Table::create()
                    .table(VersionHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VersionHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VersionHistory::Plugin).integer().not_null())
                    .col(
                        ColumnDef::new(VersionHistory::Version)
                            .string_len(40)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VersionHistory::Created)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_version_history_plugin_created")
                    .table(VersionHistory::Table)
                    .col(VersionHistory::Plugin)
                    .col(VersionHistory::Created)
                    .to_owned(),
            )
            .await?;

        // 4. ServerTimeline
        manager
            .create_table(
                Table::create()
                    .table(ServerTimeline::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServerTimeline::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServerTimeline::Plugin).integer().not_null())
                    .col(
                        ColumnDef::new(ServerTimeline::Epoch)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServerTimeline::Servers)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_server_timeline_plugin_epoch")
                    .table(ServerTimeline::Table)
                    .col(ServerTimeline::Plugin)
                    .col(ServerTimeline::Epoch)
                    .to_owned(),
            )
            .await?;

        // 5. PlayerTimeline
        manager
            .create_table(
                Table::create()
                    .table(PlayerTimeline::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlayerTimeline::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlayerTimeline::Plugin).integer().not_null())
                    .col(
                        ColumnDef::new(PlayerTimeline::Epoch)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlayerTimeline::Players)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_player_timeline_plugin_epoch")
                    .table(PlayerTimeline::Table)
                    .col(PlayerTimeline::Plugin)
                    .col(PlayerTimeline::Epoch)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlayerTimeline::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServerTimeline::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VersionHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Server::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plugin::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Plugin {
    #[sea_orm(iden = "Plugin")]
    Table,
    #[sea_orm(iden = "ID")]
    Id,
    #[sea_orm(iden = "Name")]
    Name,
    #[sea_orm(iden = "GlobalHits")]
    GlobalHits,
}

#[derive(DeriveIden)]
enum Server {
    #[sea_orm(iden = "Server")]
    Table,
    #[sea_orm(iden = "ID")]
    Id,
    #[sea_orm(iden = "Plugin")]
    Plugin,
    #[sea_orm(iden = "GUID")]
    Guid,
    #[sea_orm(iden = "Players")]
    Players,
    #[sea_orm(iden = "ServerVersion")]
    ServerVersion,
    #[sea_orm(iden = "CurrentVersion")]
    CurrentVersion,
    #[sea_orm(iden = "Hits")]
    Hits,
    #[sea_orm(iden = "Created")]
    Created,
    #[sea_orm(iden = "Updated")]
    Updated,
}

#[derive(DeriveIden)]
enum VersionHistory {
    #[sea_orm(iden = "VersionHistory")]
    Table,
    #[sea_orm(iden = "ID")]
    Id,
    #[sea_orm(iden = "Plugin")]
    Plugin,
    #[sea_orm(iden = "Version")]
    Version,
    #[sea_orm(iden = "Created")]
    Created,
}

#[derive(DeriveIden)]
enum ServerTimeline {
    #[sea_orm(iden = "ServerTimeline")]
    Table,
    #[sea_orm(iden = "ID")]
    Id,
    #[sea_orm(iden = "Plugin")]
    Plugin,
    #[sea_orm(iden = "Epoch")]
    Epoch,
    #[sea_orm(iden = "Servers")]
    Servers,
}

#[derive(DeriveIden)]
enum PlayerTimeline {
    #[sea_orm(iden = "PlayerTimeline")]
    Table,
    #[sea_orm(iden = "ID")]
    Id,
    #[sea_orm(iden = "Plugin")]
    Plugin,
    #[sea_orm(iden = "Epoch")]
    Epoch,
    #[sea_orm(iden = "Players")]
    Players,
}
