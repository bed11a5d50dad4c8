//! Plugin-scoped queries
//!
//! A [`PluginAccessor`] is one `Plugin` row plus the connection it was loaded
//! from. Every query takes the plugin id as its scoping filter, except
//! [`PluginAccessor::count_version_changes`], which has always counted
//! version changes across all plugins.

use std::collections::BTreeMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    ExprTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, SqlErr,
};
use tracing::{debug, error, trace};

use super::converters::{model_to_server, new_server_active_model, plugin_to_active_model};
use super::retry::{self, RetryConfig};
use crate::errors::{PluginMetricsError, Result};
use crate::storage::{Plugin, Server};
use crate::utils::unix_now;

use migration::entities::{player_timeline, server, server_timeline, version_history};

/// Read/aggregate access scoped to one plugin
#[derive(Clone)]
pub struct PluginAccessor {
    db: DatabaseConnection,
    retry_config: RetryConfig,
    plugin: Plugin,
}

impl std::fmt::Debug for PluginAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginAccessor")
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

impl PluginAccessor {
    pub fn new(db: DatabaseConnection, retry_config: RetryConfig, plugin: Plugin) -> Self {
        Self {
            db,
            retry_config,
            plugin,
        }
    }

    pub fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    pub fn id(&self) -> i32 {
        self.plugin.id
    }

    pub fn name(&self) -> &str {
        &self.plugin.name
    }

    pub fn global_hits(&self) -> i64 {
        self.plugin.global_hits
    }

    /// Change the in-memory name; persisted by the next [`Self::save`]
    pub fn rename<T: Into<String>>(&mut self, name: T) {
        self.plugin.name = name.into();
    }

    /// Distinct versions, most recently seen first
    pub async fn versions(&self) -> Result<Vec<String>> {
        let db = &self.db;
        let id = self.plugin.id;

        let versions = version_history::Entity::find()
            .select_only()
            .column(version_history::Column::Version)
            .filter(version_history::Column::Plugin.eq(id))
            .group_by(version_history::Column::Version)
            .order_by_desc(version_history::Column::Created.max())
            .into_tuple::<String>()
            .all(db)
            .await?;

        Ok(versions)
    }

    /// Sum of `Players` over this plugin's servers with `Updated` in `[min, max]`
    ///
    /// `max` defaults to now; an empty range sums to 0.
    pub async fn sum_players_of_servers_last_updated(
        &self,
        min: i64,
        max: Option<i64>,
    ) -> Result<i64> {
        let db = &self.db;
        let id = self.plugin.id;
        let max = max.unwrap_or_else(unix_now);

        let sum = sum_players_query(db.get_database_backend(), id, min, max)
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?;

        Ok(sum.flatten().unwrap_or(0))
    }

    /// Number of version changes with `Created` in `[min, max]`
    ///
    /// Not filtered by plugin: the count spans every plugin. Existing
    /// dashboards read it that way, so the scope is kept.
    pub async fn count_version_changes(&self, min: i64, max: i64) -> Result<u64> {
        let db = &self.db;

        let count = version_history::Entity::find()
            .filter(version_history::Column::Created.gte(min))
            .filter(version_history::Column::Created.lte(max))
            .count(db)
            .await?;

        Ok(count)
    }

    pub async fn count_servers(&self) -> Result<u64> {
        let db = &self.db;
        let id = self.plugin.id;

        let count = server::Entity::find()
            .filter(server::Column::Plugin.eq(id))
            .count(db)
            .await?;

        Ok(count)
    }

    /// Servers of this plugin with `Updated` in `[min, max]`; `max` defaults to now
    pub async fn count_servers_last_updated(&self, min: i64, max: Option<i64>) -> Result<u64> {
        let db = &self.db;
        let id = self.plugin.id;
        let max = max.unwrap_or_else(unix_now);

        let count = server::Entity::find()
            .filter(server::Column::Plugin.eq(id))
            .filter(server::Column::Updated.gte(min))
            .filter(server::Column::Updated.lte(max))
            .count(db)
            .await?;

        Ok(count)
    }

    pub async fn count_servers_using_version(&self, version: &str) -> Result<u64> {
        let db = &self.db;
        let id = self.plugin.id;

        let count = server::Entity::find()
            .filter(server::Column::Plugin.eq(id))
            .filter(server::Column::CurrentVersion.eq(version))
            .count(db)
            .await?;

        Ok(count)
    }

    /// Players online per epoch in `[min_epoch, max_epoch]`, ascending by epoch
    pub async fn timeline_players(
        &self,
        min_epoch: i64,
        max_epoch: Option<i64>,
    ) -> Result<BTreeMap<i64, i64>> {
        let db = &self.db;
        let id = self.plugin.id;
        let max_epoch = max_epoch.unwrap_or_else(unix_now);

        let rows = player_timeline::Entity::find()
            .select_only()
            .column(player_timeline::Column::Epoch)
            .column(player_timeline::Column::Players)
            .filter(player_timeline::Column::Plugin.eq(id))
            .filter(player_timeline::Column::Epoch.gte(min_epoch))
            .filter(player_timeline::Column::Epoch.lte(max_epoch))
            .order_by_asc(player_timeline::Column::Epoch)
            .into_tuple::<(i64, i64)>()
            .all(db)
            .await?;

        trace!(
            "timeline_players({}): {} rows in [{}, {}]",
            id,
            rows.len(),
            min_epoch,
            max_epoch
        );
        Ok(rows.into_iter().collect())
    }

    /// Servers online per epoch in `[min_epoch, max_epoch]`, ascending by epoch
    pub async fn timeline_servers(
        &self,
        min_epoch: i64,
        max_epoch: Option<i64>,
    ) -> Result<BTreeMap<i64, i64>> {
        let db = &self.db;
        let id = self.plugin.id;
        let max_epoch = max_epoch.unwrap_or_else(unix_now);

        let rows = server_timeline::Entity::find()
            .select_only()
            .column(server_timeline::Column::Epoch)
            .column(server_timeline::Column::Servers)
            .filter(server_timeline::Column::Plugin.eq(id))
            .filter(server_timeline::Column::Epoch.gte(min_epoch))
            .filter(server_timeline::Column::Epoch.lte(max_epoch))
            .order_by_asc(server_timeline::Column::Epoch)
            .into_tuple::<(i64, i64)>()
            .all(db)
            .await?;

        trace!(
            "timeline_servers({}): {} rows in [{}, {}]",
            id,
            rows.len(),
            min_epoch,
            max_epoch
        );
        Ok(rows.into_iter().collect())
    }

    async fn find_server(&self, guid: &str) -> Result<Option<Server>> {
        let db = &self.db;

        let model = server::Entity::find()
            .filter(server::Column::Guid.eq(guid))
            .one(db)
            .await?;

        Ok(model.map(model_to_server))
    }

    /// Fetch a server by GUID, inserting a zeroed row first when it is unknown
    ///
    /// A concurrent creator winning the insert shows up as a unique
    /// violation on `GUID`; that is treated as success and the row is read
    /// back. If the row is still missing after that single re-read the
    /// result is [`PluginMetricsError::DataIntegrity`].
    pub async fn get_or_create_server(&self, guid: &str) -> Result<Server> {
        if let Some(server) = self.find_server(guid).await? {
            return Ok(server);
        }

        let now = unix_now();
        let insert = server::Entity::insert(new_server_active_model(self.plugin.id, guid, now))
            .exec(&self.db)
            .await;

        match insert {
            Ok(_) => debug!("Server created: guid={} plugin={}", guid, self.plugin.id),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!("Server {} was created concurrently, re-reading", guid);
            }
            Err(e) => return Err(e.into()),
        }

        match self.find_server(guid).await? {
            Some(server) => Ok(server),
            None => {
                error!(
                    "Server row missing right after insert: guid={} plugin={}",
                    guid, self.plugin.id
                );
                Err(PluginMetricsError::data_integrity(format!(
                    "Failed to create server for GUID {}",
                    guid
                )))
            }
        }
    }

    /// Overwrite `Name` and `GlobalHits` of this plugin's row
    pub async fn save(&self) -> Result<()> {
        let db = &self.db;
        let id = self.plugin.id;

        retry::with_retry(&format!("save({})", id), self.retry_config, || async {
            plugin_to_active_model(&self.plugin).update(db).await
        })
        .await?;

        trace!("Plugin saved: {:?}", self.plugin);
        Ok(())
    }

    /// `global_hits += 1`, then [`Self::save`]
    ///
    /// Read-modify-write: two handlers incrementing the same plugin
    /// concurrently can lose one of the increments.
    pub async fn increment_global_hits(&mut self) -> Result<()> {
        self.plugin.global_hits += 1;
        self.save().await
    }
}

impl From<PluginAccessor> for Plugin {
    fn from(accessor: PluginAccessor) -> Self {
        accessor.plugin
    }
}

/// `SELECT CAST(SUM(Players) AS <int>)` over one plugin's servers
///
/// MySQL returns SUM as DECIMAL and Postgres as NUMERIC for BIGINT input,
/// neither of which decodes into `i64`. MySQL only accepts `SIGNED` as a
/// cast target for integers.
fn sum_players_query(
    backend: DbBackend,
    plugin: i32,
    min: i64,
    max: i64,
) -> Select<server::Entity> {
    let int_type = match backend {
        DbBackend::MySql => "SIGNED",
        _ => "BIGINT",
    };

    server::Entity::find()
        .select_only()
        .column_as(server::Column::Players.sum().cast_as(int_type), "total")
        .filter(server::Column::Plugin.eq(plugin))
        .filter(server::Column::Updated.gte(min))
        .filter(server::Column::Updated.lte(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QueryTrait;

    #[test]
    fn test_sum_players_is_cast_to_integer() {
        let mysql = sum_players_query(DbBackend::MySql, 1, 0, 10)
            .build(DbBackend::MySql)
            .to_string();
        assert!(mysql.contains("CAST(SUM("), "{mysql}");
        assert!(mysql.contains("AS SIGNED)"), "{mysql}");

        for backend in [DbBackend::Postgres, DbBackend::Sqlite] {
            let sql = sum_players_query(backend, 1, 0, 10).build(backend).to_string();
            assert!(sql.contains("CAST(SUM("), "{sql}");
            assert!(sql.contains("AS BIGINT)"), "{sql}");
        }
    }
}
