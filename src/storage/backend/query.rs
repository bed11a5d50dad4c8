//! Plugin lookup and connectivity checks for SeaOrmStorage

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, EntityTrait, ExprTrait, QueryFilter};
use tracing::{debug, trace};

use super::converters::model_to_plugin;
use super::{PluginAccessor, SeaOrmStorage};
use crate::errors::Result;

use migration::entities::plugin;

impl SeaOrmStorage {
    /// Resolve a plugin by name
    ///
    /// Exact match first, then `LOWER(Name) = lower(name)`.
    pub async fn find_plugin(&self, name: &str) -> Result<Option<PluginAccessor>> {
        let db = &self.db;

        let exact = plugin::Entity::find()
            .filter(plugin::Column::Name.eq(name))
            .one(db)
            .await?;

        if let Some(model) = exact {
            trace!("Plugin resolved: {} -> {}", name, model.id);
            return Ok(Some(self.accessor(model)));
        }

        let folded = plugin::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(plugin::Column::Name)))
                    .eq(name.to_lowercase()),
            )
            .one(db)
            .await?;

        match folded {
            Some(model) => {
                trace!("Plugin resolved case-insensitively: {} -> {}", name, model.id);
                Ok(Some(self.accessor(model)))
            }
            None => {
                debug!("Plugin not found: {}", name);
                Ok(None)
            }
        }
    }

    pub async fn find_plugin_by_id(&self, id: i32) -> Result<Option<PluginAccessor>> {
        let model = plugin::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|m| self.accessor(m)))
    }

    /// Cheap round-trip used by readiness probes
    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }

    fn accessor(&self, model: plugin::Model) -> PluginAccessor {
        PluginAccessor::new(self.db.clone(), self.retry_config, model_to_plugin(model))
    }
}
