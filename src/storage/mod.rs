use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{PluginAccessor, SeaOrmStorage};
pub use models::{Plugin, Server, StorageConfig};

pub struct StorageFactory;

impl StorageFactory {
    /// 连接数据库并执行迁移，数据库类型从 URL 推断
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let storage = SeaOrmStorage::new(config).await?;
        Ok(Arc::new(storage))
    }
}
