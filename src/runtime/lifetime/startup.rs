use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::get_config;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
}

/// 准备服务器启动的上下文：连接数据库并完成迁移
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let config = get_config();
    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;

    storage
        .ping()
        .await
        .context("Storage backend is not reachable")?;

    info!(
        "Using storage backend: {}",
        storage.get_backend_config().storage_type
    );
    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());

    Ok(StartupContext { storage })
}
