use crate::storage::{Plugin, Server};
use migration::entities::{plugin, server};

/// 将 plugin::Model 转换为 Plugin
pub fn model_to_plugin(model: plugin::Model) -> Plugin {
    Plugin {
        id: model.id,
        name: model.name,
        global_hits: model.global_hits.max(0),
    }
}

/// 将 server::Model 转换为 Server
pub fn model_to_server(model: server::Model) -> Server {
    Server {
        id: model.id,
        plugin: model.plugin,
        guid: model.guid,
        players: model.players,
        server_version: model.server_version,
        current_version: model.current_version,
        hits: model.hits,
        created: model.created,
        updated: model.updated,
    }
}

/// Plugin 的可写列（Name, GlobalHits），按主键整行覆盖
pub fn plugin_to_active_model(plugin: &Plugin) -> plugin::ActiveModel {
    use sea_orm::ActiveValue::*;

    plugin::ActiveModel {
        id: Unchanged(plugin.id),
        name: Set(plugin.name.clone()),
        global_hits: Set(plugin.global_hits),
    }
}

/// 新服务器的初始行：计数清零，创建/更新时间都为 `now`
pub fn new_server_active_model(plugin_id: i32, guid: &str, now: i64) -> server::ActiveModel {
    use sea_orm::ActiveValue::*;

    server::ActiveModel {
        id: NotSet,
        plugin: Set(plugin_id),
        guid: Set(guid.to_string()),
        players: Set(0),
        server_version: Set(String::new()),
        current_version: Set(String::new()),
        hits: Set(0),
        created: Set(now),
        updated: Set(now),
    }
}
