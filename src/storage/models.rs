use serde::{Deserialize, Serialize};

/// One row of the `Plugin` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: i32,
    pub name: String,
    pub global_hits: i64,
}

impl Plugin {
    pub fn new(id: i32, name: impl Into<String>, global_hits: i64) -> Self {
        Self {
            id,
            name: name.into(),
            global_hits,
        }
    }
}

/// One reporting server installation, identified by its GUID
///
/// `created` / `updated` are Unix timestamps in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: i32,
    pub plugin: i32,
    pub guid: String,
    pub players: i32,
    pub server_version: String,
    pub current_version: String,
    pub hits: i64,
    pub created: i64,
    pub updated: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}
