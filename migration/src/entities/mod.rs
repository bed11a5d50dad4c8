pub mod player_timeline;
pub mod plugin;
pub mod server;
pub mod server_timeline;
pub mod version_history;

pub use player_timeline::Entity as PlayerTimelineEntity;
pub use plugin::Entity as PluginEntity;
pub use server::Entity as ServerEntity;
pub use server_timeline::Entity as ServerTimelineEntity;
pub use version_history::Entity as VersionHistoryEntity;
