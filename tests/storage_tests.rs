//! Storage backend tests
//!
//! PluginAccessor queries against temporary SQLite databases.

use migration::entities::{player_timeline, plugin, server, server_timeline, version_history};
use plugin_metrics::config::DatabaseConfig;
use plugin_metrics::storage::backend::{PluginAccessor, SeaOrmStorage};
use plugin_metrics::utils::unix_now;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// 创建临时 SQLite 数据库的存储实例
async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("metrics.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&DatabaseConfig::with_url(db_url))
        .await
        .expect("Failed to create storage");

    (storage, temp_dir)
}

async fn seed_plugin(storage: &SeaOrmStorage, name: &str) -> PluginAccessor {
    plugin::ActiveModel {
        name: Set(name.to_string()),
        global_hits: Set(0),
        ..Default::default()
    }
    .insert(storage.get_db())
    .await
    .expect("Failed to insert plugin");

    storage
        .find_plugin(name)
        .await
        .expect("Plugin lookup failed")
        .expect("Seeded plugin not found")
}

async fn seed_server(
    storage: &SeaOrmStorage,
    plugin_id: i32,
    guid: &str,
    players: i32,
    current_version: &str,
    updated: i64,
) {
    server::ActiveModel {
        plugin: Set(plugin_id),
        guid: Set(guid.to_string()),
        players: Set(players),
        server_version: Set("git-Bukkit-1.2.5-R4.0".to_string()),
        current_version: Set(current_version.to_string()),
        hits: Set(1),
        created: Set(updated),
        updated: Set(updated),
        ..Default::default()
    }
    .insert(storage.get_db())
    .await
    .expect("Failed to insert server");
}

async fn seed_version(storage: &SeaOrmStorage, plugin_id: i32, version: &str, created: i64) {
    version_history::ActiveModel {
        plugin: Set(plugin_id),
        version: Set(version.to_string()),
        created: Set(created),
        ..Default::default()
    }
    .insert(storage.get_db())
    .await
    .expect("Failed to insert version history");
}

async fn seed_timelines(
    storage: &SeaOrmStorage,
    plugin_id: i32,
    servers: &[(i64, i64)],
    players: &[(i64, i64)],
) {
    for &(epoch, count) in servers {
        server_timeline::ActiveModel {
            plugin: Set(plugin_id),
            epoch: Set(epoch),
            servers: Set(count),
            ..Default::default()
        }
        .insert(storage.get_db())
        .await
        .expect("Failed to insert server timeline");
    }
    for &(epoch, count) in players {
        player_timeline::ActiveModel {
            plugin: Set(plugin_id),
            epoch: Set(epoch),
            players: Set(count),
            ..Default::default()
        }
        .insert(storage.get_db())
        .await
        .expect("Failed to insert player timeline");
    }
}

// =============================================================================
// Plugin lookup
// =============================================================================

#[tokio::test]
async fn test_find_plugin_exact_and_case_insensitive() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;

    let found = storage.find_plugin("LWC").await.unwrap().unwrap();
    assert_eq!(found.id(), lwc.id());
    assert_eq!(found.name(), "LWC");

    let found = storage.find_plugin("lwc").await.unwrap().unwrap();
    assert_eq!(found.id(), lwc.id());

    assert!(storage.find_plugin("Essentials").await.unwrap().is_none());
    assert!(storage.find_plugin("").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_plugin_folds_case_of_stored_name() {
    let (storage, _dir) = create_temp_storage().await;
    let world_edit = seed_plugin(&storage, "WorldEdit").await;
    seed_plugin(&storage, "Essentials").await;

    for query in ["WORLDEDIT", "worldedit", "wOrLdEdIt"] {
        let found = storage.find_plugin(query).await.unwrap().unwrap();
        assert_eq!(found.id(), world_edit.id(), "{query}");
        assert_eq!(found.name(), "WorldEdit");
    }
    assert!(storage.find_plugin("World").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_plugin_by_id_and_ping() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;

    let found = storage.find_plugin_by_id(lwc.id()).await.unwrap().unwrap();
    assert_eq!(found.plugin(), lwc.plugin());
    assert!(storage.find_plugin_by_id(lwc.id() + 100).await.unwrap().is_none());

    storage.ping().await.expect("ping should succeed");
    assert_eq!(storage.get_backend_config().storage_type, "sqlite");
}

// =============================================================================
// Aggregates
// =============================================================================

#[tokio::test]
async fn test_aggregates_are_zero_without_rows() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;

    assert_eq!(lwc.sum_players_of_servers_last_updated(0, None).await.unwrap(), 0);
    assert_eq!(lwc.count_servers_last_updated(0, None).await.unwrap(), 0);
    assert_eq!(lwc.count_servers().await.unwrap(), 0);
    assert_eq!(lwc.count_servers_using_version("4.0.0").await.unwrap(), 0);
    assert_eq!(lwc.count_version_changes(0, i64::MAX).await.unwrap(), 0);
    assert!(lwc.versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_last_updated_range_is_inclusive_and_scoped() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;
    let other = seed_plugin(&storage, "Essentials").await;

    seed_server(&storage, lwc.id(), "guid-a", 10, "4.0.0", 1_000).await;
    seed_server(&storage, lwc.id(), "guid-b", 5, "4.0.0", 2_000).await;
    seed_server(&storage, lwc.id(), "guid-c", 7, "4.1.0", 3_000).await;
    seed_server(&storage, other.id(), "guid-d", 100, "4.0.0", 2_000).await;

    assert_eq!(
        lwc.sum_players_of_servers_last_updated(1_000, Some(2_000))
            .await
            .unwrap(),
        15
    );
    assert_eq!(
        lwc.count_servers_last_updated(1_000, Some(2_000))
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        lwc.sum_players_of_servers_last_updated(2_001, Some(2_999))
            .await
            .unwrap(),
        0
    );
    // max defaults to now
    assert_eq!(lwc.sum_players_of_servers_last_updated(0, None).await.unwrap(), 22);
    assert_eq!(lwc.count_servers_last_updated(0, None).await.unwrap(), 3);
}

#[tokio::test]
async fn test_server_counts() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;
    let other = seed_plugin(&storage, "Essentials").await;

    seed_server(&storage, lwc.id(), "guid-a", 1, "4.0.0", 1_000).await;
    seed_server(&storage, lwc.id(), "guid-b", 1, "4.0.0", 1_000).await;
    seed_server(&storage, lwc.id(), "guid-c", 1, "4.1.0", 1_000).await;
    seed_server(&storage, other.id(), "guid-d", 1, "4.0.0", 1_000).await;

    assert_eq!(lwc.count_servers().await.unwrap(), 3);
    assert_eq!(lwc.count_servers_using_version("4.0.0").await.unwrap(), 2);
    assert_eq!(lwc.count_servers_using_version("4.1.0").await.unwrap(), 1);
    assert_eq!(lwc.count_servers_using_version("5.0.0").await.unwrap(), 0);
    assert_eq!(other.count_servers().await.unwrap(), 1);
}

// =============================================================================
// Versions
// =============================================================================

#[tokio::test]
async fn test_versions_are_distinct_newest_first() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;
    let other = seed_plugin(&storage, "Essentials").await;

    seed_version(&storage, lwc.id(), "1.0", 100).await;
    seed_version(&storage, lwc.id(), "1.1", 200).await;
    seed_version(&storage, lwc.id(), "1.0", 150).await;
    seed_version(&storage, lwc.id(), "2.0", 300).await;
    seed_version(&storage, other.id(), "9.9", 400).await;

    assert_eq!(lwc.versions().await.unwrap(), vec!["2.0", "1.1", "1.0"]);
    assert_eq!(other.versions().await.unwrap(), vec!["9.9"]);
}

#[tokio::test]
async fn test_count_version_changes_spans_all_plugins() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;
    let other = seed_plugin(&storage, "Essentials").await;

    seed_version(&storage, lwc.id(), "1.0", 100).await;
    seed_version(&storage, lwc.id(), "1.1", 200).await;
    seed_version(&storage, other.id(), "3.0", 150).await;
    seed_version(&storage, other.id(), "3.1", 900).await;

    // Known quirk: the count is not filtered by plugin
    assert_eq!(lwc.count_version_changes(100, 200).await.unwrap(), 3);
    assert_eq!(other.count_version_changes(100, 200).await.unwrap(), 3);
    assert_eq!(lwc.count_version_changes(0, 1_000).await.unwrap(), 4);
    assert_eq!(lwc.count_version_changes(201, 899).await.unwrap(), 0);
}

// =============================================================================
// Timelines
// =============================================================================

#[tokio::test]
async fn test_timelines_are_inclusive_and_scoped() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;
    let other = seed_plugin(&storage, "Essentials").await;

    seed_timelines(
        &storage,
        lwc.id(),
        &[(3_600, 5), (7_200, 7), (10_800, 9), (14_400, 11)],
        &[(3_600, 20), (10_800, 40)],
    )
    .await;
    seed_timelines(&storage, other.id(), &[(7_200, 99)], &[(7_200, 999)]).await;

    let servers = lwc.timeline_servers(3_600, Some(10_800)).await.unwrap();
    assert_eq!(
        servers.into_iter().collect::<Vec<_>>(),
        vec![(3_600, 5), (7_200, 7), (10_800, 9)]
    );

    let players = lwc.timeline_players(3_600, Some(10_800)).await.unwrap();
    assert_eq!(
        players.into_iter().collect::<Vec<_>>(),
        vec![(3_600, 20), (10_800, 40)]
    );

    assert!(lwc.timeline_players(20_000, Some(30_000)).await.unwrap().is_empty());
    assert_eq!(other.timeline_servers(0, None).await.unwrap().len(), 1);
}

// =============================================================================
// Fetch-or-create
// =============================================================================

#[tokio::test]
async fn test_get_or_create_server_is_idempotent() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;

    let before = unix_now();
    let created = lwc.get_or_create_server("4f1b0c2e-guid").await.unwrap();
    let after = unix_now();

    assert_eq!(created.plugin, lwc.id());
    assert_eq!(created.guid, "4f1b0c2e-guid");
    assert_eq!(created.players, 0);
    assert_eq!(created.hits, 0);
    assert_eq!(created.created, created.updated);
    assert!((before..=after).contains(&created.created));

    let again = lwc.get_or_create_server("4f1b0c2e-guid").await.unwrap();
    assert_eq!(again, created);
    assert_eq!(lwc.count_servers().await.unwrap(), 1);
}

#[tokio::test]
async fn test_get_or_create_server_returns_existing_row() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;
    seed_server(&storage, lwc.id(), "known-guid", 12, "4.1.0", 5_000).await;

    let server = lwc.get_or_create_server("known-guid").await.unwrap();
    assert_eq!(server.players, 12);
    assert_eq!(server.current_version, "4.1.0");
    assert_eq!(server.updated, 5_000);
    assert_eq!(lwc.count_servers().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_get_or_create_yields_one_row() {
    let (storage, _dir) = create_temp_storage().await;
    let lwc = seed_plugin(&storage, "LWC").await;
    let twin = lwc.clone();

    let (a, b) = tokio::join!(
        lwc.get_or_create_server("race-guid"),
        twin.get_or_create_server("race-guid")
    );

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);
    assert_eq!(lwc.count_servers().await.unwrap(), 1);
}

// =============================================================================
// Save / hits
// =============================================================================

#[tokio::test]
async fn test_increment_global_hits_persists() {
    let (storage, _dir) = create_temp_storage().await;
    let mut lwc = seed_plugin(&storage, "LWC").await;

    lwc.increment_global_hits().await.unwrap();
    lwc.increment_global_hits().await.unwrap();
    assert_eq!(lwc.global_hits(), 2);

    let reloaded = storage.find_plugin("LWC").await.unwrap().unwrap();
    assert_eq!(reloaded.global_hits(), 2);
}

#[tokio::test]
async fn test_save_overwrites_name_and_hits() {
    let (storage, _dir) = create_temp_storage().await;
    let mut lwc = seed_plugin(&storage, "LWC").await;
    let id = lwc.id();

    lwc.rename("LWC-Extended");
    lwc.save().await.unwrap();

    assert!(storage.find_plugin("LWC").await.unwrap().is_none());
    let renamed = storage.find_plugin_by_id(id).await.unwrap().unwrap();
    assert_eq!(renamed.name(), "LWC-Extended");

    let row = plugin::Entity::find_by_id(id)
        .one(storage.get_db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.name, "LWC-Extended");
    assert_eq!(row.global_hits, 0);
}

#[tokio::test]
async fn test_only_save_retries_after_pool_closed() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("closed.db").display());
    let config = DatabaseConfig {
        retry_count: 1,
        retry_base_delay_ms: 300,
        retry_max_delay_ms: 300,
        ..DatabaseConfig::with_url(db_url)
    };
    let storage = SeaOrmStorage::new(&config)
        .await
        .expect("Failed to create storage");
    let lwc = seed_plugin(&storage, "LWC").await;

    storage.get_db().close_by_ref().await.unwrap();

    let started = Instant::now();
    assert!(lwc.count_servers().await.is_err());
    assert!(storage.find_plugin("LWC").await.is_err());
    assert!(lwc.timeline_servers(0, None).await.is_err());
    assert!(started.elapsed() < Duration::from_millis(300));

    let started = Instant::now();
    assert!(lwc.save().await.is_err());
    assert!(started.elapsed() >= Duration::from_millis(300));
}
