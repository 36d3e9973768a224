//! Per-guild session lifecycle.

mod common;

use common::{FakeBackend, TEXT, VOICE, quiet_config, track};
use jukebox::audio::{
    config::SessionConfig,
    ids::GuildId,
    registry::SessionRegistry,
    state::{EnqueueResult, PlaybackState},
};
use std::{sync::Arc, time::Duration};

fn registry(config: SessionConfig) -> (SessionRegistry, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::default());
    let (events, _inbox) = flume::unbounded();
    (SessionRegistry::new(backend.clone(), events, config), backend)
}

#[tokio::test]
async fn the_same_guild_gets_the_same_session() {
    let (registry, _backend) = registry(quiet_config());
    let guild = GuildId(7);

    let first = registry.get_or_create(guild).await;
    first.connect(VOICE, TEXT).await.unwrap();
    first.enqueue(track("A")).await.unwrap();

    let second = registry.get_or_create(guild).await;
    let status = second.status().await.unwrap();
    assert_eq!(status.current.unwrap().title, "A");
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn guilds_do_not_share_queues() {
    let (registry, backend) = registry(quiet_config());
    let (one, two) = (GuildId(1), GuildId(2));

    let first = registry.get_or_create(one).await;
    first.connect(VOICE, TEXT).await.unwrap();
    first.enqueue(track("A")).await.unwrap();
    first.enqueue(track("B")).await.unwrap();

    let second = registry.get_or_create(two).await;
    second.connect(VOICE, TEXT).await.unwrap();
    let result = second.enqueue(track("X")).await.unwrap();

    assert!(matches!(result, EnqueueResult::Started(ref t) if t.title == "X"));
    assert_eq!(first.list().await.unwrap().len(), 1);
    assert!(second.list().await.unwrap().is_empty());
    assert_eq!(backend.sink(one).played(), ["A"]);
    assert_eq!(backend.sink(two).played(), ["X"]);

    second.stop().await.unwrap();
    assert_eq!(
        first.status().await.unwrap().state,
        PlaybackState::Playing
    );
}

#[tokio::test]
async fn remove_shuts_the_session_down() {
    let (registry, backend) = registry(quiet_config());
    let guild = GuildId(3);

    let handle = registry.get_or_create(guild).await;
    handle.connect(VOICE, TEXT).await.unwrap();
    handle.enqueue(track("A")).await.unwrap();

    assert!(registry.remove(guild).await);
    assert!(!registry.remove(guild).await);
    assert!(registry.get(guild).await.is_none());
    assert!(!backend.sink(guild).calls().is_empty());
    assert!(handle.status().await.is_err());
}

#[tokio::test]
async fn shutdown_all_empties_the_registry() {
    let (registry, _backend) = registry(quiet_config());
    for id in 1..=3 {
        registry.get_or_create(GuildId(id)).await;
    }
    assert_eq!(registry.len().await, 3);

    registry.shutdown_all().await;

    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn retired_sessions_are_replaced_on_next_use() {
    let config = SessionConfig {
        idle_timeout: Some(Duration::from_millis(50)),
        ..quiet_config()
    };
    let (registry, _backend) = registry(config);
    let guild = GuildId(9);

    let first = registry.get_or_create(guild).await;
    tokio::time::timeout(Duration::from_secs(2), async {
        while !first.is_closed() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("idle session did not retire");

    assert!(registry.get(guild).await.is_none());
    let second = registry.get_or_create(guild).await;
    assert!(!second.is_closed());
    assert!(second.status().await.is_ok());
}
