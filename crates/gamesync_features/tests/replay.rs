//! Feature adapters driven through a sync orchestrator.

use chrono::{Duration, Utc};
use gamesync_engine::{
    change_channel, Connectivity, FeatureAdapter, LoadOutcome, MockRemote, RemoteCall, Session,
    SyncConfig, SyncOrchestrator,
};
use gamesync_features::{Currency, FeatureSet, INVENTORY_MIRROR_KEY};
use gamesync_protocol::{GameProgressSnapshot, RemoteSave, UserId};
use gamesync_storage::{InMemoryStore, LocalStore};
use serde_json::{json, Value};
use std::sync::Arc;

type Orchestrator = SyncOrchestrator<InMemoryStore, MockRemote>;

fn orchestrator() -> (Orchestrator, Arc<InMemoryStore>, Arc<MockRemote>) {
    let store = Arc::new(InMemoryStore::new());
    let remote = Arc::new(MockRemote::new());
    let orchestrator = SyncOrchestrator::new(
        SyncConfig::default(),
        Arc::clone(&store),
        Arc::clone(&remote),
        Connectivity::new(true),
    )
    .unwrap();
    (orchestrator, store, remote)
}

fn full_snapshot() -> GameProgressSnapshot {
    let mut snapshot = GameProgressSnapshot::new();
    snapshot.version = 7;
    let sections = [
        ("inventory", json!([{"id": "medkit", "quantity": 3}])),
        ("currency", json!({"credits": 900, "gems": 12})),
        ("character_shards", json!({"vex": {"shards": 15, "stars": 2}})),
        (
            "mission_progress",
            json!({"data_heist": {"progress": 1, "target": 3}}),
        ),
        ("equipment", json!({"vex": {"weapon": "katana"}})),
        (
            "game_state",
            json!({"currentZone": "badlands", "unlockedZones": ["badlands", "neon_slums"]}),
        ),
    ];
    for (key, data) in sections {
        snapshot.set_section(key, data).unwrap();
    }
    snapshot
}

fn collect_all(features: &FeatureSet) -> Vec<Value> {
    features
        .adapters()
        .iter()
        .map(|a| a.collect_data().unwrap())
        .collect()
}

#[test]
fn replaying_the_same_snapshot_is_idempotent() {
    let (mut sync, _store, _remote) = orchestrator();
    let (notifier, mut changes) = change_channel();
    let features = FeatureSet::new(notifier);
    features.register(&mut sync).unwrap();

    let snapshot = full_snapshot();
    assert_eq!(sync.apply_game_data(&snapshot).unwrap(), 6);
    let first = collect_all(&features);

    assert_eq!(sync.apply_game_data(&snapshot).unwrap(), 6);
    assert_eq!(collect_all(&features), first);

    assert!(changes.try_recv().is_err());
    assert_eq!(features.wallet.balances().credits, 900);
    assert_eq!(features.game_state.current_zone(), "badlands");
    assert_eq!(features.shards.get("vex").unwrap().stars, 2);

    // Collected data reproduces the snapshot it was loaded from
    let collected = sync.collect_game_data().unwrap();
    assert_eq!(collected["equipment"], json!({"vex": {"weapon": "katana"}}));
    assert_eq!(collected["inventory"], snapshot.sections["inventory"]);
}

#[test]
fn registering_twice_is_rejected() {
    let (mut sync, _store, _remote) = orchestrator();
    let features = FeatureSet::new(sync.notifier());
    features.register(&mut sync).unwrap();
    assert!(features.register(&mut sync).is_err());
}

#[tokio::test]
async fn gameplay_changes_are_pushed_and_mirrored() {
    let (mut sync, store, remote) = orchestrator();
    let features = FeatureSet::new(sync.notifier());
    features.register(&mut sync).unwrap();
    sync.sign_in(Session::new(UserId::generate()));
    let sync = Arc::new(sync);
    let _handle = sync.start();

    features.inventory.add("monowire", 1).unwrap();
    features.wallet.earn(Currency::Credits, 50).unwrap();
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        remote.push_labels(),
        vec!["partial:inventory", "partial:currency"]
    );
    let mirrored = store.get(INVENTORY_MIRROR_KEY).unwrap().unwrap();
    assert_eq!(mirrored, json!([{"id": "monowire", "quantity": 1}]));
    assert_eq!(store.get("currency").unwrap(), None);
}

#[tokio::test]
async fn load_progress_restores_every_feature() {
    let (mut sync, _store, remote) = orchestrator();
    let (notifier, mut changes) = change_channel();
    let features = FeatureSet::new(notifier);
    features.register(&mut sync).unwrap();

    let user = UserId::generate();
    let snapshot = full_snapshot();
    remote.set_pull_response(Some(RemoteSave {
        version: 7,
        game_data: snapshot.sections.clone(),
        last_synced_at: None,
    }));
    sync.sign_in(Session::new(user));

    let outcome = sync.load_progress(user).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Remote { version: 7 });
    assert_eq!(features.inventory.quantity("medkit"), 3);
    assert_eq!(features.equipment.equipped("vex", "weapon").as_deref(), Some("katana"));
    assert!(changes.try_recv().is_err());

    // The next full save builds on the loaded version
    assert!(sync.save_all().await.unwrap().is_synced());
    match remote.calls().last() {
        Some(RemoteCall::PushFull { game_data, version }) => {
            assert_eq!(*version, 8);
            assert_eq!(game_data["currency"], json!({"credits": 900, "gems": 12}));
        }
        other => panic!("expected a full push, got {other:?}"),
    }
}

fn assert_mirror_matches(store: &InMemoryStore, section: &str, mirror: &str) {
    let progress = store.get("game_progress").unwrap().unwrap();
    assert_eq!(store.get(mirror).unwrap().as_ref(), progress.get(section));
}

#[tokio::test]
async fn mirrors_follow_every_snapshot_write() {
    let (mut sync, store, remote) = orchestrator();
    let (notifier, _changes) = change_channel();
    FeatureSet::new(notifier).register(&mut sync).unwrap();
    let user = UserId::generate();
    sync.sign_in(Session::new(user));

    sync.save_partial("character_shards", json!({"vex": {"shards": 1, "stars": 0}}))
        .await
        .unwrap();
    assert_mirror_matches(&store, "character_shards", "character_shards");

    let mut snapshot = GameProgressSnapshot::new();
    snapshot
        .set_section("character_shards", json!({"vex": {"shards": 99, "stars": 3}}))
        .unwrap();
    snapshot
        .set_section("inventory", json!([{"id": "deck", "quantity": 1}]))
        .unwrap();
    sync.save_full(snapshot).await.unwrap();
    assert_mirror_matches(&store, "character_shards", "character_shards");
    assert_mirror_matches(&store, "inventory", INVENTORY_MIRROR_KEY);

    remote.set_pull_response(Some(RemoteSave {
        version: 12,
        game_data: [(
            "character_shards".to_string(),
            json!({"vex": {"shards": 7, "stars": 5}}),
        )]
        .into(),
        last_synced_at: Some(Utc::now() + Duration::hours(1)),
    }));
    let outcome = sync.load_progress(user).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Remote { version: 12 });

    assert_eq!(
        store.get("character_shards").unwrap(),
        Some(json!({"vex": {"shards": 7, "stars": 5}}))
    );
    assert_mirror_matches(&store, "character_shards", "character_shards");
    assert_eq!(store.get(INVENTORY_MIRROR_KEY).unwrap(), None);
}
