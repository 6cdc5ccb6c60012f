//! Cross-module lifecycle tests: snapshot round-trip and migration on
//! restart, placed in `tests/` rather than `#[cfg(test)]` per the
//! teacher's convention of keeping pure-module tests beside the code
//! (`game/core`) and cross-module flows in `runtime/tests`.

use std::collections::HashMap;

use engine_core::config::{AlgorithmRef, AlgorithmsConfig, ClassDef, GameConfig};
use engine_core::ids::{ActorId, ClassId, ConfigId, InstanceId, PlayerId, StatName};
use engine_core::state::{Actor, Character, Player};
use engine_core::GameState;
use engine_runtime::{InstanceRegistry, SnapshotStore};

fn config_with_id(config_id: &str) -> GameConfig {
    let mut classes = HashMap::new();
    classes.insert(
        ClassId::from("warrior"),
        ClassDef {
            base_stats: HashMap::from([(StatName::from("hp"), 20.0)]),
        },
    );
    GameConfig {
        config_id: ConfigId::from(config_id),
        max_level: 10,
        stats: vec![StatName::from("hp")],
        slots: vec![],
        classes,
        gear_defs: HashMap::new(),
        sets: HashMap::new(),
        algorithms: AlgorithmsConfig {
            growth: AlgorithmRef { algorithm_id: "flat".into(), parameters: Default::default() },
            level_cost_character: AlgorithmRef { algorithm_id: "flat".into(), parameters: Default::default() },
            level_cost_gear: AlgorithmRef { algorithm_id: "flat".into(), parameters: Default::default() },
        },
        stat_clamps: HashMap::new(),
    }
}

fn state_with_one_character(instance_id: &str, config_id: &str) -> GameState {
    let mut state = GameState::empty(
        InstanceId::from(instance_id),
        ConfigId::from(config_id),
        100,
    );
    state.actors.insert(
        ActorId::from("a1"),
        Actor {
            id: ActorId::from("a1"),
            api_key: "k1".to_string(),
            player_ids: vec![PlayerId::from("p1")],
        },
    );
    let mut player = Player::new(PlayerId::from("p1"));
    player.characters.insert(
        engine_core::ids::CharacterId::from("c1"),
        Character::new(engine_core::ids::CharacterId::from("c1"), ClassId::from("warrior")),
    );
    state.players.insert(player.id.clone(), player);
    state
}

#[test]
fn snapshot_then_restore_then_migrate_with_same_config_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path()).unwrap();
    let original = state_with_one_character("instance_001", "cfg_v1");
    store.save(&original).unwrap();

    let restored = store.load(&InstanceId::from("instance_001")).unwrap().unwrap();
    assert_eq!(restored.players, original.players);
    assert_eq!(restored.actors, original.actors);

    let config = config_with_id("cfg_v1");
    let (migrated, report) = engine_core::migrate(restored, &config);
    assert!(report.is_clean(), "same-config migration should emit no warnings: {report:?}");
    assert_eq!(migrated.state_version, original.state_version);
    assert_eq!(migrated.players, original.players);
}

#[test]
fn registry_bootstrap_restores_and_migrates_snapshots_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path()).unwrap();
    let legacy = state_with_one_character("instance_001", "old_v1");
    store.save(&legacy).unwrap();

    let store_for_registry = SnapshotStore::new(dir.path()).unwrap();
    let registry =
        InstanceRegistry::bootstrap(config_with_id("new_v1"), None, 100, store_for_registry).unwrap();

    let config_id = registry
        .with_state(&InstanceId::from("instance_001"), |s| s.config_id.clone())
        .unwrap();
    assert_eq!(config_id, ConfigId::from("new_v1"));
}

#[test]
fn flush_all_writes_every_instance_regardless_of_dirtiness() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path()).unwrap();
    let registry = InstanceRegistry::bootstrap(config_with_id("cfg_v1"), None, 100, store).unwrap();

    assert_eq!(registry.flush_all().unwrap(), 1);

    let reread = SnapshotStore::new(dir.path()).unwrap();
    let loaded = reread.load(&InstanceId::from("instance_001")).unwrap();
    assert!(loaded.is_some());
}
