//! End-to-end progression tests against on-disk storage.
//!
//! These mirror a player's session: scan, complete, restart, reset.
//! Run with: `cargo test -p fernveil-core --test progression_flow`

use fernveil_core::testing::FixedClock;
use fernveil_core::{
    Catalog, Encounter, EncounterType, FileStorage, ProgressionStore, StoreConfig, SystemClock,
    DEFAULT_STORAGE_KEY,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tempfile::TempDir;

fn open_storage(dir: &TempDir) -> Arc<FileStorage> {
    Arc::new(FileStorage::new(dir.path().join("fernveil")))
}

fn scan(catalog: &Catalog, rng: &mut StdRng) -> Encounter {
    catalog
        .random_spirit(rng, &SystemClock)
        .expect("reference catalog is not empty")
}

// =============================================================================
// Persistence round trip
// =============================================================================

#[tokio::test]
async fn test_progress_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = Catalog::reference();
    let mut rng = StdRng::seed_from_u64(11);

    let before = {
        let mut store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default()).await;
        for i in 0..12 {
            let encounter = scan(&catalog, &mut rng);
            store.start_encounter(encounter.clone());
            store
                .complete_encounter(&encounter, format!("visit {i}"))
                .await;
        }
        store.snapshot()
    };

    let store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default()).await;
    let after = store.snapshot();

    assert_eq!(after.xp(), before.xp());
    assert_eq!(after.spirit_bond_level(), before.spirit_bond_level());
    assert_eq!(after.journal(), before.journal());
    assert!(after.current_encounter().is_none());

    let notes: Vec<_> = after
        .journal()
        .iter()
        .filter_map(|e| e.personal_note.clone())
        .collect();
    assert_eq!(notes.first().map(String::as_str), Some("visit 0"));
    assert_eq!(notes.last().map(String::as_str), Some("visit 11"));
}

#[tokio::test]
async fn test_in_flight_encounter_is_not_persisted() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = Catalog::reference();
    let mut rng = StdRng::seed_from_u64(5);

    {
        let mut store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default()).await;
        let first = scan(&catalog, &mut rng);
        store.complete_encounter(&first, "").await;
        store.start_encounter(scan(&catalog, &mut rng));
        assert!(store.state().current_encounter().is_some());
    }

    let store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default()).await;
    assert!(store.state().current_encounter().is_none());
    assert_eq!(store.state().journal().len(), 1);
}

// =============================================================================
// Invariants over many completions
// =============================================================================

#[tokio::test]
async fn test_level_and_journal_invariants() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = Catalog::reference();
    let mut rng = StdRng::seed_from_u64(99);
    let mut store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default()).await;

    let mut previous: Vec<Encounter> = Vec::new();
    for _ in 0..40 {
        let encounter = scan(&catalog, &mut rng);
        let xp_before = store.state().xp();

        store.complete_encounter(&encounter, "").await;

        let state = store.snapshot();
        assert_eq!(state.xp(), xp_before + u64::from(encounter.xp_earned));
        assert_eq!(state.spirit_bond_level(), state.xp() / 100 + 1);
        assert_eq!(state.journal().len(), previous.len() + 1);
        assert_eq!(&state.journal()[..previous.len()], previous.as_slice());
        previous = state.journal().to_vec();
    }
}

// =============================================================================
// Example scenarios
// =============================================================================

#[tokio::test]
async fn test_two_completions_reach_level_two() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = Catalog::reference();
    let mut rng = StdRng::seed_from_u64(0);
    let clock = Arc::new(FixedClock::epoch());
    let mut store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default())
        .await
        .with_clock(clock);

    let puzzle = catalog
        .spirit_by_type(EncounterType::Puzzle, &mut rng, &SystemClock)
        .expect("catalog has a puzzle spirit");
    assert_eq!(puzzle.xp_earned, 25);
    store.complete_encounter(&puzzle, "").await;
    assert_eq!(store.state().xp(), 25);
    assert_eq!(store.state().spirit_bond_level(), 1);

    let mut big = scan(&catalog, &mut rng);
    big.xp_earned = 80;
    store.complete_encounter(&big, "").await;
    assert_eq!(store.state().xp(), 105);
    assert_eq!(store.state().spirit_bond_level(), 2);
    assert_eq!(store.state().journal().len(), 2);
}

#[tokio::test]
async fn test_sound_toggle_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = Catalog::reference();
    let mut rng = StdRng::seed_from_u64(3);

    let journal_before = {
        let mut store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default()).await;
        store.complete_encounter(&scan(&catalog, &mut rng), "").await;
        store.complete_encounter(&scan(&catalog, &mut rng), "").await;
        assert!(store.state().sound_enabled());
        assert!(!store.toggle_sound().await);
        store.snapshot()
    };

    let store = ProgressionStore::open(open_storage(&temp_dir), StoreConfig::default()).await;
    assert!(!store.state().sound_enabled());
    assert_eq!(store.state().xp(), journal_before.xp());
    assert_eq!(store.state().journal(), journal_before.journal());
}

#[tokio::test]
async fn test_reset_then_load_yields_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let storage = open_storage(&temp_dir);
    let catalog = Catalog::reference();
    let mut rng = StdRng::seed_from_u64(8);

    let mut store = ProgressionStore::open(storage.clone(), StoreConfig::default()).await;
    store.complete_encounter(&scan(&catalog, &mut rng), "").await;
    store.reset().await;

    assert!(!storage.path_for(DEFAULT_STORAGE_KEY).exists());

    let reopened = ProgressionStore::open(storage, StoreConfig::default()).await;
    assert_eq!(reopened.state().xp(), 0);
    assert_eq!(reopened.state().spirit_bond_level(), 1);
    assert!(reopened.state().journal().is_empty());
}

// =============================================================================
// Compatibility with blobs written by earlier releases
// =============================================================================

#[tokio::test]
async fn test_loads_legacy_blob() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let storage = open_storage(&temp_dir);
    std::fs::create_dir_all(storage.dir()).unwrap();
    std::fs::write(
        storage.path_for(DEFAULT_STORAGE_KEY),
        r#"{
            "xp": 43,
            "spiritBondLevel": 1,
            "journal": [
                {
                    "spiritName": "Whisper, the Story Weaver",
                    "type": "Story",
                    "task": "Listen carefully.",
                    "reward": "Memory Crystal",
                    "xpEarned": 20,
                    "id": "1717000000000abc123xyz",
                    "date": "2024-05-29T16:26:40.000Z",
                    "completed": true,
                    "personalNote": ""
                },
                {
                    "spiritName": "Luna, the Night Whisperer",
                    "type": "Mindfulness",
                    "task": "Stand still.",
                    "reward": "Echo Stone",
                    "xpEarned": 23,
                    "id": "1717000500000def456uvw",
                    "date": "2024-05-29T16:35:00.000Z",
                    "completed": true,
                    "personalNote": "crickets"
                }
            ],
            "soundEnabled": false
        }"#,
    )
    .unwrap();

    let store = ProgressionStore::open(storage, StoreConfig::default()).await;
    let state = store.snapshot();

    assert_eq!(state.xp(), 43);
    assert!(!state.sound_enabled());
    assert_eq!(state.journal().len(), 2);
    assert_eq!(state.journal()[0].note(), None);
    assert_eq!(state.journal()[1].note(), Some("crickets"));
    assert_eq!(state.journal()[1].encounter_type, EncounterType::Mindfulness);
}
