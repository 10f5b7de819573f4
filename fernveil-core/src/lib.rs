//! Fernveil spirit encounter engine.
//!
//! This crate provides:
//! - The spirit catalog and random encounter generation
//! - A progression store tracking XP, bond level and the encounter journal
//! - Best-effort persistence of progression to key-value storage
//! - Journal filtering, statistics and export
//!
//! # Quick Start
//!
//! ```ignore
//! use fernveil_core::{Catalog, FileStorage, ProgressionStore, StoreConfig, SystemClock};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(FileStorage::new(".fernveil"));
//!     let mut store = ProgressionStore::open(storage, StoreConfig::default()).await;
//!
//!     let catalog = Catalog::reference();
//!     if let Some(spirit) = catalog.random_spirit(&mut rand::thread_rng(), &SystemClock) {
//!         println!("{} appears: {}", spirit.spirit_name, spirit.task);
//!         store.start_encounter(spirit.clone());
//!         store.complete_encounter(&spirit, "").await;
//!     }
//!
//!     println!("XP {} (bond level {})", store.state().xp(), store.state().spirit_bond_level());
//! }
//! ```

pub mod catalog;
pub mod clock;
pub mod encounter;
pub mod journal;
pub mod state;
pub mod storage;
pub mod store;
pub mod testing;

// Primary public API
pub use catalog::{Catalog, CatalogError, SpiritTemplate};
pub use clock::{Clock, SystemClock};
pub use encounter::{clamp_note, Encounter, EncounterType, ParseEncounterTypeError, MAX_NOTE_CHARS};
pub use journal::{
    filter_journal, newest_first, ExportError, JournalFilter, JournalStats, JourneyExport,
};
pub use state::{bond_level, BondProgress, PersistedProgress, ProgressionState, XP_PER_LEVEL};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{PersistError, ProgressionStore, StoreConfig, DEFAULT_STORAGE_KEY};
