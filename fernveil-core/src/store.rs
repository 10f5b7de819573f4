//! The progression store.
//!
//! Owns the player's [`ProgressionState`] and keeps it in step with durable
//! storage. Every operation applies its change in memory and publishes the
//! new state to subscribers before touching storage. Storage failures are
//! logged and absorbed: the in-memory change always stands and callers never
//! see an error.
//!
//! # Example
//!
//! ```ignore
//! use fernveil_core::{Catalog, FileStorage, ProgressionStore, StoreConfig, SystemClock};
//! use std::sync::Arc;
//!
//! let mut store =
//!     ProgressionStore::open(Arc::new(FileStorage::new(".fernveil")), StoreConfig::default()).await;
//!
//! let encounter = Catalog::reference()
//!     .random_spirit(&mut rand::thread_rng(), &SystemClock)
//!     .expect("catalog is not empty");
//! store.start_encounter(encounter.clone());
//! store.complete_encounter(&encounter, "Counted eleven birds").await;
//!
//! println!("Bond level {}", store.state().spirit_bond_level());
//! ```

use crate::clock::{Clock, SystemClock};
use crate::encounter::Encounter;
use crate::state::{bond_level, PersistedProgress, ProgressionState};
use crate::storage::{Storage, StorageError};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Key the progression blob is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "fernveil_data";

/// Errors from writing progression data. Logged by the store, never returned.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for a progression store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage key holding the progression blob.
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

/// Single source of truth for XP, bond level, journal and sound preference.
pub struct ProgressionStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    state: watch::Sender<ProgressionState>,
}

impl ProgressionStore {
    /// A store with default state. Call [`load`](Self::load) to rehydrate.
    pub fn new(storage: Arc<dyn Storage>, config: StoreConfig) -> Self {
        let (state, _) = watch::channel(ProgressionState::default());
        Self {
            storage,
            clock: Arc::new(SystemClock),
            config,
            state,
        }
    }

    /// Create a store and load whatever was persisted.
    pub async fn open(storage: Arc<dyn Storage>, config: StoreConfig) -> Self {
        let mut store = Self::new(storage, config);
        store.load().await;
        store
    }

    /// Use a different clock for completion timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The current state. Hold the guard briefly; it blocks publishing.
    pub fn state(&self) -> watch::Ref<'_, ProgressionState> {
        self.state.borrow()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> ProgressionState {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<ProgressionState> {
        self.state.subscribe()
    }

    /// Mark an encounter as in progress. Not persisted.
    pub fn start_encounter(&mut self, encounter: Encounter) {
        debug!(id = %encounter.id, spirit = %encounter.spirit_name, "Encounter started");
        self.state
            .send_modify(|s| s.set_current_encounter(encounter));
    }

    /// Complete an encounter and record it in the journal.
    ///
    /// XP and bond level are updated and the in-flight encounter cleared, then
    /// the whole progression is written. Completing the same encounter twice
    /// records it twice. Returns the journal entry.
    pub async fn complete_encounter(
        &mut self,
        encounter: &Encounter,
        personal_note: impl Into<String>,
    ) -> Encounter {
        let completed = encounter.completed_at(self.clock.now(), personal_note);

        self.state
            .send_modify(|s| s.record_completion(completed.clone()));

        let saved = self.state.borrow().to_persisted();
        debug!(
            id = %completed.id,
            xp = ?saved.xp,
            level = ?saved.spirit_bond_level,
            "Encounter completed"
        );

        if let Err(e) = self.write(&saved).await {
            error!(key = %self.config.storage_key, error = %e, "Failed to save progression data");
        }

        completed
    }

    /// Flip the sound preference. Returns the new value.
    ///
    /// Only the flag is written: the stored blob is read back and the flag
    /// merged into it, so fields written by other operations are kept.
    pub async fn toggle_sound(&mut self) -> bool {
        self.state.send_modify(|s| {
            s.toggle_sound();
        });
        let enabled = self.state.borrow().sound_enabled();

        if let Err(e) = self.merge_sound(enabled).await {
            error!(key = %self.config.storage_key, error = %e, "Failed to save sound setting");
        }

        enabled
    }

    /// Replace the in-memory progression with the persisted copy.
    ///
    /// Leaves the state alone when nothing is stored, the blob is unreadable or
    /// it is not a JSON object. Within an object, fields of the wrong shape
    /// fall back to their defaults and bad journal entries are skipped. Safe
    /// to call more than once.
    pub async fn load(&mut self) {
        let Some(saved) = self.read().await else {
            return;
        };

        if let (Some(xp), Some(level)) = (saved.xp, saved.spirit_bond_level) {
            if bond_level(xp) != level {
                warn!(xp, level, "Stored bond level disagrees with XP, recomputing");
            }
        }

        self.state.send_modify(|s| s.restore(saved));

        let state = self.state.borrow();
        debug!(
            xp = state.xp(),
            level = state.spirit_bond_level(),
            entries = state.journal().len(),
            "Progression data loaded"
        );
    }

    /// Reset all progression, including the sound preference, and delete the
    /// persisted copy.
    pub async fn reset(&mut self) {
        self.state.send_modify(|s| s.reset());

        match self.storage.remove(&self.config.storage_key).await {
            Ok(()) => debug!(key = %self.config.storage_key, "Progression data removed"),
            Err(e) => {
                error!(key = %self.config.storage_key, error = %e, "Failed to reset data")
            }
        }
    }

    async fn read(&self) -> Option<PersistedProgress> {
        let key = &self.config.storage_key;
        let blob = match self.storage.get(key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!(%key, "No stored progression data");
                return None;
            }
            Err(e) => {
                error!(%key, error = %e, "Failed to load data");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&blob) {
            Ok(Value::Object(object)) => Some(PersistedProgress::from_object(&object)),
            Ok(_) => {
                warn!(%key, "Stored progression data is not an object, ignoring it");
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "Stored progression data is corrupt, ignoring it");
                None
            }
        }
    }

    async fn write(&self, saved: &PersistedProgress) -> Result<(), PersistError> {
        let blob = serde_json::to_string(saved)?;
        self.storage.set(&self.config.storage_key, &blob).await?;
        debug!(key = %self.config.storage_key, bytes = blob.len(), "Progression data saved");
        Ok(())
    }

    async fn merge_sound(&self, enabled: bool) -> Result<(), PersistError> {
        let key = &self.config.storage_key;
        let mut data = match self.storage.get(key).await? {
            Some(blob) => match serde_json::from_str::<Value>(&blob) {
                Ok(Value::Object(map)) => map,
                _ => {
                    warn!(%key, "Stored progression data is not an object, replacing it");
                    Map::new()
                }
            },
            None => Map::new(),
        };

        data.insert("soundEnabled".to_string(), Value::Bool(enabled));
        let blob = serde_json::to_string(&data)?;
        self.storage.set(key, &blob).await?;
        debug!(%key, enabled, "Sound setting saved");
        Ok(())
    }
}
