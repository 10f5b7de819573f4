//! Testing utilities.
//!
//! - `FailingStorage` for exercising the store's failure paths
//! - `FixedClock` for deterministic timestamps
//! - `sample_encounter` for building journal entries

use crate::clock::Clock;
use crate::encounter::{Encounter, EncounterType};
use crate::storage::{MemoryStorage, Storage, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory storage whose reads, writes and deletes can be made to fail.
#[derive(Debug, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    writes: AtomicUsize,
}

impl FailingStorage {
    /// Storage that succeeds until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage where every operation fails.
    pub fn broken() -> Self {
        let storage = Self::new();
        storage.set_fail_reads(true);
        storage.set_fail_writes(true);
        storage.set_fail_deletes(true);
        storage
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn injected(op: &str) -> io::Error {
        io::Error::other(format!("injected {op} failure"))
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Read {
                key: key.to_string(),
                source: Self::injected("read"),
            });
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                key: key.to_string(),
                source: Self::injected("write"),
            });
        }
        self.inner.set(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete {
                key: key.to_string(),
                source: Self::injected("delete"),
            });
        }
        self.inner.remove(key).await
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Noon on 1 January 2024.
    pub fn epoch() -> Self {
        Self::new(DateTime::<Utc>::from_timestamp(1_704_110_400, 0).unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// An uncompleted encounter of the given type and reward.
pub fn sample_encounter(encounter_type: EncounterType, xp_earned: u32) -> Encounter {
    Encounter {
        id: Uuid::new_v4().to_string(),
        spirit_name: format!("Test {encounter_type} Spirit"),
        encounter_type,
        task: "Sit with the test for a moment.".to_string(),
        reward: "Test Token".to_string(),
        date: Utc::now(),
        personal_note: None,
        completed: false,
        xp_earned,
    }
}
