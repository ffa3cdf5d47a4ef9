#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use draft_recovery::{
    DraftConfig, DraftError, DraftKeeper, KeyValueStorage, ManualClock, MemoryStorage,
    SaveHandler, StorageError,
};

/// Memory storage that can be told to fail, and counts writes per key.
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: Mutex<HashMap<String, usize>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful writes to `key` so far.
    pub fn write_count(&self, key: &str) -> usize {
        self.writes.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.contains(key).await
    }
}

impl KeyValueStorage for FlakyStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("read refused".to_string()));
        }
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set_item(key, value).await?;
        *self.writes.lock().unwrap().entry(key.to_string()).or_default() += 1;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key).await
    }
}

/// Collects save callbacks.
#[derive(Default)]
pub struct RecordingHandler {
    saved: Mutex<Vec<Value>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn saved(&self) -> Vec<Value> {
        self.saved.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl SaveHandler for RecordingHandler {
    async fn on_save(&self, data: &Value) {
        self.saved.lock().unwrap().push(data.clone());
    }

    async fn on_error(&self, error: &DraftError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
    ))
}

pub fn keeper_with(
    storage: Arc<FlakyStorage>,
    clock: Arc<ManualClock>,
    config: &DraftConfig,
) -> DraftKeeper<FlakyStorage> {
    DraftKeeper::with_clock(storage, clock, config)
}

/// A keeper over fresh flaky storage with a fixed clock and default config.
pub fn new_keeper() -> (DraftKeeper<FlakyStorage>, Arc<FlakyStorage>, Arc<ManualClock>) {
    let storage = Arc::new(FlakyStorage::new());
    let clock = test_clock();
    let keeper = keeper_with(Arc::clone(&storage), Arc::clone(&clock), &DraftConfig::default());
    (keeper, storage, clock)
}
