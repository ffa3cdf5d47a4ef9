//! Named form drafts multiplexed into a single storage record.
//!
//! All drafts live in one [`DraftMap`] under [`StorageKey::FormDrafts`], so
//! the number of keys this subsystem claims stays fixed and a bulk cleanup
//! is one delete. Every write rewrites the whole map.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kv_store::KeyValueStorage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::DraftError;
use crate::keys::StorageKey;
use crate::store::TtlStore;

/// One form's saved state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub data: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

/// Form id → draft. Ordered so listings are deterministic.
pub type DraftMap = BTreeMap<String, DraftEntry>;

/// Read-modify-write access to the shared draft map.
///
/// Writers going through the same `DraftStore` are serialized, so one form's
/// save cannot erase another's. Two `DraftStore`s over the same storage do
/// not coordinate; share one handle.
pub struct DraftStore<S> {
    store: TtlStore<S>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStorage> DraftStore<S> {
    pub fn new(store: TtlStore<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Current map, or empty if absent, expired, or unreadable.
    pub async fn load_map(&self) -> DraftMap {
        self.store
            .get::<DraftMap>(StorageKey::FormDrafts)
            .await
            .unwrap_or_default()
    }

    /// Current map for a rewrite. A storage read failure is an error, never
    /// an empty map.
    async fn load_map_for_write(&self) -> Result<DraftMap, DraftError> {
        Ok(self
            .store
            .try_get::<DraftMap>(StorageKey::FormDrafts)
            .await?
            .unwrap_or_default())
    }

    /// Store `data` as the draft for `form_id`, replacing any previous one.
    ///
    /// Returns `false` if the map could not be read or written.
    pub async fn save_draft(&self, form_id: &str, data: Value) -> bool {
        match self.try_save_draft(form_id, data).await {
            Ok(()) => true,
            Err(e) => {
                warn!("[save_draft] Draft {form_id} not saved: {e}");
                false
            }
        }
    }

    /// Like [`save_draft`](Self::save_draft) but hands back the cause.
    pub async fn try_save_draft(&self, form_id: &str, data: Value) -> Result<(), DraftError> {
        let _serial = self.write_lock.lock().await;
        let mut map = self.load_map_for_write().await?;
        map.insert(
            form_id.to_string(),
            DraftEntry {
                data,
                last_updated: self.store.now(),
            },
        );
        self.store.try_save(StorageKey::FormDrafts, &map).await?;
        debug!("[save_draft] {form_id} saved ({} drafts)", map.len());
        self.store.mark_activity().await;
        Ok(())
    }

    pub async fn get_draft(&self, form_id: &str) -> Option<Value> {
        self.get_draft_entry(form_id).await.map(|entry| entry.data)
    }

    pub async fn get_draft_entry(&self, form_id: &str) -> Option<DraftEntry> {
        self.load_map().await.remove(form_id)
    }

    /// Drop the draft for `form_id`. Absent ids are a no-op. If the map
    /// cannot be read, nothing is rewritten.
    pub async fn remove_draft(&self, form_id: &str) {
        let _serial = self.write_lock.lock().await;
        let mut map = match self.load_map_for_write().await {
            Ok(map) => map,
            Err(e) => {
                warn!("[remove_draft] Leaving drafts untouched, read failed: {e}");
                return;
            }
        };
        if map.remove(form_id).is_none() {
            debug!("[remove_draft] No draft for {form_id}");
            return;
        }
        if map.is_empty() {
            self.store.remove(StorageKey::FormDrafts).await;
        } else if !self.store.save(StorageKey::FormDrafts, &map).await {
            return;
        }
        info!("[remove_draft] {form_id} removed");
    }

    /// Ids of every live draft, sorted.
    pub async fn draft_ids(&self) -> Vec<String> {
        self.load_map().await.into_keys().collect()
    }

    pub async fn clear_drafts(&self) {
        let _serial = self.write_lock.lock().await;
        self.store.remove(StorageKey::FormDrafts).await;
    }
}
