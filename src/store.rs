//! TTL key-value store: typed save/get/remove over a string backend.
//!
//! Every record carries its own expiry. Expired or unreadable records are
//! evicted lazily when read; there is no background sweep.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kv_store::KeyValueStorage;
use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::codec::{decode_record, encode_record, StorageRecord};
use crate::error::DraftError;
use crate::keys::StorageKey;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
/// Upper bound keeps `saved_at + ttl` far away from chrono's range limits.
const MAX_TTL_HOURS: f64 = 24.0 * 365.0 * 100.0;

/// How long a record stays readable after it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ttl(Duration);

impl Ttl {
    pub const DEFAULT_HOURS: f64 = 24.0;

    /// Build a TTL from fractional hours (`0.0001` is 360 ms).
    pub fn from_hours(hours: f64) -> Result<Self, DraftError> {
        if !hours.is_finite() || hours <= 0.0 || hours > MAX_TTL_HOURS {
            return Err(DraftError::InvalidTtl(hours));
        }
        let millis = (hours * MILLIS_PER_HOUR).round();
        if millis < 1.0 {
            return Err(DraftError::InvalidTtl(hours));
        }
        Ok(Self(Duration::milliseconds(millis as i64)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_hours(&self) -> f64 {
        self.0.num_milliseconds() as f64 / MILLIS_PER_HOUR
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Self(Duration::hours(24))
    }
}

/// Typed, expiring view over a [`KeyValueStorage`].
///
/// Public operations never fail: storage errors are logged and the store
/// behaves as if nothing was ever saved.
pub struct TtlStore<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    default_ttl: Ttl,
}

impl<S> Clone for TtlStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            clock: Arc::clone(&self.clock),
            default_ttl: self.default_ttl,
        }
    }
}

impl<S: KeyValueStorage> TtlStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            default_ttl: Ttl::default(),
        }
    }

    /// Replace the TTL used by [`save`](Self::save).
    pub fn with_default_ttl(mut self, ttl: Ttl) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn default_ttl(&self) -> Ttl {
        self.default_ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Save `data` under `key` with the default TTL.
    ///
    /// Returns `false` if the write failed; the failure is logged.
    pub async fn save<T>(&self, key: StorageKey, data: &T) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        self.save_with_ttl(key, data, self.default_ttl).await
    }

    pub async fn save_with_ttl<T>(&self, key: StorageKey, data: &T, ttl: Ttl) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        match self.try_save_with_ttl(key, data, ttl).await {
            Ok(expires_at) => {
                debug!("[save] {key} saved, expires at {expires_at}");
                true
            }
            Err(e) => {
                warn!("[save] Failed to save {key}: {e}");
                false
            }
        }
    }

    /// Write with the default TTL, returning the error instead of logging it.
    pub async fn try_save<T>(&self, key: StorageKey, data: &T) -> Result<DateTime<Utc>, DraftError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.try_save_with_ttl(key, data, self.default_ttl).await
    }

    async fn try_save_with_ttl<T>(&self, key: StorageKey, data: &T, ttl: Ttl) -> Result<DateTime<Utc>, DraftError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let record = StorageRecord::new(data, self.now(), ttl.as_duration());
        let raw = encode_record(&record)?;
        self.storage.set_item(key.as_str(), raw).await?;
        Ok(record.expires_at)
    }

    /// Read the payload stored under `key`.
    ///
    /// Absent, expired, and unreadable records all come back as `None`; the
    /// latter two are deleted on the way.
    pub async fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        self.get_record(key).await.map(|record| record.data)
    }

    /// Like [`get`](Self::get) but keeps the envelope timestamps.
    pub async fn get_record<T: DeserializeOwned>(&self, key: StorageKey) -> Option<StorageRecord<T>> {
        match self.try_get_record(key).await {
            Ok(record) => record,
            Err(e) => {
                warn!("[get] Failed to read {key}: {e}");
                None
            }
        }
    }

    /// Read that tells a failing backend apart from "nothing stored".
    ///
    /// Absent, expired, and unreadable records are `Ok(None)`; only an error
    /// from the storage itself is `Err`. Read-modify-write cycles go through
    /// this: a failed read must never be rewritten as an empty record.
    pub async fn try_get<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>, DraftError> {
        Ok(self.try_get_record(key).await?.map(|record| record.data))
    }

    pub async fn try_get_record<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<StorageRecord<T>>, DraftError> {
        let Some(raw) = self.storage.get_item(key.as_str()).await? else {
            debug!("[get] {key} not found");
            return Ok(None);
        };

        let record = match decode_record::<T>(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("[get] Discarding unreadable {key}: {e}");
                self.remove(key).await;
                return Ok(None);
            }
        };

        if record.is_expired(self.now()) {
            info!("[get] {key} expired at {}, evicting", record.expires_at);
            self.remove(key).await;
            return Ok(None);
        }

        debug!("[get] {key} loaded, saved at {}", record.saved_at);
        Ok(Some(record))
    }

    /// Best-effort delete.
    pub async fn remove(&self, key: StorageKey) {
        match self.storage.remove_item(key.as_str()).await {
            Ok(()) => debug!("[remove] {key} removed"),
            Err(e) => warn!("[remove] Failed to remove {key}: {e}"),
        }
    }

    /// Bulk-remove `keys`, used for "start fresh".
    pub async fn clear_all(&self, keys: &[StorageKey]) {
        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        match self.storage.multi_remove(&names).await {
            Ok(()) => info!("[clear_all] Removed {}", names.join(", ")),
            Err(e) => warn!("[clear_all] Failed to remove {}: {e}", names.join(", ")),
        }
    }

    /// Record "the user did something now" under the last-activity key.
    pub async fn mark_activity(&self) -> bool {
        let now = self.now();
        self.save(StorageKey::LastActivity, &now).await
    }

    pub async fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.get(StorageKey::LastActivity).await
    }
}
