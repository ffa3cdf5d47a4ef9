//! Serialization boundary between typed records and the string store.
//!
//! Every value written by this crate goes through [`encode_record`] and comes
//! back through [`decode_record`]; nothing else touches the raw JSON.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag stamped on every record written by this version.
pub const SCHEMA_VERSION: &str = "1.0";

/// Envelope persisted under every key.
///
/// Timestamps are epoch milliseconds on the wire so records written by
/// earlier app releases keep decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord<T> {
    pub data: T,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    pub schema_version: String,
}

impl<T> StorageRecord<T> {
    /// Wrap `data` saved at `saved_at`, living for `ttl`.
    pub fn new(data: T, saved_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            saved_at,
            expires_at: saved_at + ttl,
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    /// A record is expired once `now` is strictly past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

pub fn encode_record<T: Serialize>(record: &StorageRecord<T>) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

pub fn decode_record<T: DeserializeOwned>(raw: &str) -> Result<StorageRecord<T>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Stable serialization of `value` used to detect "nothing changed".
///
/// Object keys are sorted recursively, so two values that compare equal
/// always produce the same signature regardless of insertion order.
pub fn content_signature<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&canonicalize(value))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
