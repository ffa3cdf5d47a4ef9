use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;

use crate::error::DraftError;

/// Receives the outcome of every auto-save that actually wrote (or tried to).
///
/// Skipped saves (unchanged content) produce no callback. Panics inside a
/// handler are not caught by the scheduler.
#[async_trait]
pub trait SaveHandler: Send + Sync {
    /// Called after `data` was persisted.
    async fn on_save(&self, data: &Value);

    /// Called when a write failed. The next tick retries.
    async fn on_error(&self, error: &DraftError);
}

/// Handler that only logs; stands in for a toast service.
#[derive(Debug, Clone)]
pub struct LogSaveHandler {
    label: String,
}

impl LogSaveHandler {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[async_trait]
impl SaveHandler for LogSaveHandler {
    async fn on_save(&self, _data: &Value) {
        info!("[on_save] {} draft saved", self.label);
    }

    async fn on_error(&self, error: &DraftError) {
        warn!("[on_error] {} draft not saved, will retry: {error}", self.label);
    }
}
