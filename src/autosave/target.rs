use std::sync::Arc;

use async_trait::async_trait;
use kv_store::KeyValueStorage;
use serde_json::Value;

use crate::drafts::DraftStore;
use crate::error::DraftError;

/// Backing write path for an [`AutoSaver`](super::AutoSaver).
#[async_trait]
pub trait SaveTarget: Send + Sync {
    /// Persist `data`.
    async fn write(&self, data: &Value) -> Result<(), DraftError>;

    /// Previously persisted data, if any is still live.
    async fn load(&self) -> Option<Value>;

    /// Forget whatever was persisted.
    async fn clear(&self);
}

/// Saves into one named slot of the shared draft map.
pub struct DraftTarget<S> {
    drafts: Arc<DraftStore<S>>,
    form_id: String,
}

impl<S> DraftTarget<S> {
    pub fn new(drafts: Arc<DraftStore<S>>, form_id: impl Into<String>) -> Self {
        Self {
            drafts,
            form_id: form_id.into(),
        }
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }
}

#[async_trait]
impl<S: KeyValueStorage> SaveTarget for DraftTarget<S> {
    async fn write(&self, data: &Value) -> Result<(), DraftError> {
        self.drafts.try_save_draft(&self.form_id, data.clone()).await
    }

    async fn load(&self) -> Option<Value> {
        self.drafts.get_draft(&self.form_id).await
    }

    async fn clear(&self) {
        self.drafts.remove_draft(&self.form_id).await;
    }
}
