use kv_store::StorageError;

use crate::keys::StorageKey;

/// Errors raised inside the draft store layers.
///
/// Storage-facing public entry points never return these to callers; they
/// log and degrade to "nothing saved" instead. The variants surface through
/// constructors that validate caller input and through
/// [`SaveHandler::on_error`](crate::autosave::SaveHandler::on_error).
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TTL must be a positive number of hours, got {0}")]
    InvalidTtl(f64),
    #[error("Wizard step {current} is outside 1..={total}")]
    InvalidStep { current: u32, total: u32 },
    #[error("Record for {0} was not persisted")]
    NotPersisted(StorageKey),
}
