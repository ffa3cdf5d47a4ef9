/// Errors originating from a key-value backend.
///
/// `Unavailable` carries backend-specific text (quota, permissions, a
/// platform bridge that is not ready). Callers should treat it as opaque
/// diagnostic text, not match on its content.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
