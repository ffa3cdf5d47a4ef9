//! Backend-agnostic key-value storage interface.

use std::future::Future;

use crate::StorageError;

/// Asynchronous string key-value store shared across the whole app.
///
/// Implementations must be `Send + Sync`. Internal synchronization is the
/// implementation's responsibility; two calls on the same key are never
/// required to be ordered unless the caller awaits the first one.
pub trait KeyValueStorage: Send + Sync + 'static {
    /// Read the raw value stored under `key`, `None` if absent.
    fn get_item(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove several keys. The default removes them one by one and stops at
    /// the first failure.
    fn multi_remove(&self, keys: &[&str]) -> impl Future<Output = Result<(), StorageError>> + Send {
        async move {
            for key in keys {
                self.remove_item(key).await?;
            }
            Ok(())
        }
    }
}
