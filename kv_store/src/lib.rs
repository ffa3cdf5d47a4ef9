//! Device-local key-value storage.
//!
//! String keys, string values, every operation asynchronous. Callers that
//! need structure on top (JSON envelopes, expiry) layer it themselves; this
//! crate only moves strings in and out of a backend.

mod error;
mod file;
mod memory;
mod storage;

pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use storage::KeyValueStorage;
