//! Local persistent drafts with time-boxed recovery.
//!
//! Stages unsubmitted form state in a device key-value store so a long
//! vendor-registration wizard (and other forms) survives restarts, crashes,
//! and process kills.
//!
//! # Layers
//!
//! - [`TtlStore`] - typed save/get/remove with per-record expiry
//! - [`DraftStore`] - named form drafts kept in one record
//! - [`ProgressStore`] - wizard step counters plus form payload
//! - [`AutoSaver`] - debounced and periodic saves, skipping unchanged content
//! - [`Recovery`] - "can we offer recovery, and of what"
//! - [`RegistrationWizard`] - wizard controller glue
//! - [`DraftKeeper`] - one handle wiring the above over a single storage
//!
//! Storage failures never reach callers: writes report `false`, reads
//! report `None`, and everything is logged.
//!
//! ```ignore
//! let storage = Arc::new(FileStorage::open(&config.storage_dir).await?);
//! let keeper = DraftKeeper::new(storage, &config);
//!
//! let summary = keeper.recovery().reconcile().await;
//! if summary.can_recover {
//!     // offer recovery, then either
//!     let recovered = keeper.recovery().recover().await;
//!     // or
//!     keeper.recovery().discard().await;
//! }
//! ```

pub mod autosave;
pub mod clock;
pub mod codec;
pub mod config;
pub mod drafts;
pub mod error;
pub mod keeper;
pub mod keys;
pub mod progress;
pub mod recovery;
pub mod store;
pub mod wizard;

pub use autosave::{
    AutoSaveConfig, AutoSaver, DraftTarget, LogSaveHandler, SaveHandler, SaveOutcome, SaveState,
    SaveTarget,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{content_signature, StorageRecord, SCHEMA_VERSION};
pub use config::DraftConfig;
pub use drafts::{DraftEntry, DraftMap, DraftStore};
pub use error::DraftError;
pub use keeper::DraftKeeper;
pub use keys::StorageKey;
pub use progress::{ProgressSnapshot, ProgressStore, RegistrationProgress, WizardStep};
pub use recovery::{RecoveredRegistration, Recovery, RecoverySummary};
pub use store::{Ttl, TtlStore};
pub use wizard::RegistrationWizard;

pub use kv_store::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
