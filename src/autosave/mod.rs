//! Auto-save for in-progress forms.
//!
//! An [`AutoSaver`] watches a form's data and writes it to a [`SaveTarget`]
//! after edits quiet down (debounce) and on a fixed interval (backstop
//! against continuous typing). Identical content is never written twice.
//!
//! - [`SaveState`] - `Idle` / `Scheduled` / `Saving`
//! - [`SaveTarget`] - where saves go ([`DraftTarget`] for named drafts, or the
//!   registration wizard)
//! - [`SaveHandler`] - `on_save` / `on_error` notifications
//!
//! ```ignore
//! let saver = keeper.draft_autosaver("step3_profile", Arc::new(LogSaveHandler::new("profile")));
//! saver.start();
//! saver.update(json!({"name": "Dosa Corner"}));
//! // before navigating away
//! saver.force_save().await;
//! ```

mod handler;
mod scheduler;
mod state;
mod target;

pub use handler::{LogSaveHandler, SaveHandler};
pub use scheduler::{
    AutoSaveConfig, AutoSaver, SaveOutcome, DEFAULT_DEBOUNCE_DELAY, DEFAULT_SAVE_INTERVAL,
};
pub use state::SaveState;
pub use target::{DraftTarget, SaveTarget};
