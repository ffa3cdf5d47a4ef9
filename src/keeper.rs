//! One handle over everything the draft subsystem stores.

use std::sync::Arc;

use kv_store::KeyValueStorage;

use crate::autosave::{AutoSaveConfig, AutoSaver, DraftTarget, SaveHandler};
use crate::clock::{Clock, SystemClock};
use crate::config::DraftConfig;
use crate::drafts::DraftStore;
use crate::error::DraftError;
use crate::progress::ProgressStore;
use crate::recovery::Recovery;
use crate::store::TtlStore;
use crate::wizard::RegistrationWizard;

/// Owns the shared stores over one device storage and hands out recovery,
/// wizard, and auto-save handles that all go through them.
///
/// Every auto-saver created here writes through the same [`DraftStore`], so
/// concurrent forms cannot overwrite each other's drafts.
pub struct DraftKeeper<S> {
    store: TtlStore<S>,
    progress: ProgressStore<S>,
    drafts: Arc<DraftStore<S>>,
    autosave: AutoSaveConfig,
}

impl<S: KeyValueStorage> DraftKeeper<S> {
    pub fn new(storage: Arc<S>, config: &DraftConfig) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock), config)
    }

    pub fn with_clock(storage: Arc<S>, clock: Arc<dyn Clock>, config: &DraftConfig) -> Self {
        let store = TtlStore::with_clock(storage, clock).with_default_ttl(config.ttl);
        Self {
            progress: ProgressStore::new(store.clone()),
            drafts: Arc::new(DraftStore::new(store.clone())),
            store,
            autosave: config.autosave,
        }
    }

    pub fn store(&self) -> &TtlStore<S> {
        &self.store
    }

    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    pub fn drafts(&self) -> &Arc<DraftStore<S>> {
        &self.drafts
    }

    pub fn recovery(&self) -> Recovery<S> {
        Recovery::new(self.store.clone(), self.progress.clone(), Arc::clone(&self.drafts))
    }

    pub fn wizard(&self, total_steps: u32) -> Result<Arc<RegistrationWizard<S>>, DraftError> {
        RegistrationWizard::new(self.store.clone(), self.progress.clone(), total_steps).map(Arc::new)
    }

    /// Auto-saver for the named draft `form_id`. Call `start` to run it.
    pub fn draft_autosaver<H: SaveHandler + 'static>(
        &self,
        form_id: &str,
        handler: Arc<H>,
    ) -> AutoSaver<DraftTarget<S>, H> {
        let target = Arc::new(DraftTarget::new(Arc::clone(&self.drafts), form_id));
        AutoSaver::new(target, handler, self.autosave)
    }

    /// Auto-saver that persists edits within the wizard's current step.
    pub fn wizard_autosaver<H: SaveHandler + 'static>(
        &self,
        wizard: Arc<RegistrationWizard<S>>,
        handler: Arc<H>,
    ) -> AutoSaver<RegistrationWizard<S>, H> {
        AutoSaver::new(wizard, handler, self.autosave)
    }
}
