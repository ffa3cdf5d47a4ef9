//! Registration wizard controller glue.
//!
//! Holds the live step and form payload of the multi-step vendor
//! registration and persists them on every step transition. It also acts
//! as a [`SaveTarget`] so an [`AutoSaver`](crate::autosave::AutoSaver) can
//! save edits made within a step.

use async_trait::async_trait;
use kv_store::KeyValueStorage;
use log::{info, warn};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::autosave::SaveTarget;
use crate::error::DraftError;
use crate::keys::StorageKey;
use crate::progress::{ProgressStore, WizardStep};
use crate::recovery::RecoveredRegistration;
use crate::store::TtlStore;

#[derive(Debug, Clone)]
struct WizardState {
    step: WizardStep,
    form_data: Map<String, Value>,
}

pub struct RegistrationWizard<S> {
    store: TtlStore<S>,
    progress: ProgressStore<S>,
    first_step: WizardStep,
    state: RwLock<WizardState>,
}

impl<S: KeyValueStorage> RegistrationWizard<S> {
    /// A fresh wizard on step 1 of `total_steps`.
    pub fn new(store: TtlStore<S>, progress: ProgressStore<S>, total_steps: u32) -> Result<Self, DraftError> {
        let first_step = WizardStep::first(total_steps)?;
        Ok(Self {
            store,
            progress,
            first_step,
            state: RwLock::new(WizardState {
                step: first_step,
                form_data: Map::new(),
            }),
        })
    }

    pub async fn step(&self) -> WizardStep {
        self.state.read().await.step
    }

    pub async fn form_data(&self) -> Value {
        Value::Object(self.state.read().await.form_data.clone())
    }

    /// Persist step 1 with an empty payload.
    pub async fn start(&self) -> bool {
        let (form_data, step) = self.snapshot().await;
        self.progress.save_progress(form_data, step).await
    }

    /// Rehydrate from a recovery offer the user accepted.
    pub async fn resume(&self, recovered: RecoveredRegistration) -> Result<WizardStep, DraftError> {
        let step = WizardStep::new(recovered.step.current(), self.first_step.total())?;
        let form_data = match recovered.form_data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                warn!("[resume] Ignoring non-object form data: {other}");
                Map::new()
            }
        };
        let mut state = self.state.write().await;
        state.step = step;
        state.form_data = form_data;
        info!("[resume] Resumed at step {}/{}", step.current(), step.total());
        Ok(step)
    }

    /// Rehydrate from whatever is stored, if anything.
    pub async fn resume_saved(&self) -> Option<WizardStep> {
        let saved = self.progress.get_registration_data().await?;
        let step = saved.step().ok()?;
        let recovered = RecoveredRegistration {
            form_data: saved.form_data,
            step,
            last_updated: saved.last_updated,
        };
        self.resume(recovered).await.ok()
    }

    /// Merge `patch` into the in-memory payload. Returns the merged payload,
    /// ready to hand to an auto-saver.
    pub async fn update_fields(&self, patch: Map<String, Value>) -> Value {
        let mut state = self.state.write().await;
        state.form_data.extend(patch);
        Value::Object(state.form_data.clone())
    }

    /// Merge `patch`, advance one step and persist. Stays on the last step.
    pub async fn next_step(&self, patch: Map<String, Value>) -> WizardStep {
        {
            let mut state = self.state.write().await;
            state.form_data.extend(patch);
            state.step = state.step.next();
        }
        self.persist("next_step").await
    }

    pub async fn previous_step(&self) -> WizardStep {
        {
            let mut state = self.state.write().await;
            state.step = state.step.previous();
        }
        self.persist("previous_step").await
    }

    pub async fn go_to_step(&self, current: u32) -> Result<WizardStep, DraftError> {
        let step = WizardStep::new(current, self.first_step.total())?;
        self.state.write().await.step = step;
        Ok(self.persist("go_to_step").await)
    }

    /// Registration submitted: everything staged for it is dropped.
    pub async fn finish(&self) {
        self.store.clear_all(&StorageKey::ALL).await;
        info!("[finish] Registration complete, drafts cleared");
    }

    /// Throw away stored and in-memory progress and return to step 1.
    pub async fn discard(&self) {
        self.store.clear_all(&StorageKey::ALL).await;
        let mut state = self.state.write().await;
        state.step = self.first_step;
        state.form_data.clear();
        info!("[discard] Registration progress discarded");
    }

    async fn snapshot(&self) -> (Value, WizardStep) {
        let state = self.state.read().await;
        (Value::Object(state.form_data.clone()), state.step)
    }

    /// Saves never block navigation; a failure is logged and the step stands.
    async fn persist(&self, operation: &str) -> WizardStep {
        let (form_data, step) = self.snapshot().await;
        if !self.progress.save_progress(form_data, step).await {
            warn!("[{operation}] Progress for step {} not saved", step.current());
        }
        step
    }
}

#[async_trait]
impl<S: KeyValueStorage> SaveTarget for RegistrationWizard<S> {
    /// Merges `data` into the live payload and persists the result at the
    /// current step. Fields added by a step transition after `data` was
    /// captured are kept.
    async fn write(&self, data: &Value) -> Result<(), DraftError> {
        let (form_data, step) = {
            let mut state = self.state.write().await;
            match data {
                Value::Object(map) => state
                    .form_data
                    .extend(map.iter().map(|(k, v)| (k.clone(), v.clone()))),
                other => warn!("[write] Ignoring non-object form data: {other}"),
            }
            (Value::Object(state.form_data.clone()), state.step)
        };
        if self.progress.save_progress(form_data, step).await {
            Ok(())
        } else {
            Err(DraftError::NotPersisted(StorageKey::RegistrationData))
        }
    }

    async fn load(&self) -> Option<Value> {
        self.progress
            .get_registration_data()
            .await
            .map(|progress| progress.form_data)
    }

    async fn clear(&self) {
        self.progress.clear().await;
    }
}
