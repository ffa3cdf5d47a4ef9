//! Recovery reconciliation.
//!
//! Combines the registration progress, the draft map, and the last-activity
//! marker into one answer: can we offer the user a recovery, and of what.
//! Each source is read independently and may be missing or expired.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kv_store::KeyValueStorage;
use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::drafts::DraftStore;
use crate::keys::StorageKey;
use crate::progress::{ProgressSnapshot, ProgressStore, RegistrationProgress, WizardStep};
use crate::store::TtlStore;

/// What is available to recover. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySummary {
    pub has_registration_data: bool,
    pub registration_progress: Option<ProgressSnapshot>,
    /// Ids of live form drafts, sorted.
    pub form_drafts: Vec<String>,
    pub last_activity: Option<DateTime<Utc>>,
    /// `has_registration_data || !form_drafts.is_empty()`.
    pub can_recover: bool,
}

/// Wizard state handed back to the caller for rehydration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredRegistration {
    pub form_data: Value,
    pub step: WizardStep,
    pub last_updated: DateTime<Utc>,
}

impl RecoveredRegistration {
    fn from_progress(progress: RegistrationProgress) -> Option<Self> {
        let step = progress.step().ok()?;
        Some(Self {
            form_data: progress.form_data,
            step,
            last_updated: progress.last_updated,
        })
    }
}

pub struct Recovery<S> {
    store: TtlStore<S>,
    progress: ProgressStore<S>,
    drafts: Arc<DraftStore<S>>,
}

impl<S: KeyValueStorage> Recovery<S> {
    pub fn new(store: TtlStore<S>, progress: ProgressStore<S>, drafts: Arc<DraftStore<S>>) -> Self {
        Self {
            store,
            progress,
            drafts,
        }
    }

    /// Read-only; repeated calls without writes in between agree, unless a
    /// record expires between them.
    pub async fn reconcile(&self) -> RecoverySummary {
        let registration = self.progress.get_registration_data().await;
        let registration_progress = match &registration {
            Some(progress) => progress.step().ok().map(ProgressSnapshot::from),
            None => self.progress.get_progress().await,
        };
        let form_drafts = self.drafts.draft_ids().await;
        let last_activity = self.store.last_activity().await;

        let has_registration_data = registration.is_some();
        let can_recover = has_registration_data || !form_drafts.is_empty();

        RecoverySummary {
            has_registration_data,
            registration_progress,
            form_drafts,
            last_activity,
            can_recover,
        }
    }

    /// Saved wizard state for rehydration. The stored records stay in place,
    /// so backing out of a recovery and coming back still works.
    pub async fn recover(&self) -> Option<RecoveredRegistration> {
        let progress = self.progress.get_registration_data().await?;
        let recovered = RecoveredRegistration::from_progress(progress)?;
        info!(
            "[recover] Recovering registration at step {}/{}",
            recovered.step.current(),
            recovered.step.total()
        );
        Some(recovered)
    }

    /// Drop everything this subsystem stored.
    pub async fn discard(&self) {
        self.store.clear_all(&StorageKey::ALL).await;
        info!("[discard] Recovery data discarded");
    }
}
