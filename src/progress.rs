//! Multi-step registration wizard progress.
//!
//! Two records are kept: the full [`RegistrationProgress`] (form payload and
//! step counters) and a small [`ProgressSnapshot`] that progress indicators
//! can read without decoding the payload. They are written one after the
//! other; a crash in between leaves them briefly out of step, which readers
//! tolerate.

use chrono::{DateTime, Utc};
use kv_store::KeyValueStorage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DraftError;
use crate::keys::StorageKey;
use crate::store::TtlStore;

/// A wizard position, always within `1..=total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WizardStep {
    current: u32,
    total: u32,
}

impl WizardStep {
    pub fn new(current: u32, total: u32) -> Result<Self, DraftError> {
        if current == 0 || current > total {
            return Err(DraftError::InvalidStep { current, total });
        }
        Ok(Self { current, total })
    }

    /// Step 1 of `total`.
    pub fn first(total: u32) -> Result<Self, DraftError> {
        Self::new(1, total)
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    /// The following step, staying on the last one.
    pub fn next(self) -> Self {
        Self {
            current: (self.current + 1).min(self.total),
            ..self
        }
    }

    /// The preceding step, staying on the first one.
    pub fn previous(self) -> Self {
        Self {
            current: self.current.saturating_sub(1).max(1),
            ..self
        }
    }

    /// `round(current / total * 100)`.
    pub fn percentage(&self) -> u8 {
        (f64::from(self.current) / f64::from(self.total) * 100.0).round() as u8
    }
}

/// Full wizard state as persisted under [`StorageKey::RegistrationData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationProgress {
    pub form_data: Value,
    pub current_step: u32,
    pub total_steps: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl RegistrationProgress {
    /// Validated step counters.
    pub fn step(&self) -> Result<WizardStep, DraftError> {
        WizardStep::new(self.current_step, self.total_steps)
    }
}

/// Step counters only, persisted under [`StorageKey::RegistrationProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current_step: u32,
    pub total_steps: u32,
    pub percentage: u8,
}

impl From<WizardStep> for ProgressSnapshot {
    fn from(step: WizardStep) -> Self {
        Self {
            current_step: step.current(),
            total_steps: step.total(),
            percentage: step.percentage(),
        }
    }
}

pub struct ProgressStore<S> {
    store: TtlStore<S>,
}

impl<S> Clone for ProgressStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: KeyValueStorage> ProgressStore<S> {
    pub fn new(store: TtlStore<S>) -> Self {
        Self { store }
    }

    /// Persist the wizard's form payload at `step`.
    ///
    /// Returns `true` only if both records were written.
    pub async fn save_progress(&self, form_data: Value, step: WizardStep) -> bool {
        let progress = RegistrationProgress {
            form_data,
            current_step: step.current(),
            total_steps: step.total(),
            last_updated: self.store.now(),
        };

        if !self.store.save(StorageKey::RegistrationData, &progress).await {
            return false;
        }
        self.store.mark_activity().await;

        let snapshot = ProgressSnapshot::from(step);
        let saved = self
            .store
            .save(StorageKey::RegistrationProgress, &snapshot)
            .await;
        debug!(
            "[save_progress] Step {}/{} ({}%)",
            snapshot.current_step, snapshot.total_steps, snapshot.percentage
        );
        saved
    }

    pub async fn get_registration_data(&self) -> Option<RegistrationProgress> {
        let progress: RegistrationProgress = self.store.get(StorageKey::RegistrationData).await?;
        match progress.step() {
            Ok(_) => Some(progress),
            Err(e) => {
                warn!("[get_registration_data] Discarding stored progress: {e}");
                self.clear().await;
                None
            }
        }
    }

    /// Step counters from the projection record. The percentage is
    /// recomputed from the counters rather than trusted.
    pub async fn get_progress(&self) -> Option<ProgressSnapshot> {
        let stored: ProgressSnapshot = self.store.get(StorageKey::RegistrationProgress).await?;
        match WizardStep::new(stored.current_step, stored.total_steps) {
            Ok(step) => Some(ProgressSnapshot::from(step)),
            Err(e) => {
                warn!("[get_progress] Discarding stored progress: {e}");
                self.store.remove(StorageKey::RegistrationProgress).await;
                None
            }
        }
    }

    /// Remove both progress records.
    pub async fn clear(&self) {
        self.store
            .clear_all(&[StorageKey::RegistrationData, StorageKey::RegistrationProgress])
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_bounds() {
        assert!(WizardStep::new(1, 1).is_ok());
        assert!(WizardStep::new(8, 8).is_ok());
        assert!(matches!(
            WizardStep::new(0, 8),
            Err(DraftError::InvalidStep { current: 0, total: 8 })
        ));
        assert!(WizardStep::new(9, 8).is_err());
        assert!(WizardStep::first(0).is_err());
    }

    #[test]
    fn test_step_navigation_saturates() {
        let first = WizardStep::first(3).unwrap();
        assert_eq!(first.previous(), first);

        let last = first.next().next();
        assert!(last.is_last());
        assert_eq!(last.next(), last);
        assert_eq!(last.previous().current(), 2);
    }

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(WizardStep::new(3, 8).unwrap().percentage(), 38);
        assert_eq!(WizardStep::new(1, 3).unwrap().percentage(), 33);
        assert_eq!(WizardStep::new(2, 3).unwrap().percentage(), 67);
        assert_eq!(WizardStep::new(8, 8).unwrap().percentage(), 100);
    }
}
