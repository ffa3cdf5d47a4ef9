//! Debounced plus periodic auto-save scheduling.
//!
//! Each [`AutoSaver`] owns at most one debounce timer and one periodic timer.
//! Both are tokio tasks guarded by a [`CancellationToken`]; cancelling only
//! interrupts a timer while it sleeps, never a write that already started.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{SaveHandler, SaveState, SaveTarget};
use crate::codec::content_signature;
use crate::error::DraftError;

/// Default quiet period after the last edit (1 second).
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_secs(1);

/// Default forced-save period (5 seconds).
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for auto-save scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveConfig {
    /// Quiet period after the last change before a save fires.
    pub debounce_delay: Duration,
    /// Interval between forced save attempts. Zero disables the periodic timer.
    pub interval: Duration,
    /// Whether timers run at all.
    pub enabled: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            interval: DEFAULT_SAVE_INTERVAL,
            enabled: true,
        }
    }
}

/// What a save attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Data was written and `on_save` was called.
    Saved,
    /// Content matched the last successful save; nothing happened.
    Unchanged,
    /// No data has been provided yet.
    NoData,
    /// The write failed and `on_error` was called.
    Failed,
}

struct PendingDebounce {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner {
    state: SaveState,
    enabled: bool,
    current: Option<Value>,
    /// Signature of the last content known to be persisted.
    last_signature: Option<String>,
    debounce: Option<PendingDebounce>,
    periodic: Option<CancellationToken>,
    generation: u64,
}

impl Inner {
    fn cancel_debounce(&mut self) {
        if let Some(pending) = self.debounce.take() {
            pending.cancel.cancel();
        }
    }

    fn cancel_periodic(&mut self) {
        if let Some(token) = self.periodic.take() {
            token.cancel();
        }
    }

    /// Leave `Saving`: back to `Scheduled` if a debounce is still pending.
    fn settle(&mut self) {
        self.state = if self.debounce.is_some() {
            SaveState::Scheduled
        } else {
            SaveState::Idle
        };
    }
}

struct Shared<T, H> {
    target: Arc<T>,
    handler: Arc<H>,
    config: AutoSaveConfig,
    inner: Mutex<Inner>,
    /// Serializes saves and clears issued by this saver.
    save_lock: tokio::sync::Mutex<()>,
}

impl<T: SaveTarget, H: SaveHandler> Shared<T, H> {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn save(&self) -> SaveOutcome {
        let _serial = self.save_lock.lock().await;

        let prepared = {
            let mut inner = self.lock();
            let Some(data) = inner.current.clone() else {
                inner.settle();
                return SaveOutcome::NoData;
            };
            match content_signature(&data) {
                Ok(signature) if inner.last_signature.as_deref() == Some(signature.as_str()) => {
                    inner.settle();
                    debug!("[save] Content unchanged, skipping write");
                    return SaveOutcome::Unchanged;
                }
                Ok(signature) => {
                    inner.state = SaveState::Saving;
                    Ok((data, signature))
                }
                Err(e) => Err(DraftError::from(e)),
            }
        };

        let (data, signature) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.handler.on_error(&e).await;
                return SaveOutcome::Failed;
            }
        };

        let result = self.target.write(&data).await;
        {
            let mut inner = self.lock();
            if result.is_ok() {
                inner.last_signature = Some(signature);
            }
            inner.settle();
        }

        match result {
            Ok(()) => {
                debug!("[save] Draft written");
                self.handler.on_save(&data).await;
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!("[save] Draft write failed: {e}");
                self.handler.on_error(&e).await;
                SaveOutcome::Failed
            }
        }
    }

    /// Called by a debounce timer that slept its full delay.
    fn take_debounce(&self, generation: u64) {
        let mut inner = self.lock();
        if inner
            .debounce
            .as_ref()
            .is_some_and(|pending| pending.generation == generation)
        {
            inner.debounce = None;
        }
    }
}

/// Auto-save scheduler for one mounted form.
///
/// Timers need a tokio runtime; they start on [`start`](Self::start) (the
/// periodic timer) and [`update`](Self::update) (the debounce timer), and are
/// cancelled by [`shutdown`](Self::shutdown), by disabling, or on drop.
pub struct AutoSaver<T: SaveTarget + 'static, H: SaveHandler + 'static> {
    shared: Arc<Shared<T, H>>,
}

impl<T: SaveTarget + 'static, H: SaveHandler + 'static> AutoSaver<T, H> {
    pub fn new(target: Arc<T>, handler: Arc<H>, config: AutoSaveConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                target,
                handler,
                config,
                inner: Mutex::new(Inner {
                    state: SaveState::Idle,
                    enabled: config.enabled,
                    current: None,
                    last_signature: None,
                    debounce: None,
                    periodic: None,
                    generation: 0,
                }),
                save_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> AutoSaveConfig {
        self.shared.config
    }

    pub fn state(&self) -> SaveState {
        self.shared.lock().state
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.lock().enabled
    }

    /// Whether a debounce timer is currently armed.
    pub fn has_pending_debounce(&self) -> bool {
        self.shared.lock().debounce.is_some()
    }

    /// Whether the periodic timer is running.
    pub fn is_running(&self) -> bool {
        self.shared.lock().periodic.is_some()
    }

    /// Start the periodic timer. No-op if disabled or already running.
    pub fn start(&self) {
        let period = self.shared.config.interval;
        let token = {
            let mut inner = self.shared.lock();
            if !inner.enabled || inner.periodic.is_some() {
                return;
            }
            if period.is_zero() {
                debug!("[start] Periodic save disabled (zero interval)");
                return;
            }
            let token = CancellationToken::new();
            inner.periodic = Some(token.clone());
            token
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        shared.save().await;
                    }
                }
            }
            debug!("[start] Periodic save stopped");
        });
        info!("[start] Periodic save every {period:?}");
    }

    /// Record new form data and restart the debounce timer.
    pub fn update(&self, data: Value) {
        let delay = self.shared.config.debounce_delay;
        let (generation, cancel) = {
            let mut inner = self.shared.lock();
            inner.current = Some(data);
            if !inner.enabled {
                return;
            }
            inner.cancel_debounce();
            inner.generation += 1;
            let generation = inner.generation;
            let cancel = CancellationToken::new();
            inner.debounce = Some(PendingDebounce {
                generation,
                cancel: cancel.clone(),
            });
            if inner.state == SaveState::Idle {
                inner.state = SaveState::Scheduled;
            }
            (generation, cancel)
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            shared.take_debounce(generation);
            shared.save().await;
        });
    }

    /// Save the current data now if it differs from the last save.
    ///
    /// With `force_immediate`, a pending debounce is cancelled first.
    pub async fn save(&self, force_immediate: bool) -> SaveOutcome {
        if force_immediate {
            let mut inner = self.shared.lock();
            inner.cancel_debounce();
            if inner.state == SaveState::Scheduled {
                inner.state = SaveState::Idle;
            }
        }
        self.shared.save().await
    }

    /// Cancel the pending debounce and save immediately. Use before
    /// navigating away from the form.
    pub async fn force_save(&self) -> SaveOutcome {
        self.save(true).await
    }

    /// Read back what was persisted for this form.
    ///
    /// Loaded content counts as already saved, so feeding it back through
    /// [`update`](Self::update) does not trigger a write.
    pub async fn load_saved_data(&self) -> Option<Value> {
        let data = self.shared.target.load().await?;
        match content_signature(&data) {
            Ok(signature) => self.shared.lock().last_signature = Some(signature),
            Err(e) => warn!("[load_saved_data] Could not sign loaded data: {e}"),
        }
        Some(data)
    }

    /// Remove the persisted data and forget the last-saved signature.
    ///
    /// The pending debounce and the in-memory data are dropped too, so the
    /// cleared draft is not written back until the next [`update`](Self::update).
    pub async fn clear_saved_data(&self) {
        let _serial = self.shared.save_lock.lock().await;
        {
            let mut inner = self.shared.lock();
            inner.cancel_debounce();
            inner.current = None;
            inner.last_signature = None;
            inner.settle();
        }
        self.shared.target.clear().await;
    }

    /// Turn the timers on or off. Disabling cancels both.
    pub fn set_enabled(&self, enabled: bool) {
        {
            let mut inner = self.shared.lock();
            inner.enabled = enabled;
            if !enabled {
                inner.cancel_debounce();
                inner.cancel_periodic();
                inner.settle();
            }
        }
        if enabled {
            self.start();
        }
    }

    /// Cancel both timers. An in-flight write still completes.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        inner.cancel_debounce();
        inner.cancel_periodic();
        if inner.state == SaveState::Scheduled {
            inner.state = SaveState::Idle;
        }
    }
}

impl<T: SaveTarget + 'static, H: SaveHandler + 'static> Drop for AutoSaver<T, H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
