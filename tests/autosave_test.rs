mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use draft_recovery::{
    AutoSaveConfig, AutoSaver, DraftConfig, DraftTarget, SaveOutcome, SaveState, StorageKey,
};

use common::{keeper_with, new_keeper, test_clock, FlakyStorage, RecordingHandler};

const DRAFTS: &str = StorageKey::FormDrafts.as_str();

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_debounce_waits_for_quiet() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());

    saver.update(json!({"name": "D"}));
    assert_eq!(saver.state(), SaveState::Scheduled);
    assert!(saver.has_pending_debounce());

    sleep_ms(600).await;
    assert_eq!(storage.write_count(DRAFTS), 0);

    // Another edit restarts the timer
    saver.update(json!({"name": "Dosa"}));
    sleep_ms(600).await;
    assert_eq!(storage.write_count(DRAFTS), 0);

    sleep_ms(500).await;
    assert_eq!(storage.write_count(DRAFTS), 1);
    assert_eq!(saver.state(), SaveState::Idle);
    assert!(!saver.has_pending_debounce());
    assert_eq!(handler.saved(), vec![json!({"name": "Dosa"})]);
    assert_eq!(
        keeper.drafts().get_draft("step3_profile").await,
        Some(json!({"name": "Dosa"}))
    );
}

#[tokio::test]
async fn test_unchanged_content_is_not_rewritten() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());

    saver.update(json!({"name": "Dosa Corner", "city": "Chennai"}));
    assert_eq!(saver.save(false).await, SaveOutcome::Saved);
    assert_eq!(saver.save(false).await, SaveOutcome::Unchanged);

    // Same content, different key order
    saver.update(json!({"city": "Chennai", "name": "Dosa Corner"}));
    assert_eq!(saver.save(true).await, SaveOutcome::Unchanged);

    assert_eq!(storage.write_count(DRAFTS), 1);
    assert_eq!(handler.saved().len(), 1);
}

#[tokio::test]
async fn test_save_without_data() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());

    assert_eq!(saver.force_save().await, SaveOutcome::NoData);
    assert_eq!(storage.write_count(DRAFTS), 0);
    assert!(handler.saved().is_empty());
    assert!(handler.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_periodic_save_backstops_continuous_typing() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());
    saver.start();
    assert!(saver.is_running());

    // An edit every 300ms never lets the 1s debounce fire
    for i in 0..16 {
        saver.update(json!({"chars": i}));
        sleep_ms(300).await;
    }
    assert_eq!(storage.write_count(DRAFTS), 0);

    for i in 16..19 {
        saver.update(json!({"chars": i}));
        sleep_ms(300).await;
    }
    assert_eq!(storage.write_count(DRAFTS), 1);
    assert_eq!(handler.saved().len(), 1);
    assert!(saver.has_pending_debounce());
}

#[tokio::test]
async fn test_failed_write_is_retried() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());

    saver.update(json!({"name": "Dosa Corner"}));
    storage.fail_writes(true);
    assert_eq!(saver.save(true).await, SaveOutcome::Failed);
    assert_eq!(handler.errors().len(), 1);
    assert!(handler.saved().is_empty());
    assert_eq!(saver.state(), SaveState::Idle);

    // The failed content was not marked saved, so the next attempt writes it
    storage.fail_writes(false);
    assert_eq!(saver.save(false).await, SaveOutcome::Saved);
    assert_eq!(handler.saved().len(), 1);
    assert_eq!(
        keeper.drafts().get_draft("step3_profile").await,
        Some(json!({"name": "Dosa Corner"}))
    );
}

#[tokio::test(start_paused = true)]
async fn test_force_save_cancels_pending_debounce() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());

    saver.update(json!({"name": "Dosa Corner"}));
    assert!(saver.has_pending_debounce());

    assert_eq!(saver.force_save().await, SaveOutcome::Saved);
    assert!(!saver.has_pending_debounce());
    assert_eq!(saver.state(), SaveState::Idle);

    sleep_ms(2_000).await;
    assert_eq!(storage.write_count(DRAFTS), 1);
    assert_eq!(handler.saved().len(), 1);
}

#[tokio::test]
async fn test_clear_resets_signature() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());
    let data = json!({"name": "Dosa Corner"});

    saver.update(data.clone());
    assert_eq!(saver.force_save().await, SaveOutcome::Saved);

    saver.clear_saved_data().await;
    assert!(keeper.drafts().get_draft("step3_profile").await.is_none());
    // Cleared data is not written back by a stray tick
    assert_eq!(saver.save(false).await, SaveOutcome::NoData);

    // The same content is written again rather than skipped
    saver.update(data.clone());
    assert_eq!(saver.force_save().await, SaveOutcome::Saved);
    assert_eq!(storage.write_count(DRAFTS), 2);
    assert_eq!(keeper.drafts().get_draft("step3_profile").await, Some(data));
}

#[tokio::test]
async fn test_loaded_data_counts_as_saved() {
    let (keeper, storage, _clock) = new_keeper();
    keeper
        .drafts()
        .save_draft("step3_profile", json!({"name": "Dosa Corner"}))
        .await;
    let writes = storage.write_count(DRAFTS);

    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());
    let loaded = saver.load_saved_data().await.expect("draft missing");
    assert_eq!(loaded, json!({"name": "Dosa Corner"}));

    // Rehydrating the form with the loaded data does not write
    saver.update(loaded);
    assert_eq!(saver.force_save().await, SaveOutcome::Unchanged);
    assert_eq!(storage.write_count(DRAFTS), writes);

    let other = keeper.draft_autosaver("step5_gst", handler);
    assert!(other.load_saved_data().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_both_timers() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());
    saver.start();
    saver.update(json!({"name": "Dosa Corner"}));
    assert!(saver.is_running());
    assert!(saver.has_pending_debounce());

    saver.shutdown();
    assert!(!saver.is_running());
    assert!(!saver.has_pending_debounce());
    assert_eq!(saver.state(), SaveState::Idle);

    sleep_ms(20_000).await;
    assert_eq!(storage.write_count(DRAFTS), 0);
    assert!(handler.saved().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_timers() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    {
        let saver = keeper.draft_autosaver("step3_profile", handler.clone());
        saver.start();
        saver.update(json!({"name": "Dosa Corner"}));
    }

    sleep_ms(20_000).await;
    assert_eq!(storage.write_count(DRAFTS), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_saver_only_saves_on_demand() {
    let storage = Arc::new(FlakyStorage::new());
    let config = DraftConfig {
        autosave: AutoSaveConfig {
            enabled: false,
            ..AutoSaveConfig::default()
        },
        ..DraftConfig::default()
    };
    let keeper = keeper_with(Arc::clone(&storage), test_clock(), &config);
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());

    saver.start();
    saver.update(json!({"name": "Dosa Corner"}));
    assert!(!saver.is_running());
    assert!(!saver.has_pending_debounce());
    assert_eq!(saver.state(), SaveState::Idle);

    sleep_ms(20_000).await;
    assert_eq!(storage.write_count(DRAFTS), 0);

    assert_eq!(saver.force_save().await, SaveOutcome::Saved);
    assert_eq!(storage.write_count(DRAFTS), 1);

    // Enabling starts the periodic timer, disabling stops it again
    saver.set_enabled(true);
    assert!(saver.is_running());
    saver.update(json!({"name": "Dosa Corner 2"}));
    saver.set_enabled(false);
    assert!(!saver.is_running());
    assert!(!saver.has_pending_debounce());
}

#[tokio::test(start_paused = true)]
async fn test_custom_target_and_intervals() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let target = Arc::new(DraftTarget::new(Arc::clone(keeper.drafts()), "menu_upload"));
    assert_eq!(target.form_id(), "menu_upload");

    let saver = AutoSaver::new(
        target,
        handler.clone(),
        AutoSaveConfig {
            debounce_delay: Duration::from_millis(200),
            interval: Duration::from_secs(3),
            enabled: true,
        },
    );
    saver.start();

    saver.update(json!({"items": 12}));
    sleep_ms(250).await;
    assert_eq!(storage.write_count(DRAFTS), 1);

    // Periodic ticks with unchanged content write nothing
    sleep_ms(10_000).await;
    assert_eq!(storage.write_count(DRAFTS), 1);
    assert_eq!(handler.saved().len(), 1);
}

#[tokio::test]
async fn test_error_handler_receives_storage_cause() {
    let (keeper, storage, _clock) = new_keeper();
    let handler = Arc::new(RecordingHandler::default());
    let saver = keeper.draft_autosaver("step3_profile", handler.clone());

    saver.update(json!({"name": "Dosa Corner"}));
    storage.fail_writes(true);
    assert_eq!(saver.force_save().await, SaveOutcome::Failed);

    let errors = handler.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("quota exceeded"), "{}", errors[0]);
}
