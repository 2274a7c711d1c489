//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits state change events on mutations
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple tasks
//! - Tracks a whole batch from start to outcome

use camino::Utf8PathBuf;
use imgrename::models::{FileStatus, ProgressEvent};
use imgrename::{BatchOutcome, StateChange, StateManager};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

fn progress(index: usize, total: usize, percent: u8) -> ProgressEvent {
    ProgressEvent {
        plan_index: index,
        total,
        original: Utf8PathBuf::from(format!("/photos/IMG_{:03}.jpg", index)),
        destination: Utf8PathBuf::from(format!("/photos/PHOTO_{:03}.jpg", index)),
        percent_complete: percent,
    }
}

/// Drain whatever is queued, waiting briefly for stragglers.
async fn drain(rx: &mut tokio::sync::broadcast::Receiver<StateChange>) -> Vec<StateChange> {
    let mut events = Vec::new();
    while let Ok(Ok(event)) = timeout(Duration::from_millis(50), rx.recv()).await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_batch_started_event_emitted() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.start_batch(2);

    let events = drain(&mut rx).await;
    assert!(
        events
            .iter()
            .any(|e| matches!(e, StateChange::BatchStarted { total_files: 2 })),
        "Expected BatchStarted event, got: {:?}",
        events
    );
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = Arc::new(StateManager::new());
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();
    let mut rx3 = state.subscribe();

    state.set_status("Started...");

    for rx in [&mut rx1, &mut rx2, &mut rx3] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout")
            .expect("Channel closed");
        assert_eq!(
            event,
            StateChange::StatusChanged {
                message: "Started...".to_string()
            }
        );
    }
}

#[tokio::test]
async fn test_selection_change_detection() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.set_directory(Some("/photos".into()));

    let events = drain(&mut rx).await;
    assert!(events.contains(&StateChange::SelectionChanged { can_start: false }));

    state.set_patterns("IMG".to_string(), "PHOTO".to_string());

    let events = drain(&mut rx).await;
    assert_eq!(events, vec![StateChange::SelectionChanged { can_start: true }]);
}

#[tokio::test]
async fn test_progress_emits_percent_and_status_line() {
    let state = Arc::new(StateManager::new());
    state.start_batch(4);
    let mut rx = state.subscribe();

    state.apply_progress(&progress(1, 4, 50));

    let events = drain(&mut rx).await;
    assert!(events.iter().any(|e| matches!(
        e,
        StateChange::ProgressUpdated { percent: 50, total: 4, .. }
    )));
    assert!(events.contains(&StateChange::StatusChanged {
        message: "/photos/IMG_001.jpg => /photos/PHOTO_001.jpg".to_string()
    }));
}

#[tokio::test]
async fn test_full_batch_lifecycle() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.start_batch(3);
    for index in 0..3 {
        let event = progress(index, 3, ((index + 1) * 100 / 3) as u8);
        state.apply_progress(&event);
        let status = if index == 1 {
            FileStatus::Skipped {
                error: "PHOTO_001.jpg already exists".to_string(),
            }
        } else {
            FileStatus::Done {
                destination: event.destination.clone(),
            }
        };
        state.add_file_result(event.original, status);
    }
    state.finish_batch(BatchOutcome::Completed { count: 3 });

    let events = drain(&mut rx).await;
    let processed = events
        .iter()
        .filter(|e| matches!(e, StateChange::FileProcessed { .. }))
        .count();
    assert_eq!(processed, 3);
    assert!(matches!(
        events.last(),
        Some(StateChange::BatchFinished {
            outcome: BatchOutcome::Completed { count: 3 }
        })
    ));

    let snapshot = state.snapshot();
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.progress, 3);
    assert_eq!(snapshot.percent_complete, 100);
    assert_eq!(snapshot.batch_stats(), (2, 0, 1, 0));
    assert_eq!(snapshot.status_message, "Completed: 3 files");

    // Results keep processing order
    let order: Vec<_> = snapshot.results.keys().map(|p| p.as_str().to_string()).collect();
    assert_eq!(
        order,
        vec![
            "/photos/IMG_000.jpg",
            "/photos/IMG_001.jpg",
            "/photos/IMG_002.jpg"
        ]
    );
}

#[tokio::test]
async fn test_aborted_batch_reports_error() {
    let state = Arc::new(StateManager::new());
    state.start_batch(2);
    state.apply_progress(&progress(0, 2, 50));
    state.add_file_result(
        "/photos/IMG_000.jpg".into(),
        FileStatus::Failed {
            error: "disk full".to_string(),
        },
    );

    state.finish_batch(BatchOutcome::aborted_on_error("disk full"));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.status_message, "Error: disk full");
    assert_eq!(snapshot.percent_complete, 0);
    assert_eq!(snapshot.batch_stats(), (0, 0, 0, 1));
}

#[tokio::test]
async fn test_concurrent_state_access() {
    let state = Arc::new(StateManager::new());

    let mut handles = vec![];
    for i in 0..10 {
        let state_clone = state.clone();
        handles.push(tokio::spawn(async move {
            state_clone.add_file_result(
                Utf8PathBuf::from(format!("/photos/IMG_{}.jpg", i)),
                FileStatus::Unchanged,
            );
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = state.snapshot();
    assert_eq!(snapshot.results.len(), 10);
    assert_eq!(snapshot.progress, 10);
}

#[tokio::test]
async fn test_reset_batch_state() {
    let state = Arc::new(StateManager::new());
    state.start_batch(1);
    state.add_file_result("/photos/IMG_000.jpg".into(), FileStatus::Unchanged);
    state.finish_batch(BatchOutcome::Completed { count: 1 });
    let mut rx = state.subscribe();

    state.reset_batch_state();

    let events = drain(&mut rx).await;
    assert!(events.contains(&StateChange::StateReset));

    let snapshot = state.snapshot();
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.progress, 0);
    assert_eq!(snapshot.total_files, 0);
    assert!(snapshot.results.is_empty());
    assert!(snapshot.last_outcome.is_none());
}
