//! Driver task tests
//!
//! Run a session on its driver task under a paused tokio clock, so the
//! settle delay and ticker timings are deterministic.

mod common;

use banger_core::{EngineEvent, EngineStatus};
use banger_playback::worker::await_reply;
use banger_playback::{
    driver, PlaybackConfig, PlaybackError, PositionTicker, ProgressSink, ProgressSnapshot,
    Session, SessionHandle, SessionSnapshot, SessionState, StoreWorker,
};
use common::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ===== Helpers =====

struct Harness {
    handle: SessionHandle,
    engine: FakeEngine,
    engine_tx: mpsc::UnboundedSender<EngineEvent>,
    observer: Arc<RecordingObserver>,
    task: tokio::task::JoinHandle<Session>,
}

fn start(config: PlaybackConfig) -> Harness {
    start_with(Session::new(config, FakeEngine::new().boxed()), None)
}

fn start_with(session: Session, engine: Option<FakeEngine>) -> Harness {
    let engine = engine.unwrap_or_default();
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let (handle, task) = driver::spawn(session, engine_rx);
    let observer = RecordingObserver::new();
    handle.add_observer(&as_observer(&observer));
    Harness {
        handle,
        engine,
        engine_tx,
        observer,
        task,
    }
}

fn start_with_engine(config: PlaybackConfig) -> Harness {
    let engine = FakeEngine::new();
    start_with(Session::new(config, engine.boxed()), Some(engine))
}

/// Poll snapshots until `done` holds, letting the paused clock advance
async fn wait_for(
    handle: &SessionHandle,
    done: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    for _ in 0..100 {
        let snapshot = handle.snapshot().await.unwrap();
        if done(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

fn track_id(snapshot: &SessionSnapshot) -> Option<String> {
    snapshot.track.as_ref().map(|t| t.id.to_string())
}

// ===== Settle delay =====

#[tokio::test(start_paused = true)]
async fn test_confirmation_arrives_after_settle_delay() {
    let h = start(PlaybackConfig::default());

    h.handle
        .load_and_play(create_test_tracks(&["a", "b"]), 0)
        .unwrap();
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Loading);
    assert_eq!(h.observer.seen(), vec![Observed::Track(Some("a".into()))]);

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(h.handle.snapshot().await.unwrap().state, SessionState::Playing);
    assert_eq!(h.handle.state(), SessionState::Playing);
    assert_eq!(
        h.observer.seen(),
        vec![Observed::Track(Some("a".into())), Observed::Playing(true)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_latest_play_wins() {
    let h = start(PlaybackConfig::default());

    h.handle
        .load_and_play(create_test_tracks(&["a", "b", "c"]), 0)
        .unwrap();
    h.handle.play_next().unwrap();
    h.handle.play_next().unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(track_id(&snapshot).as_deref(), Some("c"));
    assert_eq!(snapshot.state, SessionState::Playing);
    assert_eq!(
        h.observer.seen(),
        vec![
            Observed::Track(Some("a".into())),
            Observed::Track(Some("b".into())),
            Observed::Track(Some("c".into())),
            Observed::Playing(true),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_start_before_spawn_is_confirmed() {
    let mut session = Session::new(PlaybackConfig::default(), FakeEngine::new().boxed());
    session.load_and_play(create_test_tracks(&["a"]), 0);
    let h = start_with(session, None);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.handle.state(), SessionState::Playing);
}

// ===== Engine events =====

#[tokio::test(start_paused = true)]
async fn test_engine_events_drive_the_session() {
    let h = start_with_engine(instant_config());
    h.handle
        .load_and_play(create_test_tracks(&["a", "b"]), 0)
        .unwrap();
    wait_for(&h.handle, |s| s.state == SessionState::Playing).await;

    h.engine.set_position(Duration::from_secs(170));
    h.engine.reach_end();
    h.engine_tx
        .send(EngineEvent::StatusChanged(EngineStatus::Ended))
        .unwrap();

    let snapshot = wait_for(&h.handle, |s| track_id(s).as_deref() == Some("b")).await;
    assert_eq!(snapshot.state, SessionState::Playing);

    h.engine_tx
        .send(EngineEvent::Error("network lost".into()))
        .unwrap();
    wait_for(&h.handle, |s| s.state == SessionState::Error).await;
}

#[tokio::test(start_paused = true)]
async fn test_closed_engine_channel_keeps_driver_running() {
    let h = start(instant_config());
    drop(h.engine_tx);

    h.handle
        .load_and_play(create_test_tracks(&["a"]), 0)
        .unwrap();
    let snapshot = wait_for(&h.handle, |s| s.state == SessionState::Playing).await;
    assert_eq!(track_id(&snapshot).as_deref(), Some("a"));
}

// ===== Commands =====

#[tokio::test(start_paused = true)]
async fn test_commands_apply_in_order() {
    let h = start(instant_config());

    h.handle
        .load_and_play(create_test_tracks(&["a", "b", "c"]), 0)
        .unwrap();
    h.handle.play_next().unwrap();
    h.handle.toggle_repeat().unwrap();
    h.handle.toggle_shuffle().unwrap();
    h.handle.pause().unwrap();

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(track_id(&snapshot).as_deref(), Some("b"));
    assert_eq!(snapshot.state, SessionState::Paused);
    assert_eq!(snapshot.repeat, banger_core::types::RepeatMode::All);
    assert!(snapshot.shuffle);
    assert!(!snapshot.is_playing);
}

#[tokio::test(start_paused = true)]
async fn test_events_are_broadcast() {
    let h = start(instant_config());
    let mut events = h.handle.subscribe_events();

    h.handle
        .load_and_play(create_test_tracks(&["a"]), 0)
        .unwrap();
    h.handle.snapshot().await.unwrap();

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event);
    }
    assert!(names.iter().any(|e| matches!(
        e,
        banger_playback::PlaybackEvent::TrackChanged { track_id, .. } if track_id == "a"
    )));
}

// ===== Store =====

#[tokio::test(start_paused = true)]
async fn test_history_written_through_worker() {
    let store = Arc::new(MemoryStore::default());
    let (worker, _worker_task) = StoreWorker::spawn(store.clone());
    let session =
        Session::new(instant_config(), FakeEngine::new().boxed()).with_worker(worker.clone());
    let h = start_with(session, None);

    h.handle
        .load_and_play(create_test_tracks(&["a", "b"]), 0)
        .unwrap();
    h.handle.play_next().unwrap();
    h.handle.snapshot().await.unwrap();
    await_reply(worker.get_playlists()).await.unwrap();

    assert_eq!(store.history_ids(), vec!["b", "a"]);
}

#[tokio::test(start_paused = true)]
async fn test_favorites_through_handle() {
    let store = Arc::new(MemoryStore::default());
    let (worker, _worker_task) = StoreWorker::spawn(store.clone());
    let session = Session::new(instant_config(), FakeEngine::new().boxed()).with_worker(worker);
    let h = start_with(session, None);
    let track = create_test_track("a");

    assert!(!h.handle.is_favorite(&track).await.unwrap());
    assert!(h.handle.toggle_favorite(&track).await.unwrap());
    assert!(h.handle.is_favorite(&track).await.unwrap());
    assert_eq!(store.favorites.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_favorites_without_store_fail() {
    let h = start(instant_config());
    let err = h
        .handle
        .toggle_favorite(&create_test_track("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::WorkerClosed(_)));
}

// ===== Shutdown =====

#[tokio::test(start_paused = true)]
async fn test_shutdown_returns_session() {
    let h = start(instant_config());
    h.handle
        .load_and_play(create_test_tracks(&["a", "b"]), 1)
        .unwrap();
    h.handle.shutdown().unwrap();

    let session = h.task.await.unwrap();
    assert_eq!(session.queue().len(), 2);
    assert_eq!(
        session.current_track().map(|t| t.id.to_string()).as_deref(),
        Some("b")
    );

    assert!(h.handle.play_next().is_err());
    assert!(h.handle.snapshot().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_driver_ends_when_handles_drop() {
    let h = start(instant_config());
    let Harness { handle, task, .. } = h;
    drop(handle);

    let session = task.await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);
}

// ===== Ticker =====

#[derive(Default)]
struct RecordingSink {
    progress: Mutex<Vec<ProgressSnapshot>>,
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.progress.lock().unwrap().push(snapshot.clone());
    }
}

#[tokio::test(start_paused = true)]
async fn test_ticker_follows_session_and_seeks_once() {
    let h = start_with_engine(instant_config());
    h.handle
        .load_and_play(create_test_tracks(&["a"]), 0)
        .unwrap();
    h.engine.set_position(Duration::from_secs(45));

    let sink = Arc::new(RecordingSink::default());
    let ticker = PositionTicker::new(Arc::new(h.handle.clone()), sink.clone());

    let snapshot = ticker.tick().await.unwrap();
    assert_eq!(snapshot.elapsed, "0:45");
    assert_eq!(snapshot.total, "3:00");
    assert!((snapshot.fraction - 0.25).abs() < 1e-9);

    ticker.begin_drag();
    assert!(ticker.tick().await.is_none());
    assert_eq!(ticker.drag_to(0.5).as_deref(), Some("1:30"));

    let target = ticker.end_drag().await.unwrap();
    assert_eq!(target, Duration::from_secs(90));

    let snapshot = wait_for(&h.handle, |s| s.position == Duration::from_secs(90)).await;
    assert_eq!(snapshot.state, SessionState::Playing);
    assert_eq!(
        h.engine
            .calls()
            .iter()
            .filter(|c| c.starts_with("seek:"))
            .count(),
        1
    );
}
