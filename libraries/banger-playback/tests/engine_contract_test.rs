//! Engine call contract tests
//!
//! Strict mock engines pin down exactly which engine calls the session
//! issues, and that engine failures surface as state instead of panics.

mod common;

use banger_core::{BangerError, EngineEvent, EngineStatus, PlaybackEngine};
use banger_playback::{PlaybackEvent, Session, SessionState};
use common::*;
use mockall::predicate::eq;
use mockall::{mock, Sequence};
use std::time::Duration;
use url::Url;

mock! {
    pub Engine {}

    impl PlaybackEngine for Engine {
        fn load(&mut self, locator: &Url) -> banger_core::Result<()>;
        fn play(&mut self) -> banger_core::Result<()>;
        fn pause(&mut self) -> banger_core::Result<()>;
        fn stop(&mut self) -> banger_core::Result<()>;
        fn seek_to(&mut self, position: Duration) -> banger_core::Result<()>;
        fn position(&self) -> Duration;
        fn duration(&self) -> Option<Duration>;
        fn is_playing(&self) -> bool;
        fn status(&self) -> EngineStatus;
    }
}

fn url_is(expected: &'static str) -> impl Fn(&Url) -> bool {
    move |url: &Url| url.as_str() == expected
}

#[test]
fn test_start_loads_then_plays() {
    let mut engine = MockEngine::new();
    let mut seq = Sequence::new();
    engine
        .expect_load()
        .withf(url_is("https://cdn.example.com/a.mp3"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    engine
        .expect_play()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    engine.expect_is_playing().return_const(true);

    let mut session = Session::new(instant_config(), Box::new(engine));
    session.load_and_play(create_test_tracks(&["a"]), 0);

    assert_eq!(session.state(), SessionState::Playing);
}

#[test]
fn test_exhaustion_does_not_pause_idle_engine() {
    let mut engine = MockEngine::new();
    engine.expect_load().times(1).returning(|_| Ok(()));
    engine.expect_play().times(1).returning(|| Ok(()));
    engine.expect_is_playing().return_const(false);
    engine.expect_pause().never();

    let mut session = Session::new(instant_config(), Box::new(engine));
    session.load_and_play(create_test_tracks(&["a"]), 0);
    session.play_next();

    assert_eq!(session.state(), SessionState::Ended);
}

#[test]
fn test_play_failure_becomes_error_state() {
    let mut engine = MockEngine::new();
    engine.expect_load().times(1).returning(|_| Ok(()));
    engine
        .expect_play()
        .times(1)
        .returning(|| Err(BangerError::engine("audio device lost")));
    engine.expect_is_playing().return_const(false);

    let mut session = Session::new(instant_config(), Box::new(engine));
    let mut events = session.events().subscribe();
    session.load_and_play(create_test_tracks(&["a", "b"]), 0);

    assert_eq!(session.state(), SessionState::Error);
    let mut saw_error = false;
    while let Ok(event) = events.try_recv() {
        if let PlaybackEvent::Error { message } = event {
            assert!(message.contains("audio device lost"));
            saw_error = true;
        }
    }
    assert!(saw_error);
}

#[test]
fn test_failed_seek_reports_nothing() {
    let mut engine = MockEngine::new();
    engine.expect_load().returning(|_| Ok(()));
    engine.expect_play().returning(|| Ok(()));
    engine.expect_is_playing().return_const(true);
    engine
        .expect_duration()
        .return_const(Some(Duration::from_secs(180)));
    engine
        .expect_seek_to()
        .with(eq(Duration::from_secs(20)))
        .times(1)
        .returning(|_| Err(BangerError::engine("not seekable")));

    let mut session = Session::new(instant_config(), Box::new(engine));
    session.load_and_play(create_test_tracks(&["a"]), 0);
    let mut events = session.events().subscribe();

    session.seek_to(Duration::from_secs(20));

    assert!(events.try_recv().is_err());
    assert_eq!(session.state(), SessionState::Playing);
}

#[test]
fn test_repeat_one_seeks_to_zero_then_plays() {
    let mut engine = MockEngine::new();
    let mut seq = Sequence::new();
    engine
        .expect_load()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    engine
        .expect_play()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    engine
        .expect_seek_to()
        .with(eq(Duration::ZERO))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    engine
        .expect_play()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    engine
        .expect_position()
        .return_const(Duration::from_secs(150));
    engine.expect_is_playing().return_const(true);
    engine.expect_status().return_const(EngineStatus::Ended);

    let mut session = Session::new(instant_config(), Box::new(engine));
    session.set_repeat(banger_core::types::RepeatMode::One);
    session.load_and_play(create_test_tracks(&["a", "b"]), 0);

    session.on_engine_event(EngineEvent::StatusChanged(EngineStatus::Ended));

    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(
        session.current_track().map(|t| t.id.to_string()).as_deref(),
        Some("a")
    );
}
