//! Simulated playback engine
//!
//! Renders nothing: a virtual playhead advances with the tokio clock
//! (optionally sped up) and the engine reports buffering, play state and
//! track end through the same [`EngineEvent`] channel a real audio backend
//! would use. Track lengths come from the catalog metadata registered with
//! [`SimulatedEngine::register`].

use banger_core::types::Track;
use banger_core::{BangerError, EngineEvent, EngineStatus, PlaybackEngine, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};
use url::Url;

/// Length assumed for a stream with no registered duration
pub const UNKNOWN_LENGTH: Duration = Duration::from_secs(30);

struct Clock {
    durations: HashMap<Url, Duration>,
    loaded: Option<Url>,
    duration: Option<Duration>,
    /// Playhead when the clock last stopped or was re-based
    offset: Duration,
    /// Set while playing
    started: Option<Instant>,
    status: EngineStatus,
    /// Bumped whenever a pending end timer becomes stale
    epoch: u64,
}

impl Clock {
    fn position(&self, speed: f64) -> Duration {
        let elapsed = self
            .started
            .map_or(Duration::ZERO, |started| started.elapsed().mul_f64(speed));
        let position = self.offset + elapsed;
        self.duration.map_or(position, |d| position.min(d))
    }

    fn freeze(&mut self, speed: f64) {
        self.offset = self.position(speed);
        self.started = None;
    }
}

/// Engine double with a virtual clock
///
/// Clones share the same clock, so the application can keep one to
/// register durations after handing another to the session.
#[derive(Clone)]
pub struct SimulatedEngine {
    clock: Arc<Mutex<Clock>>,
    events: mpsc::UnboundedSender<EngineEvent>,
    speed: f64,
}

impl SimulatedEngine {
    /// Create an engine reporting to `events`
    ///
    /// `speed` scales the virtual clock; values at or below zero fall back
    /// to real time.
    pub fn new(events: mpsc::UnboundedSender<EngineEvent>, speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };

        Self {
            clock: Arc::new(Mutex::new(Clock {
                durations: HashMap::new(),
                loaded: None,
                duration: None,
                offset: Duration::ZERO,
                started: None,
                status: EngineStatus::Idle,
                epoch: 0,
            })),
            events,
            speed,
        }
    }

    /// Remember the length of a track's stream
    pub fn register(&self, track: &Track) {
        if let Some(locator) = track.stream_locator() {
            let length = if track.duration_secs == 0 {
                UNKNOWN_LENGTH
            } else {
                track.duration()
            };
            self.clock().durations.insert(locator, length);
        }
    }

    pub fn register_all<'a>(&self, tracks: impl IntoIterator<Item = &'a Track>) {
        for track in tracks {
            self.register(track);
        }
    }

    pub fn boxed(&self) -> Box<dyn PlaybackEngine> {
        Box::new(self.clone())
    }

    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: EngineEvent) {
        trace!(event = ?event, "Engine event");
        // The session may already be gone during shutdown
        let _ = self.events.send(event);
    }

    /// Arm a timer that reports the end of the loaded stream
    fn schedule_end(&self, clock: &mut Clock) {
        clock.epoch += 1;
        let Some(duration) = clock.duration else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let remaining = duration.saturating_sub(clock.offset).div_f64(self.speed);
        let epoch = clock.epoch;
        let engine = self.clone();

        runtime.spawn(async move {
            tokio::time::sleep(remaining).await;
            engine.finish(epoch);
        });
    }

    fn finish(&self, epoch: u64) {
        {
            let mut clock = self.clock();
            if clock.epoch != epoch || clock.started.is_none() {
                return;
            }
            clock.offset = clock.duration.unwrap_or(clock.offset);
            clock.started = None;
            clock.status = EngineStatus::Ended;
        }

        debug!("Simulated stream reached its end");
        self.emit(EngineEvent::IsPlayingChanged(false));
        self.emit(EngineEvent::StatusChanged(EngineStatus::Ended));
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn load(&mut self, locator: &Url) -> Result<()> {
        if !matches!(locator.scheme(), "http" | "https") {
            return Err(BangerError::engine(format!(
                "unsupported stream scheme: {}",
                locator.scheme()
            )));
        }

        {
            let mut clock = self.clock();
            clock.epoch += 1;
            clock.duration = Some(
                clock
                    .durations
                    .get(locator)
                    .copied()
                    .unwrap_or(UNKNOWN_LENGTH),
            );
            clock.loaded = Some(locator.clone());
            clock.offset = Duration::ZERO;
            clock.started = None;
            clock.status = EngineStatus::Buffering;
        }

        debug!(url = %locator, "Simulated stream loaded");
        self.emit(EngineEvent::StatusChanged(EngineStatus::Buffering));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        {
            let mut clock = self.clock();
            if clock.loaded.is_none() {
                return Err(BangerError::engine("nothing loaded"));
            }
            if clock.started.is_some() {
                return Ok(());
            }
            if clock.status == EngineStatus::Ended {
                clock.offset = Duration::ZERO;
            }
            clock.started = Some(Instant::now());
            clock.status = EngineStatus::Ready;
            self.schedule_end(&mut clock);
        }

        self.emit(EngineEvent::StatusChanged(EngineStatus::Ready));
        self.emit(EngineEvent::IsPlayingChanged(true));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let was_playing = {
            let mut clock = self.clock();
            let was_playing = clock.started.is_some();
            clock.freeze(self.speed);
            clock.epoch += 1;
            was_playing
        };

        if was_playing {
            self.emit(EngineEvent::IsPlayingChanged(false));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let was_playing = {
            let mut clock = self.clock();
            let was_playing = clock.started.is_some();
            clock.epoch += 1;
            clock.loaded = None;
            clock.duration = None;
            clock.offset = Duration::ZERO;
            clock.started = None;
            clock.status = EngineStatus::Idle;
            was_playing
        };

        if was_playing {
            self.emit(EngineEvent::IsPlayingChanged(false));
        }
        self.emit(EngineEvent::StatusChanged(EngineStatus::Idle));
        Ok(())
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        let mut clock = self.clock();
        if clock.loaded.is_none() {
            return Err(BangerError::engine("nothing loaded"));
        }

        let target = clock.duration.map_or(position, |d| position.min(d));
        clock.offset = target;
        if clock.started.is_some() {
            clock.started = Some(Instant::now());
            self.schedule_end(&mut clock);
        } else if clock.status == EngineStatus::Ended {
            clock.status = EngineStatus::Ready;
        }
        Ok(())
    }

    fn position(&self) -> Duration {
        self.clock().position(self.speed)
    }

    fn duration(&self) -> Option<Duration> {
        self.clock().duration
    }

    fn is_playing(&self) -> bool {
        self.clock().started.is_some()
    }

    fn status(&self) -> EngineStatus {
        self.clock().status
    }
}

impl std::fmt::Debug for SimulatedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.clock();
        f.debug_struct("SimulatedEngine")
            .field("loaded", &clock.loaded.as_ref().map(Url::as_str))
            .field("status", &clock.status)
            .field("speed", &self.speed)
            .finish_non_exhaustive()
    }
}
