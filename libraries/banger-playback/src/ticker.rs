//! Position ticker
//!
//! Samples the playhead at a fixed interval to drive a progress bar. While
//! the user drags the bar, sampling is suspended and only a local preview is
//! shown; the seek is committed once, on release.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Render a duration as `m:ss`
pub fn format_time(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// `position / duration`, clamped to `[0, 1]`
    pub fraction: f64,
    pub elapsed: String,
    pub total: String,
    pub position: Duration,
    pub duration: Duration,
}

impl ProgressSnapshot {
    /// `None` unless the duration is known and positive
    pub fn compute(position: Duration, duration: Option<Duration>) -> Option<Self> {
        let duration = duration.filter(|d| !d.is_zero())?;
        let fraction = (position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0);
        Some(Self {
            fraction,
            elapsed: format_time(position),
            total: format_time(duration),
            position,
            duration,
        })
    }
}

/// Progress bar on a presentation surface
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, snapshot: &ProgressSnapshot);

    /// Elapsed label while the user drags
    fn on_drag_preview(&self, elapsed: &str) {
        let _ = elapsed;
    }
}

/// Something that reports and moves the playhead
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// `(position, duration)`, or `None` when the source is gone
    async fn sample(&self) -> Option<(Duration, Option<Duration>)>;

    async fn seek_to(&self, position: Duration);
}

#[derive(Debug, Default)]
struct DragState {
    dragging: bool,
    target: Option<Duration>,
    last_duration: Option<Duration>,
}

pub struct PositionTicker {
    source: Arc<dyn PositionSource>,
    sink: Arc<dyn ProgressSink>,
    drag: Mutex<DragState>,
}

impl PositionTicker {
    pub fn new(source: Arc<dyn PositionSource>, sink: Arc<dyn ProgressSink>) -> Arc<Self> {
        Arc::new(Self {
            source,
            sink,
            drag: Mutex::new(DragState::default()),
        })
    }

    /// Sample once and push to the sink
    ///
    /// Skipped while a drag is in progress or the duration is unknown.
    pub async fn tick(&self) -> Option<ProgressSnapshot> {
        if self.state().dragging {
            return None;
        }

        let (position, duration) = self.source.sample().await?;
        let snapshot = ProgressSnapshot::compute(position, duration)?;

        {
            let mut state = self.state();
            // A drag may have started while sampling
            if state.dragging {
                return None;
            }
            state.last_duration = Some(snapshot.duration);
        }

        self.sink.on_progress(&snapshot);
        Some(snapshot)
    }

    pub fn begin_drag(&self) {
        let mut state = self.state();
        state.dragging = true;
        state.target = None;
    }

    /// Preview a drag position without touching the engine
    ///
    /// Returns the elapsed label, or `None` when not dragging or the
    /// duration has not been sampled yet.
    pub fn drag_to(&self, fraction: f64) -> Option<String> {
        let label = {
            let mut state = self.state();
            if !state.dragging {
                return None;
            }
            let duration = state.last_duration?;
            let target = duration.mul_f64(fraction.clamp(0.0, 1.0));
            state.target = Some(target);
            format_time(target)
        };

        self.sink.on_drag_preview(&label);
        Some(label)
    }

    /// Release the drag, committing at most one seek
    pub async fn end_drag(&self) -> Option<Duration> {
        let target = {
            let mut state = self.state();
            state.dragging = false;
            state.target.take()
        };

        if let Some(position) = target {
            self.source.seek_to(position).await;
        }
        target
    }

    pub fn is_dragging(&self) -> bool {
        self.state().dragging
    }

    /// Tick on a tokio interval until the handle is dropped
    pub fn start(self: &Arc<Self>, period: Duration) -> TickerHandle {
        let ticker = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                ticker.tick().await;
            }
        });
        TickerHandle { task }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, DragState> {
        self.drag.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Running ticker task, aborted on drop
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
