//! Console presentation surfaces
//!
//! Terminal stand-ins for the now-playing screen, the mini player, the
//! progress bar and the OS media session. Each one only renders what the
//! session tells it.

use banger_core::types::Track;
use banger_playback::media_session::{MediaMetadata, MediaPlaybackState};
use banger_playback::{
    format_time, MediaSessionSurface, NowPlayingNotification, PlaybackObserver, ProgressSink,
    ProgressSnapshot,
};
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

type Output = Mutex<Box<dyn Write + Send>>;

fn write_line(out: &Output, line: &str) {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    // A closed terminal is not worth failing playback over
    let _ = writeln!(out, "{line}");
    let _ = out.flush();
}

/// Full now-playing view
pub struct NowPlayingView {
    out: Output,
}

impl NowPlayingView {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl PlaybackObserver for NowPlayingView {
    fn on_playback_state_changed(&self, is_playing: bool) {
        write_line(&self.out, if is_playing { "  [playing]" } else { "  [paused]" });
    }

    fn on_track_changed(&self, track: Option<&Track>) {
        match track {
            Some(track) => write_line(
                &self.out,
                &format!(
                    "Now playing: {} by {} ({}, {})",
                    track.title,
                    track.artist,
                    track.album,
                    format_time(track.duration())
                ),
            ),
            None => write_line(&self.out, "Nothing playing"),
        }
    }
}

/// One-line mini player
///
/// Keeps the last track so a play/pause change can redraw the whole line.
pub struct MiniPlayer {
    out: Output,
    current: Mutex<Option<(String, String)>>,
}

impl MiniPlayer {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            current: Mutex::new(None),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn render(&self, is_playing: bool) {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let icon = if is_playing { ">" } else { "||" };
        let line = match current {
            Some((title, artist)) => format!("[{icon}] {title} - {artist}"),
            None => format!("[{icon}] -"),
        };
        write_line(&self.out, &line);
    }
}

impl PlaybackObserver for MiniPlayer {
    fn on_playback_state_changed(&self, is_playing: bool) {
        self.render(is_playing);
    }

    fn on_track_changed(&self, track: Option<&Track>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            track.map(|t| (t.title.clone(), t.artist.clone()));
    }
}

/// Progress bar driven by the position ticker
pub struct ProgressLine {
    out: Output,
    width: usize,
}

impl ProgressLine {
    pub fn new(out: Box<dyn Write + Send>, width: usize) -> Self {
        Self {
            out: Mutex::new(out),
            width: width.max(1),
        }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()), 30)
    }

    fn bar(&self, fraction: f64) -> String {
        let filled = ((fraction.clamp(0.0, 1.0) * self.width as f64).round() as usize).min(self.width);
        format!("{}{}", "#".repeat(filled), "-".repeat(self.width - filled))
    }

    fn draw(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = write!(out, "\r{text}");
        let _ = out.flush();
    }
}

impl ProgressSink for ProgressLine {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.draw(&format!(
            "{} [{}] {}",
            snapshot.elapsed,
            self.bar(snapshot.fraction),
            snapshot.total
        ));
    }

    fn on_drag_preview(&self, elapsed: &str) {
        self.draw(&format!("seek to {elapsed}"));
    }
}

/// Media session surface that logs what an OS integration would display
#[derive(Debug, Default)]
pub struct LoggingMediaSurface;

impl MediaSessionSurface for LoggingMediaSurface {
    fn set_metadata(&self, metadata: &MediaMetadata) {
        debug!(
            title = %metadata.title,
            artist = %metadata.artist,
            album = %metadata.album,
            duration_ms = metadata.duration_ms,
            "Media session metadata"
        );
    }

    fn set_playback_state(&self, state: &MediaPlaybackState) {
        debug!(
            status = ?state.status,
            position_ms = state.position_ms,
            "Media session playback state"
        );
    }

    fn post_notification(&self, notification: &NowPlayingNotification) {
        info!(
            title = %notification.title,
            text = %notification.text,
            ongoing = notification.ongoing,
            buttons = ?notification.buttons,
            "Now playing notification"
        );
    }
}
