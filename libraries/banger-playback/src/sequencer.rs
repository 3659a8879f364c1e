//! Play queue sequencing
//!
//! Keeps the authored order and the playback order side by side:
//! ```text
//! original: A B C D E      (as handed to set_queue)
//! playback: C A E B D      (original, or a permutation of it when shuffled)
//!               ^ cursor
//! ```
//! Turning shuffle off rebuilds `playback` from `original`, so authored
//! order is never lost, and the cursor follows the current track by id
//! across every rebuild.

use banger_core::types::{RepeatMode, Track, TrackId};
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Ordered queue with a play cursor, shuffle flag and repeat mode
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    original: Vec<Track>,
    playback: Vec<Track>,

    /// Index into `playback`; meaningless while `playback` is empty
    cursor: usize,

    shuffle: bool,
    repeat: RepeatMode,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequencer with preset modes
    pub fn with_modes(repeat: RepeatMode, shuffle: bool) -> Self {
        Self {
            repeat,
            shuffle,
            ..Self::default()
        }
    }

    /// Replace the queue
    ///
    /// `start_index` is clamped to the last track. When shuffle is on the
    /// playback order is a fresh permutation and the cursor lands on the
    /// requested start track.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.original = tracks;
        self.cursor = 0;

        if self.original.is_empty() {
            self.playback.clear();
            return;
        }

        let start = start_index.min(self.original.len() - 1);
        let start_id = self.original[start].id.clone();

        self.playback = self.original.clone();
        if self.shuffle {
            self.playback.shuffle(&mut thread_rng());
            self.cursor = self.position_of(&start_id).unwrap_or(0);
        } else {
            self.cursor = start;
        }
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.playback.get(self.cursor)
    }

    /// Advance in playback order
    ///
    /// Repeat One returns the current track without moving. At the last
    /// index Repeat All wraps to 0 and Off returns `None`, leaving the
    /// cursor on the last track.
    pub fn next(&mut self) -> Option<Track> {
        if self.playback.is_empty() {
            return None;
        }

        match self.repeat {
            RepeatMode::One => self.current().cloned(),
            _ if self.cursor + 1 < self.playback.len() => {
                self.cursor += 1;
                self.current().cloned()
            }
            RepeatMode::All => {
                self.cursor = 0;
                self.current().cloned()
            }
            RepeatMode::Off => None,
        }
    }

    /// Step back in playback order (mirror of [`Self::next`])
    pub fn previous(&mut self) -> Option<Track> {
        if self.playback.is_empty() {
            return None;
        }

        match self.repeat {
            RepeatMode::One => self.current().cloned(),
            _ if self.cursor > 0 => {
                self.cursor -= 1;
                self.current().cloned()
            }
            RepeatMode::All => {
                self.cursor = self.playback.len() - 1;
                self.current().cloned()
            }
            RepeatMode::Off => None,
        }
    }

    /// Whether a track exists before the cursor without wrapping
    pub fn has_previous(&self) -> bool {
        !self.playback.is_empty() && self.cursor > 0
    }

    /// Move the cursor back to the first track
    pub fn reset_to_start(&mut self) -> Option<Track> {
        self.cursor = 0;
        self.current().cloned()
    }

    /// Move the cursor onto a track by id
    ///
    /// Returns `false` (cursor unchanged) when the track is not queued.
    pub fn select(&mut self, id: &TrackId) -> bool {
        match self.position_of(id) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Flip shuffle and rebuild the playback order
    ///
    /// Returns the new shuffle flag. The current track stays current.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;

        let current_id = self.current().map(|t| t.id.clone());
        self.playback = self.original.clone();
        if self.shuffle {
            self.playback.shuffle(&mut thread_rng());
        }

        self.cursor = current_id
            .and_then(|id| self.position_of(&id))
            .unwrap_or(0);

        self.shuffle
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffle != enabled {
            self.toggle_shuffle();
        }
    }

    /// Cycle Off -> All -> One -> Off and return the new mode
    pub fn toggle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    /// Cursor position, `None` while the queue is empty
    pub fn current_index(&self) -> Option<usize> {
        (!self.playback.is_empty()).then_some(self.cursor)
    }

    /// Copy of the playback order
    pub fn playlist(&self) -> Vec<Track> {
        self.playback.clone()
    }

    /// Authored order
    pub fn original(&self) -> &[Track] {
        &self.original
    }

    pub fn len(&self) -> usize {
        self.playback.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playback.is_empty()
    }

    fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.playback.iter().position(|t| &t.id == id)
    }
}
