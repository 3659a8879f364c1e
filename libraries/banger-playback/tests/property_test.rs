//! Property-based tests for queue sequencing
//!
//! Uses proptest to check the sequencer laws across random queues.

use banger_core::types::{RepeatMode, Track};
use banger_playback::Sequencer;
use proptest::prelude::*;
use std::collections::HashSet;

// ===== Helpers =====

fn arbitrary_tracks() -> impl Strategy<Value = Vec<Track>> {
    prop::collection::vec(("[A-Za-z ]{1,30}", 1u32..600), 1..40).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (title, secs))| {
                Track::new(format!("t{i}"), title, "Artist", "Album")
                    .with_stream_url(format!("https://cdn.example.com/t{i}.mp3"))
                    .with_duration_secs(secs)
            })
            .collect()
    })
}

fn arbitrary_repeat() -> impl Strategy<Value = RepeatMode> {
    prop_oneof![
        Just(RepeatMode::Off),
        Just(RepeatMode::All),
        Just(RepeatMode::One),
    ]
}

fn ids(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| t.id.to_string()).collect()
}

// ===== Property Tests =====

proptest! {
    /// Property: the start index is clamped into the queue
    #[test]
    fn start_index_is_clamped(tracks in arbitrary_tracks(), start in 0usize..100) {
        let len = tracks.len();
        let mut queue = Sequencer::new();
        queue.set_queue(tracks, start);

        prop_assert_eq!(queue.current_index(), Some(start.min(len - 1)));
    }

    /// Property: under Repeat All, len steps of next return to the start
    #[test]
    fn repeat_all_wraps_full_cycle(tracks in arbitrary_tracks(), start in 0usize..40) {
        let mut queue = Sequencer::with_modes(RepeatMode::All, false);
        queue.set_queue(tracks, start);
        let first = queue.current().cloned();

        for _ in 0..queue.len() {
            prop_assert!(queue.next().is_some());
        }
        prop_assert_eq!(queue.current().cloned(), first);
    }

    /// Property: under Off, next at the end keeps returning None
    #[test]
    fn off_end_is_idempotent(tracks in arbitrary_tracks()) {
        let len = tracks.len();
        let mut queue = Sequencer::new();
        queue.set_queue(tracks, len - 1);

        prop_assert!(queue.next().is_none());
        prop_assert!(queue.next().is_none());
        prop_assert_eq!(queue.current_index(), Some(len - 1));

        queue.reset_to_start();
        prop_assert!(queue.previous().is_none());
        prop_assert_eq!(queue.current_index(), Some(0));
    }

    /// Property: Repeat One never moves the cursor
    #[test]
    fn repeat_one_is_identity(tracks in arbitrary_tracks(), start in 0usize..40, steps in 1usize..20) {
        let mut queue = Sequencer::with_modes(RepeatMode::One, false);
        queue.set_queue(tracks, start);
        let current = queue.current().cloned();

        for i in 0..steps {
            let track = if i % 2 == 0 { queue.next() } else { queue.previous() };
            prop_assert_eq!(track, current.clone());
        }
        prop_assert_eq!(queue.current().cloned(), current);
    }

    /// Property: toggling shuffle keeps the current track and the track set
    #[test]
    fn shuffle_preserves_current_and_contents(
        tracks in arbitrary_tracks(),
        start in 0usize..40,
        repeat in arbitrary_repeat(),
    ) {
        let mut queue = Sequencer::with_modes(repeat, false);
        queue.set_queue(tracks.clone(), start);
        let current = queue.current().cloned();

        prop_assert!(queue.toggle_shuffle());
        prop_assert_eq!(queue.current().cloned(), current.clone());

        let shuffled: HashSet<_> = ids(&queue.playlist()).into_iter().collect();
        let original: HashSet<_> = ids(&tracks).into_iter().collect();
        prop_assert_eq!(shuffled, original);
        prop_assert_eq!(queue.len(), tracks.len());

        // Turning it off restores the original order
        prop_assert!(!queue.toggle_shuffle());
        prop_assert_eq!(ids(&queue.playlist()), ids(&tracks));
        prop_assert_eq!(queue.current().cloned(), current);
    }

    /// Property: the original order survives any number of shuffles
    #[test]
    fn original_order_is_kept(tracks in arbitrary_tracks(), toggles in 0usize..6) {
        let mut queue = Sequencer::new();
        queue.set_queue(tracks.clone(), 0);

        for _ in 0..toggles {
            queue.toggle_shuffle();
        }
        prop_assert_eq!(ids(queue.original()), ids(&tracks));
    }

    /// Property: three repeat toggles return to the starting mode
    #[test]
    fn repeat_cycles_in_three_steps(repeat in arbitrary_repeat()) {
        let mut queue = Sequencer::with_modes(repeat, false);
        let first = queue.toggle_repeat();
        let second = queue.toggle_repeat();
        let third = queue.toggle_repeat();

        prop_assert_ne!(first, repeat);
        prop_assert_ne!(second, first);
        prop_assert_eq!(third, repeat);
    }

    /// Property: the cursor always points inside a non-empty queue
    #[test]
    fn cursor_stays_in_bounds(
        tracks in arbitrary_tracks(),
        repeat in arbitrary_repeat(),
        moves in prop::collection::vec(any::<bool>(), 0..60),
    ) {
        let len = tracks.len();
        let mut queue = Sequencer::with_modes(repeat, false);
        queue.set_queue(tracks, 0);

        for forward in moves {
            if forward {
                queue.next();
            } else {
                queue.previous();
            }
            let index = queue.current_index();
            prop_assert!(index.is_some_and(|i| i < len));
        }
    }
}
