//! Property-based tests for the playback core
//!
//! Uses proptest to check invariants across random seek, tick and
//! navigation sequences.

use orpheon_core::{Track, TrackId};
use orpheon_playback::{
    MemoryReporter, MemoryStore, PlayQueue, PlaybackConfig, PlaybackController, SimulatedEngine,
    SimulationHandle,
};
use proptest::prelude::*;

// ===== Helpers =====

#[derive(Debug, Clone)]
enum Op {
    Seek(f64),
    Tick(f64),
    Toggle,
    Next,
    Previous,
}

fn arbitrary_seek_target() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -100.0f64..400.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arbitrary_seek_target().prop_map(Op::Seek),
        4 => (0.0f64..30.0).prop_map(Op::Tick),
        1 => Just(Op::Toggle),
        1 => Just(Op::Next),
        1 => Just(Op::Previous),
    ]
}

fn context(durations: &[u32]) -> Vec<Track> {
    durations
        .iter()
        .enumerate()
        .map(|(i, secs)| Track::new(TrackId::new(format!("t{i}")), format!("Track {i}"), *secs))
        .collect()
}

fn player(
    tracks: &[Track],
) -> (
    PlaybackController<SimulatedEngine>,
    SimulationHandle,
    MemoryReporter,
) {
    let mut engine = SimulatedEngine::new();
    for t in tracks {
        engine = engine.with_media(format!("/api/tracks/{}/audio", t.id), f64::from(t.duration));
    }
    let clock = engine.handle();
    let reporter = MemoryReporter::new();
    let controller = PlaybackController::new(
        PlaybackConfig::default(),
        engine,
        Box::new(MemoryStore::new()),
        Box::new(reporter.clone()),
    )
    .unwrap();
    (controller, clock, reporter)
}

// ===== Property Tests =====

proptest! {
    /// Property: seeking never leaves progress outside [0, duration],
    /// whether or not the engine has loaded metadata yet
    #[test]
    fn seeks_keep_progress_within_duration(
        duration in 1u32..600,
        targets in prop::collection::vec(arbitrary_seek_target(), 1..40)
    ) {
        let tracks = context(&[duration]);
        let (mut player, clock, _) = player(&tracks);
        player.start_playback(&tracks[0], &tracks);

        for (i, target) in targets.into_iter().enumerate() {
            if i == 3 {
                clock.load_metadata();
                player.pump();
            }
            player.set_progress(target);
            let state = player.state();
            prop_assert!(state.progress >= 0.0, "progress {} < 0", state.progress);
            prop_assert!(
                state.progress <= state.duration,
                "progress {} > duration {}", state.progress, state.duration
            );
        }
    }

    /// Property: random sessions keep state consistent and report only
    /// well-formed ranges that lie inside the track
    #[test]
    fn random_sessions_stay_consistent(
        durations in prop::collection::vec(5u32..120, 1..6),
        start in any::<prop::sample::Index>(),
        ops in prop::collection::vec(arbitrary_op(), 0..60)
    ) {
        let tracks = context(&durations);
        let (mut player, clock, reporter) = player(&tracks);
        let first = &tracks[start.index(tracks.len())];
        player.start_playback(first, &tracks);

        for op in ops {
            match op {
                Op::Seek(target) => player.set_progress(target),
                Op::Tick(secs) => clock.advance(secs),
                Op::Toggle => player.toggle_play(),
                Op::Next => player.play_next(),
                Op::Previous => player.play_previous(),
            }
            player.pump();

            let state = player.state();
            prop_assert!(state.current_track.is_some());
            prop_assert!((0.0..=1.0).contains(&state.volume));
            prop_assert!(state.progress.is_finite() && state.progress >= 0.0);
            prop_assert!(state.progress <= state.duration);
        }

        player.teardown();

        for report in reporter.reports() {
            let track = tracks.iter().find(|t| t.id == report.track_id);
            prop_assert!(track.is_some(), "report for unknown track {}", report.track_id);
            let duration = u64::from(track.map_or(0, |t| t.duration));

            prop_assert!(!report.ranges.is_empty(), "empty batch reported");
            for range in &report.ranges {
                prop_assert!(range.start <= range.end);
                prop_assert!(range.end <= duration, "range {:?} beyond {}", range, duration);
            }
        }
    }

    /// Property: from any start index, len - index - 1 skips reach the last
    /// track and one more changes nothing
    #[test]
    fn next_reaches_last_track_then_stops(
        len in 1usize..30,
        start in any::<prop::sample::Index>()
    ) {
        let tracks = context(&vec![60; len]);
        let index = start.index(len);
        let (mut player, _, _) = player(&tracks);

        player.start_playback(&tracks[index], &tracks);
        for _ in 0..(len - index - 1) {
            player.play_next();
        }
        let last = tracks[len - 1].id.clone();
        prop_assert_eq!(player.state().current_track_id(), Some(&last));

        player.play_next();
        prop_assert_eq!(player.state().current_track_id(), Some(&last));
        prop_assert_eq!(player.queue().current_index(), Some(len - 1));
    }

    /// Property: the queue cursor never leaves the context through navigation
    #[test]
    fn queue_cursor_stays_in_bounds(
        len in 1usize..20,
        moves in prop::collection::vec(any::<bool>(), 0..100)
    ) {
        let mut queue = PlayQueue::default();
        queue.set_context_tracks(context(&vec![60; len]));
        queue.set_current_index(Some(0));

        for forward in moves {
            let moved = if forward { queue.next_track() } else { queue.previous_track() };
            let index = queue.current_index();
            prop_assert!(index.is_some_and(|i| i < len));
            if let Some(track) = moved {
                prop_assert_eq!(Some(&track), queue.current_track());
            }
        }
    }
}
