//! End-to-end scenarios: the controller driving the offline backend.

use approx::assert_relative_eq;
use crossbeat::{
    error::AudioActivationError,
    highlight::Highlight,
    playback::{OfflineBackend, PlaybackController, PlaybackState, START_LEAD_SECONDS},
    rhythm::Side,
    transport::TransportState,
};

const STEP: f64 = 0.005;

fn controller() -> PlaybackController<OfflineBackend> {
    PlaybackController::new(OfflineBackend::new())
}

/// Advance in small steps, collecting every distinct lit square per side
fn run_collecting(
    c: &mut PlaybackController<OfflineBackend>,
    seconds: f64,
) -> (Vec<usize>, Vec<usize>) {
    let mut seen: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    let mut last = [Highlight::NotStarted; 2];
    let steps = (seconds / STEP).round() as usize;
    for _ in 0..steps {
        c.backend_mut().advance(STEP);
        for (i, side) in Side::BOTH.into_iter().enumerate() {
            let voice = c.voice(side);
            if voice.highlight != last[i] {
                last[i] = voice.highlight;
                if let Some(square) = voice.lit_square() {
                    seen[i].push(square);
                }
            }
        }
    }
    let [left, right] = seen;
    (left, right)
}

#[test]
fn three_against_four_end_to_end() {
    let mut c = controller();
    c.start().unwrap();
    assert_eq!(c.state(), PlaybackState::Running);
    assert_relative_eq!(c.backend().transport().bpm(), 480.0);

    // One cycle (4 measures at 480 BPM) after the start lead, minus a little
    let (left, right) = run_collecting(&mut c, START_LEAD_SECONDS + 1.95);
    assert_eq!(left, vec![0, 1, 2]);
    assert_eq!(right, vec![0, 1, 2, 3]);

    let left_notes: Vec<_> = c.backend().notes_for(Side::Left).collect();
    let right_notes: Vec<_> = c.backend().notes_for(Side::Right).collect();
    assert_eq!(left_notes.len(), 3);
    assert_eq!(right_notes.len(), 4);
    assert!(left_notes.iter().all(|n| n.pitch.to_string() == "C4"));
    assert!(right_notes.iter().all(|n| n.pitch.to_string() == "F3"));
    assert!(c.backend().notes().iter().all(|n| n.duration == 0.1));

    // Left every 4/3 measure, right every measure
    assert_relative_eq!(left_notes[1].time - left_notes[0].time, 2.0 / 3.0, epsilon = 1e-6);
    assert_relative_eq!(right_notes[1].time - right_notes[0].time, 0.5, epsilon = 1e-6);
    assert_relative_eq!(left_notes[0].time, START_LEAD_SECONDS, epsilon = 1e-6);
    assert_relative_eq!(right_notes[0].time, START_LEAD_SECONDS, epsilon = 1e-6);
}

#[test]
fn voices_fire_in_ratio_over_many_cycles() {
    let mut c = controller();
    c.set_left_beats(5).unwrap();
    c.set_right_beats(7).unwrap();
    c.set_tempo(100.0);
    c.start().unwrap();

    // 700 BPM: one 7-measure cycle lasts 2.4s
    c.backend_mut().advance(START_LEAD_SECONDS + 3.0 * 2.4 - 0.01);
    assert_eq!(c.backend().notes_for(Side::Left).count(), 15);
    assert_eq!(c.backend().notes_for(Side::Right).count(), 21);
}

#[test]
fn double_start_keeps_one_generation() {
    let mut once = controller();
    once.start().unwrap();
    once.backend_mut().advance(1.0);

    let mut twice = controller();
    twice.start().unwrap();
    let handles = twice.loop_handles();
    twice.start().unwrap();
    assert_eq!(twice.loop_handles(), handles);
    assert_eq!(twice.backend().transport().loop_count(), 2);
    assert_eq!(twice.backend().activations(), 1);
    twice.backend_mut().advance(1.0);

    assert_eq!(once.backend().notes().len(), twice.backend().notes().len());
    assert_eq!(once.highlight(Side::Right), twice.highlight(Side::Right));
}

#[test]
fn stop_silences_then_halts() {
    let mut c = controller();
    c.start().unwrap();
    c.backend_mut().advance(1.0);
    let fired = c.backend().notes().len();

    c.stop();
    assert_eq!(c.state(), PlaybackState::Stopped);
    assert_eq!(c.highlight(Side::Left), Highlight::Stopped);
    assert_eq!(c.highlight(Side::Right), Highlight::Stopped);
    assert_eq!(c.backend().transport().loop_count(), 0);

    let fade = *c.backend().volume_changes().last().unwrap();
    assert_relative_eq!(fade.target_db, -100.0);
    assert_relative_eq!(fade.complete_at, 1.3, epsilon = 1e-9);

    c.backend_mut().advance(1.0);
    let halted = c.backend().transport().last_halt().unwrap();
    assert!(halted > fade.complete_at);
    assert_eq!(c.backend().transport().state(), TransportState::Stopped);
    assert_eq!(c.backend().notes().len(), fired);
    assert_eq!(c.highlight(Side::Left), Highlight::Stopped);
}

#[test]
fn restart_during_fade_runs_from_the_top() {
    let mut c = controller();
    c.start().unwrap();
    c.backend_mut().advance(1.0);
    c.stop();
    c.backend_mut().advance(0.1);

    c.start().unwrap();
    assert_eq!(c.highlight(Side::Left), Highlight::NotStarted);
    assert_relative_eq!(c.backend().volume_db(), -20.0);
    c.backend_mut().take_notes();

    c.backend_mut().advance(START_LEAD_SECONDS + 0.01);
    assert_eq!(c.highlight(Side::Left), Highlight::Active(0));
    assert_eq!(c.highlight(Side::Right), Highlight::Active(0));
    assert_eq!(c.backend().notes().len(), 2);
}

#[test]
fn rebuild_cancels_previous_generation() {
    let mut c = controller();
    c.start().unwrap();
    c.backend_mut().advance(0.8);
    let old = c.loop_handles();

    c.set_left_beats(5).unwrap();
    let new = c.loop_handles();
    assert_eq!(new.len(), 2);
    for handle in &old {
        assert!(!c.backend().transport().is_scheduled(*handle));
        assert!(!new.contains(handle));
    }
    assert_eq!(c.backend().transport().loop_count(), 2);

    // The new generation counts from zero
    c.backend_mut().take_notes();
    c.backend_mut().advance(2.0);
    assert!(matches!(c.highlight(Side::Left), Highlight::Active(_)));
    let left = c.backend().notes_for(Side::Left).count();
    let right = c.backend().notes_for(Side::Right).count();
    assert!(left >= 4 && left <= 5, "left fired {left}");
    assert!(right >= 3 && right <= 4, "right fired {right}");
}

#[test]
fn note_change_while_running_uses_new_pitch() {
    let mut c = controller();
    c.start().unwrap();
    c.backend_mut().advance(0.5);
    c.set_note(Side::Right, "Bb2".parse().unwrap()).unwrap();
    c.backend_mut().take_notes();
    c.backend_mut().advance(1.0);
    assert!(c
        .backend()
        .notes_for(Side::Right)
        .all(|n| n.pitch.to_string() == "Bb2"));
}

#[test]
fn tempo_change_ramps_transport() {
    let mut c = controller();
    c.start().unwrap();
    c.backend_mut().advance(0.5);
    c.set_tempo(60.0);
    assert_relative_eq!(c.backend().transport().target_bpm(), 240.0);
    c.backend_mut().advance(0.1);
    let mid = c.backend().transport().bpm();
    assert!(mid < 480.0 && mid > 240.0);
    c.backend_mut().advance(0.2);
    assert_relative_eq!(c.backend().transport().bpm(), 240.0);
}

#[test]
fn failed_activation_leaves_everything_stopped() {
    let mut c = PlaybackController::new(OfflineBackend::denying("autoplay blocked"));
    let err = c.start().unwrap_err();
    assert_eq!(err, AudioActivationError::Denied("autoplay blocked".into()));
    assert_eq!(c.state(), PlaybackState::Stopped);
    assert_eq!(c.backend().transport().loop_count(), 0);

    c.backend_mut().advance(2.0);
    assert!(c.backend().notes().is_empty());
    assert_eq!(c.highlight(Side::Left), Highlight::NotStarted);
}

#[test]
fn stale_right_count_keeps_playing() {
    let mut c = controller();
    c.set_left_beats(10).unwrap();
    c.set_right_beats(50).unwrap();
    c.set_left_beats(2).unwrap();

    assert_eq!(c.rhythm().bounds(Side::Right), (2, 12));
    assert_eq!(c.rhythm().right_beats(), 50);
    assert!(c.rhythm().right_exceeds_bound());
    assert!(!c.error(Side::Right));

    c.start().unwrap();
    assert_relative_eq!(c.transport_bpm(), 6000.0);

    // Editing the right count now validates against the new bound
    assert!(c.set_right_beats(50).is_err());
    assert!(c.error(Side::Right));
    assert_eq!(c.rhythm().right_beats(), 50);
    c.set_right_beats(12).unwrap();
    assert!(!c.rhythm().right_exceeds_bound());
}

#[test]
fn rejected_text_input_flags_without_rebuild() {
    let mut c = controller();
    c.start().unwrap();
    let handles = c.loop_handles();
    assert!(c.set_beats_text(Side::Left, "abc").is_err());
    assert!(c.set_beats_text(Side::Left, "1").is_err());
    assert!(c.error(Side::Left));
    assert_eq!(c.loop_handles(), handles);

    assert_eq!(c.set_beats_text(Side::Left, " 7 ").unwrap(), 7);
    assert!(!c.error(Side::Left));
    assert_ne!(c.loop_handles(), handles);
}

#[test]
fn rebuild_on_a_fired_slot_does_not_repeat_it() {
    let mut c = controller();
    c.start().unwrap();
    c.backend_mut().advance(START_LEAD_SECONDS);
    // Lands exactly on the second right beat (one measure = 0.5s at 480 BPM)
    c.backend_mut().advance(0.5);
    c.set_note(Side::Right, "Bb2".parse().unwrap()).unwrap();
    c.backend_mut().advance(0.01);

    let right: Vec<(f64, String)> = c
        .backend()
        .notes_for(Side::Right)
        .map(|n| (n.time, n.pitch.to_string()))
        .collect();
    assert_eq!(right.len(), 2, "right fired {right:?}");
    assert_relative_eq!(right[1].0, 0.6, epsilon = 1e-9);
    assert_eq!(right[1].1, "F3");
    assert_eq!(c.highlight(Side::Right), Highlight::Active(1));

    // The new generation picks up on the following slot
    c.backend_mut().advance(0.5);
    let next = c.backend().notes_for(Side::Right).last().unwrap();
    assert_eq!(next.pitch.to_string(), "Bb2");
    assert_relative_eq!(next.time, 1.1, epsilon = 1e-9);
    assert_eq!(c.highlight(Side::Right), Highlight::Active(0));
}

#[test]
fn half_interval_steps_pair_each_note_with_its_square() {
    let mut c = controller();
    c.start().unwrap();
    let bpm = c.transport_bpm();
    let shortest = c
        .loops()
        .iter()
        .map(|l| l.interval().to_seconds(bpm))
        .fold(f64::INFINITY, f64::min);
    let step = 0.01f64.min(shortest / 2.0);

    let mut squares: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    let mut elapsed = 0.0;
    while elapsed < START_LEAD_SECONDS + 3.95 {
        c.backend_mut().advance(step);
        elapsed += step;
        for note in c.backend_mut().take_notes() {
            let square = c.voice(note.side).lit_square().unwrap();
            squares[if note.side == Side::Left { 0 } else { 1 }].push(square);
        }
    }
    assert_eq!(squares[0], vec![0, 1, 2, 0, 1, 2]);
    assert_eq!(squares[1], vec![0, 1, 2, 3, 0, 1, 2, 3]);
}
