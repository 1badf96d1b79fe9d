// End-to-end runs of the sequencer against a recording engine on a hand-driven
// clock.

use std::time::Duration;

use beatgrid::sequencer::{ClockSettings, TimeSource, TransportState};
use beatgrid::shared::{NUM_VOICES, STEPS_PER_PATTERN};
use beatgrid::test_fixture::manual_sequencer;
use beatgrid::{EngineState, Voice};

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn four_on_the_floor_at_120() {
    let (mut seq, clock, engine) = manual_sequencer();
    seq.initialize_engine().unwrap();
    for step in [0, 4, 8, 12] {
        seq.toggle(Voice::Kick, step).unwrap();
    }
    seq.set_tempo(120.0).unwrap();

    clock.set(10.0);
    seq.start();
    for _ in 1..STEPS_PER_PATTERN {
        clock.advance(0.125);
        seq.pump();
    }

    let kicks: Vec<f64> = engine
        .events()
        .iter()
        .filter(|e| e.voice == Voice::Kick)
        .map(|e| e.at - 10.0)
        .collect();
    assert_eq!(kicks.len(), 4);
    for (got, want) in kicks.iter().zip([0.0, 0.5, 1.0, 1.5]) {
        assert_close(*got, want);
    }
    assert_eq!(engine.events().len(), 4);
}

#[test]
fn same_result_with_lookahead_and_a_sloppy_host() {
    let (seq, clock, engine) = manual_sequencer();
    let mut seq = seq.with_clock_settings(ClockSettings {
        lookahead: Duration::from_millis(100),
        max_lateness: Duration::from_millis(250),
    });
    seq.initialize_engine().unwrap();
    for step in [0, 4, 8, 12] {
        seq.toggle(Voice::Kick, step).unwrap();
    }
    seq.start();
    // frames arriving every ~17 ms with jitter
    let mut now: f64 = 0.0;
    while now < 1.8 {
        now += 0.017 + if (now * 1000.0) as u64 % 3 == 0 { 0.009 } else { 0.0 };
        clock.set(now);
        seq.pump();
    }
    let kicks: Vec<f64> = engine.events().iter().map(|e| e.at).collect();
    assert_eq!(kicks.len(), 4);
    for (got, want) in kicks.iter().zip([0.0, 0.5, 1.0, 1.5]) {
        assert_close(*got, want);
    }
}

#[test]
fn stop_then_start_never_doubles_triggers() {
    let (mut seq, clock, engine) = manual_sequencer();
    seq.initialize_engine().unwrap();
    for voice in Voice::ALL {
        seq.toggle(voice, 0).unwrap();
        seq.toggle(voice, 8).unwrap();
    }

    seq.start();
    clock.advance(0.125 * 3.0);
    seq.pump();
    seq.stop();
    engine.take_events();
    seq.start(); // same instant
    assert_eq!(seq.current_step(), 0);

    let start = clock.now();
    for _ in 1..STEPS_PER_PATTERN {
        clock.advance(0.125);
        seq.pump();
    }
    let events = engine.events();
    // one full pass: every voice on step 0 and on step 8, exactly once each
    assert_eq!(events.len(), 2 * NUM_VOICES);
    let on_zero = events.iter().filter(|e| (e.at - start).abs() < 1e-9).count();
    let on_eight = events.iter().filter(|e| (e.at - (start + 1.0)).abs() < 1e-9).count();
    assert_eq!((on_zero, on_eight), (NUM_VOICES, NUM_VOICES));
}

#[test]
fn tempo_change_mid_run_keeps_ticks_strictly_ordered() {
    let (mut seq, clock, engine) = manual_sequencer();
    seq.initialize_engine().unwrap();
    for step in 0..STEPS_PER_PATTERN {
        seq.toggle(Voice::HiHat, step).unwrap();
    }
    seq.start();
    let tempos = [180.0, 80.0, 133.0, 95.0, 500.0, 10.0];
    for (i, bpm) in tempos.iter().enumerate() {
        for _ in 0..5 {
            clock.advance(0.03 + i as f64 * 0.01);
            seq.pump();
        }
        seq.set_tempo(*bpm).unwrap();
    }
    let times: Vec<f64> = engine.events().iter().map(|e| e.at).collect();
    assert!(times.len() > 5);
    for pair in times.windows(2) {
        assert!(pair[1] > pair[0], "{pair:?}");
    }
}

#[test]
fn cursor_is_zero_whenever_idle() {
    let (mut seq, clock, _engine) = manual_sequencer();
    seq.initialize_engine().unwrap();
    let mut last = None;
    for round in 0..5 {
        assert_eq!(seq.state(), TransportState::Idle);
        assert_eq!(seq.current_step(), 0);
        seq.start();
        for _ in 0..(round * 7 + 3) {
            clock.advance(0.125);
            seq.pump();
            let step = seq.current_step();
            if let Some(prev) = last {
                assert_eq!(step, (prev + 1) % STEPS_PER_PATTERN);
            }
            last = Some(step);
        }
        seq.stop();
        last = None;
    }
}

#[test]
fn nothing_sounds_before_the_engine_is_up() {
    let (mut seq, _clock, engine) = manual_sequencer();
    seq.toggle(Voice::Kick, 0).unwrap();
    assert_eq!(seq.engine_state(), EngineState::Uninitialized);
    for voice in Voice::ALL {
        assert!(!seq.trigger(voice));
        assert!(!seq.press(voice));
    }
    assert!(!seq.start());
    seq.pump();
    assert!(engine.events().is_empty());
}

#[test]
fn randomize_extremes() {
    let (seq, _clock, _engine) = manual_sequencer();
    seq.randomize_with(&[0.0; NUM_VOICES]);
    assert_eq!(seq.snapshot().count_active(), 0);
    seq.randomize_with(&[1.0; NUM_VOICES]);
    assert_eq!(seq.snapshot().count_active(), NUM_VOICES * STEPS_PER_PATTERN);
    seq.clear();
    assert_eq!(seq.snapshot().count_active(), 0);
}

#[test]
fn pattern_edits_while_running_apply_from_the_next_tick() {
    let (mut seq, clock, engine) = manual_sequencer();
    seq.initialize_engine().unwrap();
    seq.start();
    seq.toggle(Voice::Snare, 1).unwrap();
    clock.advance(0.125);
    seq.pump();
    let events = engine.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].voice, Voice::Snare);
    assert_close(events[0].at, 0.125);
}
