// Direct-trigger path: pad/key hits go straight to the engine at "now",
// bypassing the clock and the pattern entirely.

use crate::audio_api::{SoundEngine, TriggerEvent};
use crate::shared::{NUM_VOICES, Voice};

/// Presses closer together than this are taken as key auto-repeat when the
/// input source cannot report releases. Covers the usual 250-660 ms initial
/// repeat delay.
pub const DEFAULT_REPEAT_WINDOW: f64 = 0.7;

/// One trigger per physical press. Holding a key never machine-guns.
///
/// With release reporting a voice is held from press to release. Without it,
/// auto-repeat shows up as plain presses, so a press within the repeat window
/// of the previous one (fired or not) counts as a repeat; the key re-arms
/// only after a longer gap.
#[derive(Clone, Debug)]
pub struct KeyGate {
    held: [bool; NUM_VOICES],
    last_press: [Option<f64>; NUM_VOICES],
    tracks_release: bool,
    repeat_window: f64,
}

impl KeyGate {
    pub fn new(tracks_release: bool) -> Self {
        Self {
            held: [false; NUM_VOICES],
            last_press: [None; NUM_VOICES],
            tracks_release,
            repeat_window: DEFAULT_REPEAT_WINDOW,
        }
    }

    pub fn with_repeat_window(mut self, seconds: f64) -> Self {
        self.repeat_window = if seconds.is_finite() { seconds.max(0.0) } else { DEFAULT_REPEAT_WINDOW };
        self
    }

    /// True if this press at `now` should fire.
    pub fn press(&mut self, voice: Voice, now: f64) -> bool {
        let i = voice.index();
        if self.tracks_release {
            if self.held[i] {
                return false;
            }
            self.held[i] = true;
            return true;
        }
        let previous = self.last_press[i].replace(now);
        !previous.is_some_and(|t| now - t < self.repeat_window)
    }

    pub fn release(&mut self, voice: Voice) {
        let i = voice.index();
        self.held[i] = false;
        self.last_press[i] = None;
    }

    pub fn is_held(&self, voice: Voice) -> bool {
        self.held[voice.index()]
    }

    pub fn tracks_release(&self) -> bool {
        self.tracks_release
    }

    pub fn repeat_window(&self) -> f64 {
        self.repeat_window
    }
}

impl Default for KeyGate {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DirectTrigger {
    gate: KeyGate,
}

impl DirectTrigger {
    pub fn new(gate: KeyGate) -> Self {
        Self { gate }
    }

    /// Fire `voice` at `now`. Silently does nothing until the engine is ready.
    pub fn fire<E: SoundEngine>(&self, engine: &mut E, voice: Voice, now: f64, bpm: f64) -> bool {
        if !engine.state().is_ready() {
            log::debug!("ignoring {voice} hit, sound engine not started");
            return false;
        }
        engine.trigger(TriggerEvent::new(voice, now, bpm));
        true
    }

    /// Key-down from an input device.
    pub fn press<E: SoundEngine>(&mut self, engine: &mut E, voice: Voice, now: f64, bpm: f64) -> bool {
        if !self.gate.press(voice, now) {
            return false;
        }
        self.fire(engine, voice, now, bpm)
    }

    pub fn release(&mut self, voice: Voice) {
        self.gate.release(voice);
    }

    pub fn gate(&self) -> &KeyGate {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_fixture::RecordingEngine;

    #[test]
    fn held_key_fires_once() {
        let mut gate = KeyGate::new(true);
        assert!(gate.press(Voice::Kick, 0.0));
        assert!(!gate.press(Voice::Kick, 0.5));
        assert!(!gate.press(Voice::Kick, 5.0));
        assert!(gate.press(Voice::Snare, 5.0)); // other keys are independent
        gate.release(Voice::Kick);
        assert!(!gate.is_held(Voice::Kick));
        assert!(gate.press(Voice::Kick, 5.01));
    }

    #[test]
    fn auto_repeat_without_release_events_fires_once() {
        let mut engine = RecordingEngine::new();
        engine.initialize().unwrap();
        let mut direct = DirectTrigger::new(KeyGate::new(false));
        // a 300 ms hold arriving as presses every 30 ms
        let fired = (0..10)
            .filter(|i| direct.press(&mut engine, Voice::Kick, *i as f64 * 0.03, 120.0))
            .count();
        assert_eq!(fired, 1);
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn repeats_keep_the_key_disarmed_until_a_gap() {
        let mut gate = KeyGate::new(false).with_repeat_window(0.5);
        assert!(gate.press(Voice::Crash, 0.0));
        // initial repeat delay, then a long run of repeats
        let mut t = 0.4;
        while t < 3.0 {
            assert!(!gate.press(Voice::Crash, t));
            t += 0.03;
        }
        assert!(gate.press(Voice::Crash, t + 0.6));
        assert!(gate.press(Voice::Snare, t + 0.6));
        assert!(!gate.is_held(Voice::Crash));
    }

    #[test]
    fn release_rearms_immediately() {
        let mut gate = KeyGate::new(false);
        assert!(gate.press(Voice::Perc, 1.0));
        gate.release(Voice::Perc);
        assert!(gate.press(Voice::Perc, 1.1));
    }
}
