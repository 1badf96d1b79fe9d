// The contract between the sequencing core and whatever makes sound.
// The core only ever says "voice V, at time T, shaped like S"; synthesis is
// the engine's business.

use crate::error::DrumError;
use crate::shared::{STEPS_PER_BEAT, Voice};

/// Note values used as duration hints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteLength {
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl NoteLength {
    /// Length in beats (quarter notes).
    pub fn beats(self) -> f64 {
        match self {
            NoteLength::Half => 2.0,
            NoteLength::Quarter => 1.0,
            NoteLength::Eighth => 0.5,
            NoteLength::Sixteenth => 1.0 / STEPS_PER_BEAT,
            NoteLength::ThirtySecond => 0.5 / STEPS_PER_BEAT,
        }
    }

    pub fn seconds(self, bpm: f64) -> f64 {
        self.beats() * 60.0 / bpm
    }
}

/// Pitch/duration hints for a voice. Not audio parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerShape {
    pub pitch_hz: f32,
    pub length: NoteLength,
}

/// "Play this voice at this time." Ephemeral, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerEvent {
    pub voice: Voice,
    pub at: f64, // seconds on the shared monotonic timeline
    pub shape: TriggerShape,
    pub gate: f64, // shape.length resolved at the tempo in effect when issued
}

impl TriggerEvent {
    pub fn new(voice: Voice, at: f64, bpm: f64) -> Self {
        let shape = voice.info().shape;
        Self {
            voice,
            at,
            shape,
            gate: shape.length.seconds(bpm),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Ready,
    Failed,
}

impl EngineState {
    pub fn is_ready(self) -> bool {
        self == EngineState::Ready
    }
}

/// Anything that can turn trigger events into sound.
///
/// Lifecycle is `Uninitialized -> Ready`, or `-> Failed` when `initialize`
/// errors. A failed engine may be initialized again.
pub trait SoundEngine {
    fn initialize(&mut self) -> Result<(), DrumError>;

    fn state(&self) -> EngineState;

    /// Fire and forget.
    fn trigger(&mut self, event: TriggerEvent);

    /// Drop anything scheduled that has not started sounding yet.
    fn cancel_pending(&mut self) {}
}

// What actually crosses the channel into the audio callback.
#[derive(Clone, Debug)]
pub enum AudioCommand {
    Trigger(TriggerEvent),
    CancelPending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_lengths_scale_with_tempo() {
        assert_eq!(NoteLength::Quarter.seconds(120.0), 0.5);
        assert_eq!(NoteLength::Sixteenth.seconds(120.0), 0.125);
        assert_eq!(NoteLength::Half.seconds(60.0), 2.0);
        assert_eq!(NoteLength::ThirtySecond.seconds(120.0), 0.0625);
    }

    #[test]
    fn trigger_event_resolves_gate_from_voice_shape() {
        let ev = TriggerEvent::new(Voice::Kick, 1.5, 120.0);
        assert_eq!(ev.voice, Voice::Kick);
        assert_eq!(ev.at, 1.5);
        assert_eq!(ev.shape.length, NoteLength::Eighth);
        assert_eq!(ev.gate, 0.25);
    }
}
