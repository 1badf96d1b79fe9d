// Types shared between the sequencing core, the middle layer and the TUI.
//
// Keyboard layout (one row of the QWERTY keyboard, one key per voice):
//   q w e r t y   //  VoiceDown(Kick ... Perc) / VoiceUp(...)
//
// Transport and editing:
//   Space         //  PlayPress
//   arrows        //  move the edit cursor (tui only)
//   Enter         //  ToggleStep under the edit cursor
//   c             //  Clear
//   d             //  Randomize
//   [ / ]         //  AdjustBpm(-1 / +1)
//   { / }         //  AdjustBpm(-10 / +10)
//   a             //  StartAudio (the engine stays silent until this is pressed)
//   Esc           //  Quit
//
// The TUI only renders a `DisplayState`; all sequencing state lives behind the
// middle layer.

use std::fmt;
use std::str::FromStr;

use crate::audio_api::{EngineState, NoteLength, TriggerShape};
use crate::error::DrumError;
use crate::pipeline::Pattern;

pub const NUM_VOICES: usize = 6;
pub const STEPS_PER_PATTERN: usize = 16;
pub const STEPS_PER_BEAT: f64 = 4.0; // sixteenth notes

pub const BPM_MIN: f64 = 80.0;
pub const BPM_MAX: f64 = 180.0;
pub const DEFAULT_BPM: f64 = 120.0;

/// One percussive sound source. The set is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Voice {
    Kick,
    Snare,
    HiHat,
    OpenHat,
    Crash,
    Perc,
}

/// Static, non-audio metadata for a voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub key: char, // lowercase key that fires the voice
    pub shape: TriggerShape,
}

impl Voice {
    pub const ALL: [Voice; NUM_VOICES] = [
        Voice::Kick,
        Voice::Snare,
        Voice::HiHat,
        Voice::OpenHat,
        Voice::Crash,
        Voice::Perc,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<Self, DrumError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| DrumError::UnknownVoice(index.to_string()))
    }

    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|v| v.info().key == key)
    }

    pub fn info(self) -> VoiceInfo {
        match self {
            Voice::Kick => VoiceInfo {
                id: "kick",
                label: "KICK",
                key: 'q',
                shape: TriggerShape { pitch_hz: 60.0, length: NoteLength::Eighth },
            },
            Voice::Snare => VoiceInfo {
                id: "snare",
                label: "SNARE",
                key: 'w',
                shape: TriggerShape { pitch_hz: 200.0, length: NoteLength::Eighth },
            },
            Voice::HiHat => VoiceInfo {
                id: "hihat",
                label: "HI-HAT",
                key: 'e',
                shape: TriggerShape { pitch_hz: 8000.0, length: NoteLength::ThirtySecond },
            },
            Voice::OpenHat => VoiceInfo {
                id: "openhat",
                label: "OPEN HAT",
                key: 'r',
                shape: TriggerShape { pitch_hz: 6000.0, length: NoteLength::Quarter },
            },
            Voice::Crash => VoiceInfo {
                id: "crash",
                label: "CRASH",
                key: 't',
                shape: TriggerShape { pitch_hz: 4000.0, length: NoteLength::Half },
            },
            Voice::Perc => VoiceInfo {
                id: "perc",
                label: "PERC",
                key: 'y',
                shape: TriggerShape { pitch_hz: 800.0, length: NoteLength::Sixteenth },
            },
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().id)
    }
}

impl FromStr for Voice {
    type Err = DrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.info().id == wanted)
            .ok_or_else(|| DrumError::UnknownVoice(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // pads
    VoiceDown(Voice),
    VoiceUp(Voice),

    // transport
    PlayPress,
    AdjustBpm(f64),
    StartAudio,

    // grid editing, resolved by the tui from its edit cursor
    ToggleStep { voice: Voice, step: usize },
    Clear,
    Randomize,

    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub grid: Pattern,
    pub playing_step: Option<usize>, // only while running
    pub playing: bool,
    pub bpm: f64,
    pub engine: EngineState,
    pub pads_lit: [bool; NUM_VOICES], // pads flash briefly after a hit
    pub status: String,
}
