//! Startup configuration, read from an optional JSON file.
//!
//! Only knobs live here. The pattern itself is never written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DrumError;
use crate::pipeline::clamp_probability;
use crate::sequencer::clock::{ClockSettings, clamp_tempo};
use crate::sequencer::DEFAULT_DENSITIES;
use crate::sequencer::trigger::DEFAULT_REPEAT_WINDOW;
use crate::shared::{DEFAULT_BPM, NUM_VOICES, Voice};

// lookahead past this releases more hits than the render queue holds at top
// tempo and makes tempo changes audibly late
const MAX_LOOKAHEAD_MS: u64 = 250;
const MIN_LATENESS_MS: u64 = 50;
const MAX_LATENESS_MS: u64 = 2_000;
const MAX_REPEAT_WINDOW_MS: u64 = 2_000;

/// Probability that randomize lights up a step, per voice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Densities {
    pub kick: f64,
    pub snare: f64,
    pub hihat: f64,
    pub openhat: f64,
    pub crash: f64,
    pub perc: f64,
}

impl Default for Densities {
    fn default() -> Self {
        Self::from_array(DEFAULT_DENSITIES)
    }
}

impl Densities {
    pub fn from_array(d: [f64; NUM_VOICES]) -> Self {
        Self {
            kick: d[Voice::Kick.index()],
            snare: d[Voice::Snare.index()],
            hihat: d[Voice::HiHat.index()],
            openhat: d[Voice::OpenHat.index()],
            crash: d[Voice::Crash.index()],
            perc: d[Voice::Perc.index()],
        }
    }

    /// Indexed by `Voice::index`, clamped to [0, 1].
    pub fn to_array(&self) -> [f64; NUM_VOICES] {
        [self.kick, self.snare, self.hihat, self.openhat, self.crash, self.perc].map(clamp_probability)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bpm: f64,
    pub lookahead_ms: u64,
    pub max_lateness_ms: u64,
    pub repeat_window_ms: u64,
    pub densities: Densities,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let clock = ClockSettings::default();
        Self {
            bpm: DEFAULT_BPM,
            lookahead_ms: clock.lookahead.as_millis() as u64,
            max_lateness_ms: clock.max_lateness.as_millis() as u64,
            repeat_window_ms: (DEFAULT_REPEAT_WINDOW * 1000.0).round() as u64,
            densities: Densities::default(),
            log_file: Some(PathBuf::from("beatgrid.log")),
        }
    }
}

impl Config {
    /// Read `path`. A missing file is not an error: defaults are returned.
    pub fn load(path: &Path) -> Result<Self, DrumError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    /// Clock knobs, clamped. Lateness is never below the lookahead, or every
    /// released tick would count as late.
    pub fn clock_settings(&self) -> ClockSettings {
        let lookahead = self.lookahead_ms.min(MAX_LOOKAHEAD_MS);
        let max_lateness = self.max_lateness_ms.clamp(MIN_LATENESS_MS, MAX_LATENESS_MS).max(lookahead);
        if lookahead != self.lookahead_ms || max_lateness != self.max_lateness_ms {
            log::warn!("clock settings clamped to lookahead {lookahead} ms, max lateness {max_lateness} ms");
        }
        ClockSettings {
            lookahead: Duration::from_millis(lookahead),
            max_lateness: Duration::from_millis(max_lateness),
        }
    }

    /// Auto-repeat window in seconds for terminals without key releases.
    pub fn repeat_window(&self) -> f64 {
        self.repeat_window_ms.min(MAX_REPEAT_WINDOW_MS) as f64 / 1000.0
    }

    /// Starting tempo, clamped into range. Garbage falls back to the default.
    pub fn tempo(&self) -> f64 {
        clamp_tempo(self.bpm).unwrap_or(DEFAULT_BPM)
    }
}
