// Musical time. Ticks are scheduled at absolute positions on a monotonic
// timeline and handed out a little ahead of time, so whoever receives them can
// schedule sound for the exact tick time even when the host loop runs late.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::DrumError;
use crate::shared::{BPM_MAX, BPM_MIN, DEFAULT_BPM, STEPS_PER_BEAT, STEPS_PER_PATTERN};

/// Seconds on a monotonic timeline shared by the sequencer and the engine.
pub trait TimeSource {
    fn now(&self) -> f64;
}

#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Sixteenth-note length at `bpm`.
pub fn step_duration(bpm: f64) -> f64 {
    60.0 / (bpm * STEPS_PER_BEAT)
}

/// Clamp into the supported tempo range. Non-finite input is rejected.
pub fn clamp_tempo(bpm: f64) -> Result<f64, DrumError> {
    if !bpm.is_finite() {
        return Err(DrumError::InvalidTempo(bpm));
    }
    Ok(bpm.clamp(BPM_MIN, BPM_MAX))
}

/// One step boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub index: u64,   // ticks since start
    pub step: usize,  // index % 16
    pub time: f64,    // when it should sound
    pub generation: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct ClockSettings {
    pub lookahead: Duration,
    pub max_lateness: Duration,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(100),
            max_lateness: Duration::from_millis(250),
        }
    }
}

/// Tempo-driven tick scheduler.
///
/// Tick `n` lands at `anchor_time + (n - anchor_index) * step_duration`.
/// Changing the tempo re-anchors on the last tick already handed out, so
/// nothing that was scheduled moves and later ticks follow the new rate.
#[derive(Debug)]
pub struct TransportClock {
    bpm: f64,
    settings: ClockSettings,
    running: bool,
    generation: u64,
    anchor_time: f64,
    anchor_index: u64,
    next_index: u64, // first tick not yet handed out
}

impl TransportClock {
    pub fn new(bpm: f64, settings: ClockSettings) -> Self {
        Self {
            bpm: clamp_tempo(bpm).unwrap_or(DEFAULT_BPM),
            settings,
            running: false,
            generation: 0,
            anchor_time: 0.0,
            anchor_index: 0,
            next_index: 0,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn step_duration(&self) -> f64 {
        step_duration(self.bpm)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> ClockSettings {
        self.settings
    }

    /// Returns the tempo actually applied.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<f64, DrumError> {
        let bpm = clamp_tempo(bpm)?;
        if self.running && self.next_index > 0 {
            let last = self.next_index - 1;
            self.anchor_time = self.tick_time(last);
            self.anchor_index = last;
        }
        self.bpm = bpm;
        Ok(bpm)
    }

    /// Begin a run with step 0 at `now`. Returns false if already running.
    pub fn start(&mut self, now: f64) -> bool {
        if self.running {
            return false;
        }
        self.generation += 1;
        self.running = true;
        self.anchor_time = now;
        self.anchor_index = 0;
        self.next_index = 0;
        true
    }

    /// Halt and forget every tick not yet handed out. Returns false if idle.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.generation += 1;
        self.running = false;
        self.next_index = 0;
        true
    }

    /// Cancel the current run (if any), then begin a new one at `now`.
    /// Returns the new generation.
    pub fn replace_subscription(&mut self, now: f64) -> u64 {
        self.stop();
        self.start(now);
        self.generation
    }

    /// Scheduled time of the next tick, if running.
    pub fn next_tick_time(&self) -> Option<f64> {
        self.running.then(|| self.tick_time(self.next_index))
    }

    /// Hand out every tick due by `now + lookahead`, oldest first.
    pub fn poll(&mut self, now: f64) -> Vec<Tick> {
        let mut ticks = Vec::new();
        if !self.running {
            return ticks;
        }

        // host stalled (suspend, debugger, ...): resume from here instead of
        // dumping a burst of stale steps into the engine
        let late_by = now - self.tick_time(self.next_index);
        if late_by > self.settings.max_lateness.as_secs_f64() {
            log::warn!(
                "transport fell {:.0} ms behind, re-anchoring at step {}",
                late_by * 1000.0,
                self.next_index % STEPS_PER_PATTERN as u64
            );
            self.anchor_time = now;
            self.anchor_index = self.next_index;
        }

        let horizon = now + self.settings.lookahead.as_secs_f64();
        loop {
            let time = self.tick_time(self.next_index);
            if time > horizon {
                break;
            }
            ticks.push(Tick {
                index: self.next_index,
                step: (self.next_index % STEPS_PER_PATTERN as u64) as usize,
                time,
                generation: self.generation,
            });
            self.next_index += 1;
        }
        ticks
    }

    fn tick_time(&self, index: u64) -> f64 {
        let offset = index.saturating_sub(self.anchor_index) as f64;
        self.anchor_time + offset * self.step_duration()
    }
}

impl Default for TransportClock {
    fn default() -> Self {
        Self::new(DEFAULT_BPM, ClockSettings::default())
    }
}
