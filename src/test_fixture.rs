// Purely for testing: an engine that makes no sound and just writes down what
// it was asked to play, plus a sequencer wired to a hand-driven clock.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::audio_api::{EngineState, SoundEngine, TriggerEvent};
use crate::error::DrumError;
use crate::sequencer::{ClockSettings, ManualClock, Sequencer};

#[derive(Debug, Default)]
struct Log {
    state: EngineState,
    fail_init: bool,
    init_calls: usize,
    cancel_calls: usize,
    events: Vec<TriggerEvent>,
}

/// Clones share one log, so a test can keep a handle after moving the engine
/// into a sequencer.
#[derive(Clone, Debug, Default)]
pub struct RecordingEngine {
    log: Arc<Mutex<Log>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose `initialize` fails until told otherwise.
    pub fn failing() -> Self {
        let engine = Self::new();
        engine.set_fail_init(true);
        engine
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.lock().fail_init = fail;
    }

    pub fn events(&self) -> Vec<TriggerEvent> {
        self.lock().events.clone()
    }

    pub fn take_events(&self) -> Vec<TriggerEvent> {
        std::mem::take(&mut self.lock().events)
    }

    pub fn init_calls(&self) -> usize {
        self.lock().init_calls
    }

    pub fn cancel_calls(&self) -> usize {
        self.lock().cancel_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SoundEngine for RecordingEngine {
    fn initialize(&mut self) -> Result<(), DrumError> {
        let mut log = self.lock();
        log.init_calls += 1;
        if log.fail_init {
            log.state = EngineState::Failed;
            return Err(DrumError::EngineInit("no audio device (test)".into()));
        }
        log.state = EngineState::Ready;
        Ok(())
    }

    fn state(&self) -> EngineState {
        self.lock().state
    }

    fn trigger(&mut self, event: TriggerEvent) {
        self.lock().events.push(event);
    }

    fn cancel_pending(&mut self) {
        self.lock().cancel_calls += 1;
    }
}

/// Sequencer on a manual clock at t = 0 with no lookahead, so every tick is
/// released exactly when the clock reaches it.
pub fn manual_sequencer() -> (Sequencer<RecordingEngine, ManualClock>, ManualClock, RecordingEngine) {
    let engine = RecordingEngine::new();
    let clock = ManualClock::new();
    let seq = Sequencer::new(engine.clone(), clock.clone()).with_clock_settings(ClockSettings {
        lookahead: Duration::ZERO,
        max_lateness: Duration::from_secs(3600),
    });
    (seq, clock, engine)
}
