/// Sequencer - binds transport ticks to pattern reads and engine triggers.
///
/// The host drives it by calling [`Sequencer::pump`] regularly (every UI frame
/// is plenty). Each pump releases the ticks that fall inside the clock's
/// lookahead window, issues one trigger per active cell at the tick's exact
/// time, and publishes the cursor once a tick's time has actually arrived.
use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::audio_api::{EngineState, SoundEngine, TriggerEvent};
use crate::error::DrumError;
use crate::pipeline::{Pattern, PatternStore, clamp_probability};
use crate::shared::{DEFAULT_BPM, NUM_VOICES, Voice};

pub mod clock;
pub mod transport;
pub mod trigger;

pub use clock::{ClockSettings, ManualClock, MonotonicClock, Tick, TimeSource, TransportClock};
pub use transport::{SharedTransport, Subscribers, TransportEvent, TransportState};
pub use trigger::{DirectTrigger, KeyGate};

const SUBSCRIBER_CAPACITY: usize = 64;

/// How likely each voice's steps are to light up on randomize.
pub const DEFAULT_DENSITIES: [f64; NUM_VOICES] = [0.30, 0.25, 0.50, 0.15, 0.10, 0.20];

pub struct Sequencer<E: SoundEngine, T: TimeSource = MonotonicClock> {
    store: PatternStore,
    clock: TransportClock,
    engine: E,
    time: T,
    direct: DirectTrigger,
    transport: Arc<SharedTransport>,
    subscribers: Subscribers,
    pending: VecDeque<Tick>, // triggered, cursor not yet published
    densities: [f64; NUM_VOICES],
}

impl<E: SoundEngine, T: TimeSource> Sequencer<E, T> {
    pub fn new(engine: E, time: T) -> Self {
        let transport = SharedTransport::new();
        transport.set_bpm(DEFAULT_BPM);
        Self {
            store: PatternStore::new(),
            clock: TransportClock::default(),
            engine,
            time,
            direct: DirectTrigger::default(),
            transport,
            subscribers: Subscribers::default(),
            pending: VecDeque::new(),
            densities: DEFAULT_DENSITIES,
        }
    }

    pub fn with_clock_settings(mut self, settings: ClockSettings) -> Self {
        self.clock = TransportClock::new(self.clock.bpm(), settings);
        self
    }

    pub fn with_key_gate(mut self, gate: KeyGate) -> Self {
        self.direct = DirectTrigger::new(gate);
        self
    }

    pub fn with_densities(mut self, densities: [f64; NUM_VOICES]) -> Self {
        self.densities = densities.map(clamp_probability);
        self
    }

    pub fn with_pattern_store(mut self, store: PatternStore) -> Self {
        self.store = store;
        self
    }

    // ── engine lifecycle ─────────────────────────────────────────

    /// Bring the engine up. Failures are logged and handed back; the
    /// sequencer stays idle and the caller may simply try again.
    pub fn initialize_engine(&mut self) -> Result<(), DrumError> {
        if self.engine.state().is_ready() {
            return Ok(());
        }
        match self.engine.initialize() {
            Ok(()) => {
                log::info!("sound engine ready");
                Ok(())
            }
            Err(e) => {
                log::error!("{e}");
                Err(e)
            }
        }
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // ── transport ────────────────────────────────────────────────

    /// Idle -> Running with step 0 at "now". No-op when already running or
    /// when the engine is not ready yet.
    pub fn start(&mut self) -> bool {
        if !self.engine.state().is_ready() {
            log::debug!("start ignored, sound engine not started");
            return false;
        }
        let now = self.time.now();
        if !self.clock.start(now) {
            return false;
        }
        self.begin_run();
        true
    }

    /// Running -> Idle, cursor back to 0. Nothing scheduled by this run
    /// will sound afterwards.
    pub fn stop(&mut self) -> bool {
        if !self.clock.stop() {
            return false;
        }
        self.dispose_run();
        log::info!("transport stopped");
        true
    }

    /// Replace the current run with a fresh one from step 0. The old run is
    /// fully disposed of before the new one schedules anything.
    pub fn restart(&mut self) -> bool {
        if !self.engine.state().is_ready() {
            log::debug!("restart ignored, sound engine not started");
            return false;
        }
        let was_running = self.clock.is_running();
        let now = self.time.now();
        // cancels the old generation, then begins the new one
        self.clock.replace_subscription(now);
        if was_running {
            self.dispose_run();
        }
        self.begin_run();
        true
    }

    /// Play/stop button. Returns whether the transport is running afterwards.
    pub fn toggle_playback(&mut self) -> bool {
        if self.clock.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.clock.is_running()
    }

    /// Out-of-range tempos are clamped to [80, 180]; returns the applied value.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<f64, DrumError> {
        let applied = self.clock.set_tempo(bpm)?;
        if applied != bpm {
            log::debug!("tempo {bpm} clamped to {applied}");
        }
        self.transport.set_bpm(applied);
        self.subscribers.broadcast(TransportEvent::Tempo(applied));
        Ok(applied)
    }

    pub fn tempo(&self) -> f64 {
        self.clock.bpm()
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    /// Step the cursor is on, as last published. Always 0 while idle.
    pub fn current_step(&self) -> usize {
        self.transport.current_step()
    }

    pub fn transport(&self) -> Arc<SharedTransport> {
        Arc::clone(&self.transport)
    }

    /// Current time on the sequencer's timeline.
    pub fn now(&self) -> f64 {
        self.time.now()
    }

    pub fn subscribe(&mut self) -> Receiver<TransportEvent> {
        self.subscribers.subscribe(SUBSCRIBER_CAPACITY)
    }

    /// Drive the clock. Returns how many ticks were released.
    pub fn pump(&mut self) -> usize {
        let now = self.time.now();
        let ticks = self.clock.poll(now);
        let released = ticks.len();
        if released > 0 {
            let pattern = self.store.snapshot();
            for tick in ticks {
                self.dispatch(tick, &pattern);
            }
        }
        self.publish_due(now);
        released
    }

    // ── pattern ──────────────────────────────────────────────────

    pub fn toggle(&self, voice: Voice, step: usize) -> Result<bool, DrumError> {
        self.store.toggle(voice, step)
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Randomize with the configured per-voice densities.
    pub fn randomize(&self) {
        self.store.randomize(&self.densities);
    }

    pub fn randomize_with(&self, densities: &[f64; NUM_VOICES]) {
        self.store.randomize(densities);
    }

    pub fn snapshot(&self) -> Pattern {
        self.store.snapshot()
    }

    pub fn pattern_store(&self) -> PatternStore {
        self.store.clone()
    }

    pub fn densities(&self) -> &[f64; NUM_VOICES] {
        &self.densities
    }

    // ── direct triggers ──────────────────────────────────────────

    /// Play `voice` right now, regardless of transport or pattern.
    pub fn trigger(&mut self, voice: Voice) -> bool {
        let now = self.time.now();
        self.direct.fire(&mut self.engine, voice, now, self.clock.bpm())
    }

    /// Key-down: like `trigger`, but a held key only fires once.
    pub fn press(&mut self, voice: Voice) -> bool {
        let now = self.time.now();
        self.direct.press(&mut self.engine, voice, now, self.clock.bpm())
    }

    pub fn release(&mut self, voice: Voice) {
        self.direct.release(voice);
    }

    // ── internals ────────────────────────────────────────────────

    fn begin_run(&mut self) {
        self.pending.clear();
        self.transport.set_running();
        self.subscribers.broadcast(TransportEvent::Started);
        log::info!("transport started at {} bpm", self.clock.bpm());
        // step 0 goes out immediately
        self.pump();
    }

    fn dispose_run(&mut self) {
        self.pending.clear();
        self.engine.cancel_pending();
        self.transport.set_idle();
        self.subscribers.broadcast(TransportEvent::Stopped);
    }

    // ticks come straight from `poll`, so they always belong to the current run
    fn dispatch(&mut self, tick: Tick, pattern: &Pattern) {
        let bpm = self.clock.bpm();
        for voice in pattern.active_voices(tick.step) {
            self.engine.trigger(TriggerEvent::new(voice, tick.time, bpm));
        }
        self.pending.push_back(tick);
    }

    fn publish_due(&mut self, now: f64) {
        while let Some(tick) = self.pending.front().copied() {
            if tick.time > now {
                break;
            }
            self.pending.pop_front();
            self.transport.set_step(tick.step);
            self.subscribers.broadcast(TransportEvent::Step {
                step: tick.step,
                time: tick.time,
            });
        }
    }
}
