// Transport - what the outside world gets to see of the sequencer.
// Readable from any thread via atomics; pushes events to subscribers without
// ever blocking the thread that drives the clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::shared::DEFAULT_BPM;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Idle,
    Running,
}

impl TransportState {
    pub fn is_running(&self) -> bool {
        matches!(self, TransportState::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    Started,
    /// The cursor reached `step`, scheduled for `time`.
    Step { step: usize, time: f64 },
    Stopped,
    Tempo(f64),
}

const IDLE: usize = 0;

/// Pollable transport state, shared with the presentation layer.
///
/// Running flag and cursor live in one word (`0` idle, `step + 1` running),
/// so a single load can never pair Idle with a non-zero step. Use
/// [`SharedTransport::position`] when both halves are needed together.
#[derive(Debug)]
pub struct SharedTransport {
    position: AtomicUsize,
    bpm_bits: AtomicU64,
}

impl SharedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// State and cursor from one consistent read.
    pub fn position(&self) -> (TransportState, usize) {
        match self.position.load(Ordering::Acquire) {
            IDLE => (TransportState::Idle, 0),
            p => (TransportState::Running, p - 1),
        }
    }

    pub fn state(&self) -> TransportState {
        self.position().0
    }

    pub fn current_step(&self) -> usize {
        self.position().1
    }

    pub fn bpm(&self) -> f64 {
        f64::from_bits(self.bpm_bits.load(Ordering::Relaxed))
    }

    pub(crate) fn set_running(&self) {
        self.position.store(1, Ordering::Release);
    }

    pub(crate) fn set_idle(&self) {
        self.position.store(IDLE, Ordering::Release);
    }

    /// Ignored while idle.
    pub(crate) fn set_step(&self, step: usize) {
        let _ = self
            .position
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |p| (p != IDLE).then_some(step + 1));
    }

    pub(crate) fn set_bpm(&self, bpm: f64) {
        self.bpm_bits.store(bpm.to_bits(), Ordering::Relaxed);
    }
}

impl Default for SharedTransport {
    fn default() -> Self {
        Self {
            position: AtomicUsize::new(IDLE),
            bpm_bits: AtomicU64::new(DEFAULT_BPM.to_bits()),
        }
    }
}

/// Fan-out of transport events. Slow subscribers lose events rather than
/// stall the sender; dropped receivers are pruned.
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Vec<Sender<TransportEvent>>,
}

impl Subscribers {
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<TransportEvent> {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        self.senders.push(tx);
        rx
    }

    pub fn broadcast(&mut self, event: TransportEvent) {
        self.senders.retain(|tx| match tx.try_send(event) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
