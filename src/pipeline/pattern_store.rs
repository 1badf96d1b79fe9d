// holds the pattern in an arc and rwlock so the ui can edit it while the
// sequencer keeps reading snapshots of it in real time.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::Rng;

use super::pattern::Pattern;
use crate::error::DrumError;
use crate::shared::{NUM_VOICES, Voice};

/// Cheap, cloneable handle to the one live pattern.
#[derive(Clone, Debug, Default)]
pub struct PatternStore {
    inner: Arc<RwLock<Pattern>>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&self, voice: Voice, step: usize) -> Result<bool, DrumError> {
        self.write().toggle(voice, step)
    }

    pub fn set(&self, voice: Voice, step: usize, active: bool) -> Result<(), DrumError> {
        self.write().set(voice, step, active)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn randomize(&self, densities: &[f64; NUM_VOICES]) {
        self.randomize_with_rng(densities, &mut rand::thread_rng());
    }

    pub fn randomize_with_rng<R: Rng + ?Sized>(&self, densities: &[f64; NUM_VOICES], rng: &mut R) {
        // roll outside the lock, swap in one go
        let fresh = Pattern::random(densities, rng);
        *self.write() = fresh;
    }

    /// Copy of the grid as of now. Later edits never show up in it.
    pub fn snapshot(&self) -> Pattern {
        *self.read()
    }

    fn read(&self) -> RwLockReadGuard<'_, Pattern> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Pattern> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::STEPS_PER_PATTERN;
    use std::thread;

    #[test]
    fn snapshot_does_not_follow_later_edits() {
        let store = PatternStore::new();
        store.toggle(Voice::Kick, 0).unwrap();
        let snap = store.snapshot();
        store.toggle(Voice::Kick, 0).unwrap();
        store.toggle(Voice::Snare, 5).unwrap();
        assert!(snap.is_active(Voice::Kick, 0));
        assert!(!snap.is_active(Voice::Snare, 5));
        assert!(!store.snapshot().is_active(Voice::Kick, 0));
    }

    #[test]
    fn clear_then_snapshot_is_all_false() {
        let store = PatternStore::new();
        store.randomize(&[1.0; NUM_VOICES]);
        store.clear();
        let snap = store.snapshot();
        for voice in Voice::ALL {
            for step in 0..STEPS_PER_PATTERN {
                assert!(!snap.is_active(voice, step));
            }
        }
    }

    #[test]
    fn randomize_zero_and_one() {
        let store = PatternStore::new();
        store.randomize(&[0.0; NUM_VOICES]);
        assert_eq!(store.snapshot().count_active(), 0);
        store.randomize(&[1.0; NUM_VOICES]);
        assert_eq!(store.snapshot().count_active(), NUM_VOICES * STEPS_PER_PATTERN);
    }

    #[test]
    fn randomize_is_roughly_as_dense_as_asked() {
        let store = PatternStore::new();
        let mut hits = 0;
        let rounds = 200;
        for _ in 0..rounds {
            store.randomize(&[0.5; NUM_VOICES]);
            hits += store.snapshot().count_active();
        }
        let ratio = hits as f64 / (rounds * NUM_VOICES * STEPS_PER_PATTERN) as f64;
        // 19200 bernoulli(0.5) draws; this band is many sigmas wide
        assert!((0.45..0.55).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn concurrent_toggles_on_different_cells_all_land() {
        let store = PatternStore::new();
        let handles: Vec<_> = Voice::ALL
            .into_iter()
            .map(|voice| {
                let store = store.clone();
                thread::spawn(move || {
                    for step in 0..STEPS_PER_PATTERN {
                        store.toggle(voice, step).unwrap();
                        let _ = store.snapshot();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.snapshot().count_active(), NUM_VOICES * STEPS_PER_PATTERN);
    }
}
