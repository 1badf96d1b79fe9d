// The step grid itself. Plain data: no locking, no timing.

use rand::Rng;

use crate::error::DrumError;
use crate::shared::{NUM_VOICES, STEPS_PER_PATTERN, Voice};

/// One row of 16 steps per voice. Every row always has exactly
/// `STEPS_PER_PATTERN` entries; `Copy` so a snapshot can never alias live state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    rows: [[bool; STEPS_PER_PATTERN]; NUM_VOICES],
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, voice: Voice, step: usize) -> Result<bool, DrumError> {
        check_step(step)?;
        Ok(self.rows[voice.index()][step])
    }

    /// Whether `voice` plays on `step`; out-of-range steps never play.
    pub fn is_active(&self, voice: Voice, step: usize) -> bool {
        self.rows[voice.index()].get(step).copied().unwrap_or(false)
    }

    pub fn row(&self, voice: Voice) -> &[bool; STEPS_PER_PATTERN] {
        &self.rows[voice.index()]
    }

    pub fn set(&mut self, voice: Voice, step: usize, active: bool) -> Result<(), DrumError> {
        check_step(step)?;
        self.rows[voice.index()][step] = active;
        Ok(())
    }

    /// Flip one cell, returning its new value.
    pub fn toggle(&mut self, voice: Voice, step: usize) -> Result<bool, DrumError> {
        check_step(step)?;
        let cell = &mut self.rows[voice.index()][step];
        *cell = !*cell;
        Ok(*cell)
    }

    pub fn clear(&mut self) {
        self.rows = [[false; STEPS_PER_PATTERN]; NUM_VOICES];
    }

    /// Build a fresh grid where each cell of a voice is active with that
    /// voice's probability. Probabilities are clamped to [0, 1]; NaN counts as 0.
    pub fn random<R: Rng + ?Sized>(densities: &[f64; NUM_VOICES], rng: &mut R) -> Self {
        let mut pattern = Self::new();
        for voice in Voice::ALL {
            let p = clamp_probability(densities[voice.index()]);
            for cell in pattern.rows[voice.index()].iter_mut() {
                *cell = rng.gen_bool(p);
            }
        }
        pattern
    }

    /// Voices that play on `step`, in kit order.
    pub fn active_voices(&self, step: usize) -> impl Iterator<Item = Voice> + '_ {
        Voice::ALL
            .into_iter()
            .filter(move |v| self.is_active(*v, step))
    }

    pub fn count_active(&self) -> usize {
        self.rows.iter().flatten().filter(|c| **c).count()
    }
}

fn check_step(step: usize) -> Result<(), DrumError> {
    if step < STEPS_PER_PATTERN {
        Ok(())
    } else {
        Err(DrumError::StepOutOfRange { step })
    }
}

pub(crate) fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn new_pattern_is_silent() {
        let p = Pattern::new();
        assert_eq!(p.count_active(), 0);
        for voice in Voice::ALL {
            assert_eq!(p.row(voice).len(), STEPS_PER_PATTERN);
        }
    }

    #[test]
    fn toggle_twice_restores_every_cell() {
        let mut p = Pattern::new();
        p.set(Voice::Snare, 4, true).unwrap();
        let before = p;
        for voice in Voice::ALL {
            for step in 0..STEPS_PER_PATTERN {
                p.toggle(voice, step).unwrap();
                p.toggle(voice, step).unwrap();
            }
        }
        assert_eq!(p, before);
    }

    #[test]
    fn out_of_range_step_is_rejected() {
        let mut p = Pattern::new();
        assert!(matches!(
            p.toggle(Voice::Kick, STEPS_PER_PATTERN),
            Err(DrumError::StepOutOfRange { step: 16 })
        ));
        assert!(p.get(Voice::Kick, 99).is_err());
        assert!(!p.is_active(Voice::Kick, 99));
        assert_eq!(p.count_active(), 0);
    }

    #[test]
    fn active_voices_are_listed_in_kit_order() {
        let mut p = Pattern::new();
        p.set(Voice::Perc, 3, true).unwrap();
        p.set(Voice::Kick, 3, true).unwrap();
        p.set(Voice::Snare, 2, true).unwrap();
        let voices: Vec<_> = p.active_voices(3).collect();
        assert_eq!(voices, vec![Voice::Kick, Voice::Perc]);
    }

    #[test]
    fn random_respects_extreme_densities() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut densities = [0.0; NUM_VOICES];
        densities[Voice::HiHat.index()] = 1.0;
        densities[Voice::Crash.index()] = 3.5; // clamped to 1
        densities[Voice::Perc.index()] = f64::NAN; // treated as 0
        let p = Pattern::random(&densities, &mut rng);
        assert!(p.row(Voice::HiHat).iter().all(|c| *c));
        assert!(p.row(Voice::Crash).iter().all(|c| *c));
        assert!(p.row(Voice::Kick).iter().all(|c| !*c));
        assert!(p.row(Voice::Perc).iter().all(|c| !*c));
    }
}
