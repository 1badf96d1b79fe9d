use std::f32::consts::TAU;

use crate::audio_api::TriggerEvent;
use crate::shared::Voice;

// inharmonic partial ratios for the cymbal-ish voices
const METAL_RATIOS: [f32; 6] = [1.0, 1.342, 1.2312, 1.6532, 1.9523, 2.1523];
const SILENCE: f32 = 1.0e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timbre {
    Membrane, // pitched sine with a falling pitch sweep
    Noise,
    Metal,
    Triangle,
}

// envelope numbers per kit piece
#[derive(Clone, Copy, Debug)]
struct Patch {
    timbre: Timbre,
    decay: f32,   // seconds to fall to 1/e
    release: f32, // extra fall-off once the gate closes
    level: f32,
}

fn patch(voice: Voice) -> Patch {
    match voice {
        Voice::Kick => Patch { timbre: Timbre::Membrane, decay: 0.4, release: 1.4, level: 0.9 },
        Voice::Snare => Patch { timbre: Timbre::Noise, decay: 0.13, release: 0.03, level: 0.5 },
        Voice::HiHat => Patch { timbre: Timbre::Metal, decay: 0.1, release: 0.01, level: 0.25 },
        Voice::OpenHat => Patch { timbre: Timbre::Metal, decay: 0.3, release: 0.03, level: 0.25 },
        Voice::Crash => Patch { timbre: Timbre::Metal, decay: 1.0, release: 3.0, level: 0.2 },
        Voice::Perc => Patch { timbre: Timbre::Triangle, decay: 0.1, release: 0.1, level: 0.5 },
    }
}

/// One sounding drum hit. Allocation free, so it can live in the callback.
#[derive(Clone, Copy, Debug)]
pub struct DrumVoice {
    patch: Patch,
    pitch: f32,
    inv_rate: f32,
    gate: f32,
    age: u32, // samples rendered
    phases: [f32; 6],
    noise: u32,
    hp_prev_in: f32,
    hp_prev_out: f32,
    pub active: bool,
}

impl DrumVoice {
    pub fn new(event: &TriggerEvent, sample_rate: f32) -> Self {
        Self {
            patch: patch(event.voice),
            pitch: event.shape.pitch_hz,
            inv_rate: 1.0 / sample_rate,
            gate: event.gate as f32,
            age: 0,
            phases: [0.0; 6],
            noise: 0x9E37_79B9 ^ (event.voice.index() as u32 + 1),
            hp_prev_in: 0.0,
            hp_prev_out: 0.0,
            active: true,
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }
        let t = self.age as f32 * self.inv_rate;
        self.age = self.age.saturating_add(1);

        let mut env = (-t / self.patch.decay).exp();
        if t > self.gate {
            env *= (-(t - self.gate) / self.patch.release).exp();
        }
        if env < SILENCE {
            self.active = false;
            return 0.0;
        }

        let raw = match self.patch.timbre {
            Timbre::Membrane => {
                // two octaves above the target, falling in ~50 ms
                let freq = self.pitch * (1.0 + 3.0 * (-t / 0.05).exp());
                self.advance(0, freq).sin()
            }
            Timbre::Noise => self.white(),
            Timbre::Metal => {
                let base = self.pitch / 16.0;
                let mut sum = 0.0;
                for (i, ratio) in METAL_RATIOS.iter().enumerate() {
                    let phase = self.advance(i, base * ratio);
                    sum += if phase < std::f32::consts::PI { 1.0 } else { -1.0 };
                }
                let metal = sum / METAL_RATIOS.len() as f32 + 0.3 * self.white();
                self.highpass(metal)
            }
            Timbre::Triangle => {
                let phase = self.advance(0, self.pitch) / TAU;
                4.0 * (phase - 0.5).abs() - 1.0
            }
        };
        raw * env * self.patch.level
    }

    // returns the phase before advancing
    fn advance(&mut self, i: usize, freq: f32) -> f32 {
        let phase = self.phases[i];
        self.phases[i] = (phase + TAU * freq * self.inv_rate) % TAU;
        phase
    }

    fn white(&mut self) -> f32 {
        // xorshift32
        let mut x = self.noise;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    fn highpass(&mut self, input: f32) -> f32 {
        let out = 0.95 * (self.hp_prev_out + input - self.hp_prev_in);
        self.hp_prev_in = input;
        self.hp_prev_out = out;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 48_000.0;

    fn render(voice: Voice, seconds: f32) -> Vec<f32> {
        let ev = TriggerEvent::new(voice, 0.0, 120.0);
        let mut v = DrumVoice::new(&ev, RATE);
        (0..(seconds * RATE) as usize).map(|_| v.next_sample()).collect()
    }

    #[test]
    fn every_voice_makes_bounded_noise() {
        for voice in Voice::ALL {
            let out = render(voice, 0.05);
            let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            assert!(peak > 0.01, "{voice} is silent");
            assert!(peak <= 1.0, "{voice} peaks at {peak}");
        }
    }

    #[test]
    fn short_voices_die_out() {
        let ev = TriggerEvent::new(Voice::HiHat, 0.0, 120.0);
        let mut v = DrumVoice::new(&ev, RATE);
        for _ in 0..(RATE as usize) {
            v.next_sample();
        }
        assert!(!v.active);
        assert_eq!(v.next_sample(), 0.0);
    }
}
