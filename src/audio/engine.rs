use crate::audio_api::{AudioCommand, TriggerEvent};
use crate::shared::NUM_VOICES;

use super::voice::DrumVoice;

const MAX_QUEUED: usize = 64; // hard cap so we wont malloc in audio callback
const MASTER_GAIN: f32 = 0.8;

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    start_frame: u64,
    slot: usize,
    voice: DrumVoice,
}

/// Render side of the engine. Lives inside the audio callback.
///
/// Each drum is monophonic: a new hit on a voice cuts the previous one, the
/// way a single synth per pad behaves. Hits are queued until their frame.
pub struct Engine {
    sample_rate: f32,
    frame: u64, // frames rendered so far
    sounding: [Option<DrumVoice>; NUM_VOICES],
    queued: Vec<Scheduled>,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            frame: 0,
            sounding: [None; NUM_VOICES],
            queued: Vec::with_capacity(MAX_QUEUED),
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// `now` is the shared timeline's time at the start of the next block.
    pub fn handle_cmd(&mut self, cmd: AudioCommand, now: f64) {
        match cmd {
            AudioCommand::Trigger(ev) => self.schedule(ev, now),
            AudioCommand::CancelPending => self.queued.clear(),
        }
    }

    fn schedule(&mut self, ev: TriggerEvent, now: f64) {
        if self.queued.len() == MAX_QUEUED {
            return; // drop rather than allocate
        }
        // anything already due (or late) starts with this block
        let ahead = ((ev.at - now) * self.sample_rate as f64).round().max(0.0) as u64;
        self.queued.push(Scheduled {
            start_frame: self.frame + ahead,
            slot: ev.voice.index(),
            voice: DrumVoice::new(&ev, self.sample_rate),
        });
    }

    /// Fill an interleaved buffer; every channel gets the same mono mix.
    pub fn render_block(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for out in data.chunks_mut(channels) {
            self.start_due();
            let mut mix = 0.0f32;
            for voice in self.sounding.iter_mut().flatten() {
                mix += voice.next_sample();
            }
            let sample = (mix * MASTER_GAIN).clamp(-1.0, 1.0);
            for ch in out.iter_mut() {
                *ch = sample;
            }
            self.frame += 1;
        }
        for slot in self.sounding.iter_mut() {
            if slot.is_some_and(|v| !v.active) {
                *slot = None;
            }
        }
    }

    fn start_due(&mut self) {
        let mut i = 0;
        while i < self.queued.len() {
            if self.queued[i].start_frame <= self.frame {
                let hit = self.queued.swap_remove(i);
                self.sounding[hit.slot] = Some(hit.voice);
            } else {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Voice;

    const RATE: u32 = 1000; // 1 frame per ms keeps the arithmetic readable

    fn trigger(voice: Voice, at: f64) -> AudioCommand {
        AudioCommand::Trigger(TriggerEvent::new(voice, at, 120.0))
    }

    #[test]
    fn hits_start_on_their_frame() {
        let mut engine = Engine::new(RATE);
        engine.handle_cmd(trigger(Voice::Kick, 0.010), 0.0);
        let mut buf = vec![0.0f32; 20];
        engine.render_block(&mut buf, 1);
        assert!(buf[..10].iter().all(|s| *s == 0.0));
        assert!(buf[10..].iter().any(|s| *s != 0.0));
        assert_eq!(engine.queued(), 0);
        assert_eq!(engine.frame(), 20);
    }

    #[test]
    fn late_hits_start_immediately() {
        let mut engine = Engine::new(RATE);
        engine.handle_cmd(trigger(Voice::Snare, -1.0), 0.0);
        let mut buf = vec![0.0f32; 4];
        engine.render_block(&mut buf, 2);
        assert!(buf.iter().any(|s| *s != 0.0));
        assert_eq!(buf[0], buf[1]); // both channels carry the same mix
    }

    #[test]
    fn cancel_drops_hits_that_have_not_started() {
        let mut engine = Engine::new(RATE);
        engine.handle_cmd(trigger(Voice::Crash, 0.5), 0.0);
        engine.handle_cmd(AudioCommand::CancelPending, 0.0);
        let mut buf = vec![0.0f32; 1000];
        engine.render_block(&mut buf, 1);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn queue_is_capped() {
        let mut engine = Engine::new(RATE);
        for i in 0..(MAX_QUEUED + 10) {
            engine.handle_cmd(trigger(Voice::HiHat, 10.0 + i as f64), 0.0);
        }
        assert_eq!(engine.queued(), MAX_QUEUED);
    }
}
