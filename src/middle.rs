// The middle layer: the only place that turns input into sequencer calls and
// sequencer state into something the TUI can draw. The TUI never reaches
// past this into the scheduler.

use crate::audio_api::SoundEngine;
use crate::sequencer::{Sequencer, TimeSource};
use crate::shared::{DisplayState, InputEvent, NUM_VOICES};

const PAD_FLASH_SECS: f64 = 0.1;

pub struct Middle<E: SoundEngine, T: TimeSource> {
    seq: Sequencer<E, T>,
    last_hit: [Option<f64>; NUM_VOICES],
    status: String,
}

impl<E: SoundEngine, T: TimeSource> Middle<E, T> {
    pub fn new(seq: Sequencer<E, T>) -> Self {
        Self {
            seq,
            last_hit: [None; NUM_VOICES],
            status: String::from("press A to start the audio engine"),
        }
    }

    pub fn sequencer(&self) -> &Sequencer<E, T> {
        &self.seq
    }

    pub fn sequencer_mut(&mut self) -> &mut Sequencer<E, T> {
        &mut self.seq
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::VoiceDown(voice) => {
                if self.seq.press(voice) {
                    self.last_hit[voice.index()] = Some(self.seq.now());
                }
            }
            InputEvent::VoiceUp(voice) => self.seq.release(voice),
            InputEvent::PlayPress => {
                if !self.seq.engine_state().is_ready() {
                    self.status = String::from("audio engine not started (press A)");
                    return;
                }
                let running = self.seq.toggle_playback();
                self.status = String::from(if running { "playing" } else { "stopped" });
            }
            InputEvent::AdjustBpm(delta) => {
                let wanted = self.seq.tempo() + delta;
                if let Ok(bpm) = self.seq.set_tempo(wanted) {
                    self.status = format!("tempo {bpm:.0}");
                }
            }
            InputEvent::StartAudio => {
                self.status = match self.seq.initialize_engine() {
                    Ok(()) => String::from("audio ready"),
                    Err(e) => format!("{e} (press A to retry)"),
                };
            }
            InputEvent::ToggleStep { voice, step } => {
                if let Err(e) = self.seq.toggle(voice, step) {
                    self.status = e.to_string();
                }
            }
            InputEvent::Clear => {
                self.seq.clear();
                self.status = String::from("pattern cleared");
            }
            InputEvent::Randomize => {
                self.seq.randomize();
                self.status = String::from("pattern randomized");
            }
            InputEvent::Quit => {
                self.seq.stop();
            }
        }
    }

    /// Call once per frame.
    pub fn tick(&mut self) {
        self.seq.pump();
    }

    pub fn display_state(&self) -> DisplayState {
        let now = self.seq.now();
        let playing = self.seq.state().is_running();
        DisplayState {
            grid: self.seq.snapshot(),
            playing_step: playing.then(|| self.seq.current_step()),
            playing,
            bpm: self.seq.tempo(),
            engine: self.seq.engine_state(),
            pads_lit: self
                .last_hit
                .map(|hit| hit.is_some_and(|t| now - t < PAD_FLASH_SECS)),
            status: self.status.clone(),
        }
    }
}
