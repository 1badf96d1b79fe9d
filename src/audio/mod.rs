use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::{AudioCommand, EngineState, SoundEngine, TriggerEvent};
use crate::error::DrumError;
use crate::sequencer::{MonotonicClock, TimeSource};

mod engine;
mod voice;

pub use engine::Engine;
pub use voice::DrumVoice;

struct AudioHandle {
    tx: Sender<AudioCommand>,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }
}

/// Sound engine on the default cpal output device.
///
/// Shares the sequencer's monotonic clock so trigger times can be turned into
/// frame offsets inside the callback. Nothing touches the audio device until
/// `initialize` is called.
pub struct CpalEngine {
    clock: MonotonicClock,
    state: EngineState,
    handle: Option<AudioHandle>,
}

impl CpalEngine {
    pub fn new(clock: MonotonicClock) -> Self {
        Self {
            clock,
            state: EngineState::Uninitialized,
            handle: None,
        }
    }
}

impl SoundEngine for CpalEngine {
    fn initialize(&mut self) -> Result<(), DrumError> {
        match start_audio(self.clock) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = EngineState::Ready;
                Ok(())
            }
            Err(e) => {
                self.handle = None;
                self.state = EngineState::Failed;
                Err(DrumError::EngineInit(format!("{e:#}")))
            }
        }
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn trigger(&mut self, event: TriggerEvent) {
        if let Some(handle) = &self.handle {
            handle.send(AudioCommand::Trigger(event));
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = &self.handle {
            handle.send(AudioCommand::CancelPending);
        }
    }
}

fn start_audio(clock: MonotonicClock) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate: u32 = config.sample_rate();
    let channels = config.channels() as usize;
    log::info!("starting audio output ({channels} ch @ {sample_rate} Hz)");

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream =
                build_output_stream_f32(&device, &config.into(), rx, clock, sample_rate, channels)?;
            output_stream.play().context("failed to play output stream")?;
            Ok(AudioHandle {
                tx,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    clock: MonotonicClock,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            let now = clock.now();
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd, now);
            }
            engine.render_block(data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
