//! beatgrid - a six-voice, sixteen-step drum machine.
//!
//! The sequencing core (pattern store, transport clock, sequencer, direct
//! triggers) knows nothing about audio devices or terminals; it talks to a
//! [`SoundEngine`] and publishes its state for whoever wants to draw it.

pub mod audio;
pub mod audio_api;
pub mod config;
pub mod error;
pub mod logging;
pub mod middle;
pub mod pipeline;
pub mod sequencer;
pub mod shared;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_fixture;
pub mod tui;

pub use audio_api::{EngineState, SoundEngine, TriggerEvent, TriggerShape};
pub use config::Config;
pub use error::DrumError;
pub use middle::Middle;
pub use pipeline::{Pattern, PatternStore};
pub use sequencer::{Sequencer, TransportEvent, TransportState};
pub use shared::{InputEvent, Voice};
