//! Error types for the sequencing core.
//!
//! "Engine not ready" is deliberately absent: triggering or starting before
//! the sound engine is up is a silent no-op, not an error.

use thiserror::Error;

use crate::shared::STEPS_PER_PATTERN;

#[derive(Debug, Error)]
pub enum DrumError {
    /// Step index outside the pattern.
    #[error("step {step} is out of range (expected 0..{})", STEPS_PER_PATTERN)]
    StepOutOfRange { step: usize },

    /// Voice identifier that is not part of the kit.
    #[error("unknown voice `{0}`")]
    UnknownVoice(String),

    /// Tempo that cannot be clamped (NaN or infinite).
    #[error("tempo {0} is not a finite number")]
    InvalidTempo(f64),

    /// The sound engine could not be brought up. Retrying is up to the caller.
    #[error("sound engine failed to initialize: {0}")]
    EngineInit(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Config(#[from] serde_json::Error),
}
