use thiserror::Error;

/// Failures locating a frame inside a recovered bit stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("Sync marker not found")]
    NoSyncFound,

    #[error("Payload truncated: need {needed} bits after sync, have {available}")]
    TruncatedPayload { needed: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FecError {
    #[error("Reed-Solomon decode failure: corruption exceeds correction capacity")]
    Uncorrectable,

    #[error("Invalid block length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Too many erasures: {count} (max {max})")]
    TooManyErasures { count: usize, max: usize },

    #[error("Erasure position {position} outside {len}-byte block")]
    InvalidErasure { position: usize, len: usize },
}

/// Caller-side validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Message too long: {len} bytes (max {max})")]
    PayloadTooLong { len: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModemError {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Fec(#[from] FecError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("FFT error: {0}")]
    FftError(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;
