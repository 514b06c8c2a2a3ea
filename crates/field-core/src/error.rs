//! Error types for field-core.

use thiserror::Error;

/// Error type for field-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid FFT order: {0}. Must be between 8 and 15")]
    InvalidFftOrder(u32),

    #[error("Invalid sample rate: {0}. Must be between 8000 and 384000 Hz")]
    InvalidSampleRate(f64),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Per-parameter failures from a [`ParamStore`](crate::ParamStore).
///
/// Cheap to clone so apply reports can carry one per delta.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Unknown parameter: {0}")]
    NotFound(String),
}
