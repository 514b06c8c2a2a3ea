//! Centralized error type for the field umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] field_core::Error),

    #[error("Machine: {0}")]
    Machine(#[from] field_machine::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
