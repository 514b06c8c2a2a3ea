//! Core types for the Field Machine.
//!
//! - [`MachineConfig`]: analysis configuration with validation and TOML loading
//! - [`ParameterRange`]: value ranges and scaling for plugin controls
//! - [`ParamStore`] / [`ParameterTree`]: the live parameter set and its gesture protocol
//! - [`Error`] / [`ParamError`]: error types shared by the other crates

pub mod error;
pub use error::{Error, ParamError, Result};

pub mod config;
pub use config::{MachineConfig, MAX_LISTEN_SECONDS};

pub(crate) mod lockfree;
pub use lockfree::AtomicFloat;

pub mod parameter;
pub use parameter::{ParameterRange, ParameterScale};

pub mod params;
pub use params::{ids, ParamStore, ParameterEvent, ParameterTree};
