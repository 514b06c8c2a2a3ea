//! # Field - Machine analysis core
//!
//! Listens to a stereo signal for a short window and turns what it heard into
//! a handful of bounded, reversible parameter proposals.
//!
//! ## Architecture
//!
//! Field is an umbrella crate that coordinates:
//! - **field-core** - Config, errors, parameter ranges and the host parameter store
//! - **field-analysis** - STFT, third-octave bands, stereo width, tilt and dryness
//! - **field-machine** - Context targets, proposal builder, apply/preview, Learn state machine
//!
//! ## Quick Start
//!
//! ```rust
//! use field::prelude::*;
//!
//! let mut engine = MachineEngine::builder()
//!     .config(MachineConfig::default().with_listen_seconds(4.0))
//!     .build()?;
//!
//! engine.start_learning(Context::default(), ListenSource::Pre);
//! let tone: Vec<f32> = (0..48000)
//!     .map(|i| (i as f32 * 220.0 * std::f32::consts::TAU / 48000.0).sin() * 0.5)
//!     .collect();
//! engine.process_block(&tone, None);
//! engine.stop(true);
//!
//! let proposals = engine.proposals();
//! if let Some(tone) = proposals.iter().find(|p| p.id == "tone") {
//!     engine.apply_blended(tone, 0.5);
//!     engine.revert();
//! }
//! # Ok::<(), field::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `live`
//! - `live` - ring-buffer audio taps drained by `MachineEngine::tick`
//! - `serialization` - serde derives on summaries, proposals and context

/// Re-export of field-core for direct access
pub use field_core as core;

pub use field_analysis as analysis;

pub use field_machine as machine;

pub use field_core::{
    ids, AtomicFloat, MachineConfig, ParamError, ParamStore, ParameterEvent, ParameterRange,
    ParameterScale, ParameterTree, MAX_LISTEN_SECONDS,
};

pub use field_analysis::{AnalysisSession, AnalysisSummary, BandLayout, Diagnostics};

#[cfg(feature = "live")]
pub use field_analysis::{analysis_tap, TapConsumer, TapProducer};

pub use field_machine::{
    ApplyController, ApplyReport, Clock, Context, Genre, ListenSource, MachineEngine,
    MachineEngineBuilder, MachineState, ManualClock, ParamDelta, Proposal, SafetyRails,
    SystemClock, Targets, TrackType, Venue,
};

mod error;

pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    // Engine
    pub use crate::{MachineEngine, MachineEngineBuilder, MachineState};

    // Session inputs
    pub use crate::{Context, Genre, ListenSource, MachineConfig, TrackType, Venue};

    // Outputs
    pub use crate::{AnalysisSummary, ApplyReport, ParamDelta, Proposal};

    // Parameter store
    pub use crate::{ids, ParamStore, ParameterTree};
}
