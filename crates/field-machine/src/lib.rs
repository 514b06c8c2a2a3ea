//! # Field Machine
//!
//! Listens to a track for a few seconds, then proposes bounded, reversible
//! parameter changes for imaging, tone and space.
//!
//! - [`MachineEngine`]: Learn session state machine (Idle / Learning / Ready)
//! - [`ProposalBuilder`]: summary + context to [`Proposal`]s
//! - [`ApplyController`]: full, blended and composite apply with revert
//! - [`Context`] / [`Targets`]: genre, venue and track-type reference values
//!
//! ## Example
//!
//! ```rust
//! use field_machine::{Context, ListenSource, MachineEngine, MachineState};
//!
//! let mut engine = MachineEngine::builder().build().unwrap();
//! engine.start_learning(Context::from_indices(0, 0, 3), ListenSource::Pre);
//!
//! let noise: Vec<f32> = (0..48000).map(|i| ((i * 7919) % 200) as f32 / 400.0 - 0.25).collect();
//! engine.process_block(&noise, None);
//! engine.stop(true);
//!
//! assert_eq!(engine.state(), MachineState::Ready);
//! for proposal in engine.proposals().iter() {
//!     println!("{}: {} deltas", proposal.title, proposal.deltas.len());
//! }
//! ```

pub mod apply;
pub mod builder;
pub mod clock;
pub mod context;
pub mod engine;
pub mod proposal;
pub mod status;

mod error;

pub use apply::{merge_deltas, ApplyController, ApplyReport, SafetyRails};
pub use builder::{build_proposals, ProposalBuilder, IMAGING_ID, SPACE_ID, TONE_ID};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{Context, Genre, Targets, TrackType, Venue};
pub use engine::{
    ListenSource, MachineEngine, MachineEngineBuilder, MachineState, STATUS_ANALYZING,
    STATUS_INITIALIZING, STATUS_READY, STATUS_STOPPED,
};
pub use error::{Error, Result};
pub use proposal::{ParamDelta, Proposal};
pub use status::StatusLog;
