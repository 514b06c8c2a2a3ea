//! # Field Analysis
//!
//! The listening half of the Field Machine.
//!
//! - **STFT**: Hann-windowed frames at 50% overlap, mid/left/right spectra,
//!   spectral flux and tilt sampling per frame
//! - **Bands**: third-octave partition of the spectrum with per-band energy and
//!   L/R cross sums
//! - **Summary**: correlation, mid/side width per region, spectral slope,
//!   crest factor, dryness and tonal ratios
//! - **Live tap**: lock-free ring buffer from the audio thread (feature `live`)
//!
//! All sums are additive, so results do not depend on how the stream was
//! split into blocks.
//!
//! ## Example
//!
//! ```rust
//! use field_analysis::AnalysisSession;
//! use field_core::MachineConfig;
//!
//! let mut session = AnalysisSession::new(&MachineConfig::default()).unwrap();
//! let tone: Vec<f32> = (0..48000)
//!     .map(|i| (i as f32 * 200.0 * std::f32::consts::TAU / 48000.0).sin())
//!     .collect();
//! session.process_block(&tone, None);
//!
//! let summary = session.summarize().unwrap();
//! assert!(summary.correlation > 0.99);
//! ```

pub mod accumulator;
pub mod bands;
#[cfg(feature = "live")]
pub mod live;
pub mod session;
pub mod stereo;
pub mod stft;
pub mod summary;

pub use accumulator::{AnalysisAccumulator, BandSums, TiltRegression};
pub use bands::{Band, BandLayout};
#[cfg(feature = "live")]
pub use live::{analysis_tap, TapConsumer, TapProducer};
pub use session::{AnalysisSession, Diagnostics};
pub use stereo::StereoSums;
pub use stft::{SpectralFrame, SpectralFrameAnalyzer};
pub use summary::{
    band_average_correlation, band_correlation, crest_factor_db, dryness_index,
    full_correlation, power_ratio, summarize_correlation_width, tonal_balance, AnalysisSummary,
    BandLevel, TonalBalance, WidthSummary,
};
