//! One listening session: analyzer, band layout and accumulator together.

use crate::accumulator::AnalysisAccumulator;
use crate::bands::BandLayout;
use crate::stft::SpectralFrameAnalyzer;
use crate::summary::AnalysisSummary;
use field_core::{MachineConfig, Result};
use std::fmt;

/// Analysis geometry for troubleshooting displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub fft_size: usize,
    pub hop_size: usize,
    pub band_count: usize,
    pub sample_rate: f64,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FFT {} / hop {} / {} bands @ {} Hz",
            self.fft_size, self.hop_size, self.band_count, self.sample_rate
        )
    }
}

/// Accumulates one Learn window.
///
/// Feeding the same audio in one block or in many yields the same
/// accumulator: the analyzer carries partial frames between calls.
pub struct AnalysisSession {
    analyzer: SpectralFrameAnalyzer,
    layout: BandLayout,
    acc: AnalysisAccumulator,
    split_low_hz: f64,
    split_high_hz: f64,
}

impl AnalysisSession {
    pub fn new(config: &MachineConfig) -> Result<Self> {
        config.validate()?;

        let analyzer = SpectralFrameAnalyzer::prepare(config.sample_rate, config.fft_order)?;
        let layout = BandLayout::build(
            config.band_min_hz,
            config.band_max_hz,
            config.sample_rate,
            analyzer.fft_size(),
        );
        let acc = AnalysisAccumulator::new(layout.len());

        Ok(Self {
            analyzer,
            layout,
            acc,
            split_low_hz: config.width_split_low_hz,
            split_high_hz: config.width_split_high_hz,
        })
    }

    /// Analyse a block. `right == None` treats the input as mono.
    ///
    /// Returns the number of STFT frames completed.
    pub fn process_block(&mut self, left: &[f32], right: Option<&[f32]>) -> usize {
        let layout = &self.layout;
        self.analyzer
            .process_block(left, right, &mut self.acc, |frame, acc| {
                layout.accumulate(frame, acc)
            })
    }

    /// Reduce what has been accumulated so far. `None` before the first sample.
    pub fn summarize(&self) -> Option<AnalysisSummary> {
        AnalysisSummary::from_accumulator(
            &self.acc,
            &self.layout,
            self.split_low_hz,
            self.split_high_hz,
        )
    }

    /// Drop all accumulated data and any partial frame.
    pub fn reset(&mut self) {
        self.analyzer.reset();
        self.acc = AnalysisAccumulator::new(self.layout.len());
    }

    pub fn accumulator(&self) -> &AnalysisAccumulator {
        &self.acc
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn samples(&self) -> u64 {
        self.acc.samples()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            fft_size: self.analyzer.fft_size(),
            hop_size: self.analyzer.hop_size(),
            band_count: self.layout.len(),
            sample_rate: self.analyzer.sample_rate(),
        }
    }
}
