//! Third-octave analysis bands.
//!
//! The listening range (20 Hz-20 kHz by default) is cut into bands whose edges
//! sit a third of an octave apart. Each band owns an inclusive range of FFT
//! bins; ranges never overlap and never include DC.
//!
//! At the bottom of the range a third of an octave is narrower than one bin,
//! so low bands get pushed up onto the next free bin. A band's `center_hz` is
//! taken from the bins it actually reads, not from its nominal edges, so region
//! and tonal-window lookups see the frequencies that were measured.

use crate::accumulator::AnalysisAccumulator;
use crate::stft::SpectralFrame;

/// Edge spacing between neighbouring bands.
const THIRD_OCTAVE: f64 = 1.259_921_049_894_873_2; // 2^(1/3)

/// One analysis band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Band {
    /// Nominal third-octave edges.
    pub low_hz: f64,
    pub high_hz: f64,
    /// Geometric centre of the assigned bins.
    pub center_hz: f64,
    /// First FFT bin (inclusive).
    pub start_bin: usize,
    /// Last FFT bin (inclusive).
    pub end_bin: usize,
}

impl Band {
    pub fn bin_count(&self) -> usize {
        self.end_bin - self.start_bin + 1
    }
}

/// Immutable band partition for one sample rate / FFT size pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BandLayout {
    bands: Vec<Band>,
}

impl BandLayout {
    /// Partition `[f_min, f_max]` into third-octave bands.
    ///
    /// `f_max` is limited to Nyquist. Bin indices are clamped to
    /// `[1, fft_size / 2]`; a band that collapses keeps a single bin, pushed
    /// past the previous band if needed, and a band is dropped once no
    /// unclaimed bins remain. With 4096 points at 48 kHz the 63-80 Hz band
    /// reads bin 7 (82 Hz).
    pub fn build(f_min: f64, f_max: f64, sample_rate: f64, fft_size: usize) -> Self {
        let half = fft_size / 2;
        let f_max = f_max.min(sample_rate * 0.5);
        let bin_hz = sample_rate / fft_size as f64;
        let bin_for = |hz: f64| (hz / bin_hz).round() as usize;

        let mut bands = Vec::new();
        let mut low = f_min;
        let mut prev_end = 0usize;

        while low < f_max * (1.0 - 1e-9) {
            let high = (low * THIRD_OCTAVE).min(f_max);
            let last = high >= f_max;

            let start = bin_for(low).clamp(1, half).max(prev_end + 1);
            if start > half {
                break;
            }

            // Interior bands stop one bin short of the shared edge.
            let upper = if last {
                bin_for(high)
            } else {
                bin_for(high).saturating_sub(1)
            };
            let end = upper.clamp(1, half).max(start);

            bands.push(Band {
                low_hz: low,
                high_hz: high,
                center_hz: ((start * end) as f64).sqrt() * bin_hz,
                start_bin: start,
                end_bin: end,
            });

            prev_end = end;
            low = high;
        }

        tracing::debug!(
            bands = bands.len(),
            fft_size,
            sample_rate,
            "built analysis band layout"
        );

        Self { bands }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Indices of bands whose centre lies in `[f0, f1)`.
    pub fn indices_in(&self, f0: f64, f1: f64) -> impl Iterator<Item = usize> + '_ {
        self.bands
            .iter()
            .enumerate()
            .filter(move |(_, band)| band.center_hz >= f0 && band.center_hz < f1)
            .map(|(index, _)| index)
    }

    /// Add one frame's band sums to `acc`.
    ///
    /// Mid power is split 0.5/0.5 into the band's left/right energy; true
    /// per-bin left, right and cross power are tracked alongside.
    pub fn accumulate(&self, frame: &SpectralFrame<'_>, acc: &mut AnalysisAccumulator) {
        let sums = &mut acc.bands;

        for (index, band) in self.bands.iter().enumerate() {
            let mut mid_power = 0.0f64;
            let mut ll = 0.0f64;
            let mut rr = 0.0f64;
            let mut lr = 0.0f64;

            for bin in band.start_bin..=band.end_bin {
                let m = frame.mid[bin];
                let l = frame.left[bin];
                let r = frame.right[bin];

                mid_power += m.norm_sqr() as f64;
                ll += l.norm_sqr() as f64;
                rr += r.norm_sqr() as f64;
                lr += (l.re as f64) * (r.re as f64) + (l.im as f64) * (r.im as f64);
            }

            sums.energy_left[index] += 0.5 * mid_power;
            sums.energy_right[index] += 0.5 * mid_power;
            sums.sum_ll[index] += ll;
            sums.sum_rr[index] += rr;
            sums.sum_lr[index] += lr;
            sums.frames[index] += 1;
        }
    }
}
