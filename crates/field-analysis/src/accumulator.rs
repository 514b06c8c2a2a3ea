//! Session-wide analysis sums.
//!
//! One [`AnalysisAccumulator`] lives for exactly one Learn session. Every pull
//! of audio adds to it; at the end of the window it is reduced into an
//! [`AnalysisSummary`](crate::AnalysisSummary) and thrown away.

use crate::stereo::StereoSums;

/// Regression guard for the spectral-tilt fit.
pub(crate) const REGRESSION_EPSILON: f64 = 1e-9;

/// Least-squares sums over `(log2(f), dB)` points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TiltRegression {
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_xx: f64,
    pub sum_xy: f64,
    pub count: u64,
}

impl TiltRegression {
    #[inline]
    pub fn add(&mut self, x: f64, y: f64) {
        self.sum_x += x;
        self.sum_y += y;
        self.sum_xx += x * x;
        self.sum_xy += x * y;
        self.count += 1;
    }

    /// Slope of the fitted line (dB per octave). Returns 0 for a degenerate fit.
    pub fn slope(&self) -> f64 {
        let n = self.count as f64;
        let denom = n * self.sum_xx - self.sum_x * self.sum_x;
        if denom.abs() < REGRESSION_EPSILON {
            return 0.0;
        }
        (n * self.sum_xy - self.sum_x * self.sum_y) / denom
    }
}

/// Per-band running sums, one entry per analysis band.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BandSums {
    /// Half of the mid-spectrum power in the band.
    pub energy_left: Vec<f64>,
    /// The other half of the mid-spectrum power in the band.
    pub energy_right: Vec<f64>,
    /// Σ |L|² over the band's bins.
    pub sum_ll: Vec<f64>,
    /// Σ |R|² over the band's bins.
    pub sum_rr: Vec<f64>,
    /// Σ Re(L)Re(R) + Im(L)Im(R) over the band's bins.
    pub sum_lr: Vec<f64>,
    /// Frames accumulated into each band.
    pub frames: Vec<u64>,
}

impl BandSums {
    pub fn new(band_count: usize) -> Self {
        Self {
            energy_left: vec![0.0; band_count],
            energy_right: vec![0.0; band_count],
            sum_ll: vec![0.0; band_count],
            sum_rr: vec![0.0; band_count],
            sum_lr: vec![0.0; band_count],
            frames: vec![0; band_count],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Mid-spectrum power of band `index` (left plus right halves).
    pub fn mid_energy(&self, index: usize) -> f64 {
        self.energy_left[index] + self.energy_right[index]
    }
}

/// Everything accumulated during one listening window.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnalysisAccumulator {
    pub stereo: StereoSums,
    pub flux_sum: f64,
    pub flux_frames: u64,
    pub tilt: TiltRegression,
    pub bands: BandSums,
}

impl AnalysisAccumulator {
    pub fn new(band_count: usize) -> Self {
        Self {
            bands: BandSums::new(band_count),
            ..Default::default()
        }
    }

    /// True until the first sample arrives.
    pub fn is_empty(&self) -> bool {
        self.stereo.samples == 0
    }

    pub fn samples(&self) -> u64 {
        self.stereo.samples
    }

    pub fn frames(&self) -> u64 {
        self.flux_frames
    }

    pub fn add_flux(&mut self, flux: f64) {
        self.flux_sum += flux;
        self.flux_frames += 1;
    }

    /// Mean spectral flux per frame, 0 before the first frame.
    pub fn mean_flux(&self) -> f64 {
        if self.flux_frames == 0 {
            0.0
        } else {
            self.flux_sum / self.flux_frames as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_regression_recovers_line() {
        let mut tilt = TiltRegression::default();
        for octave in 5..15 {
            let x = octave as f64;
            tilt.add(x, -3.0 * x + 12.0);
        }
        assert_abs_diff_eq!(tilt.slope(), -3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_regression() {
        let mut tilt = TiltRegression::default();
        assert_eq!(tilt.slope(), 0.0);

        // Every point at the same x: vertical line, no slope.
        tilt.add(10.0, 1.0);
        tilt.add(10.0, 5.0);
        assert_eq!(tilt.slope(), 0.0);
    }

    #[test]
    fn test_new_sizes_band_vectors() {
        let acc = AnalysisAccumulator::new(30);
        assert_eq!(acc.bands.len(), 30);
        assert!(acc.is_empty());
        assert_eq!(acc.mean_flux(), 0.0);
    }
}
