//! Whole-signal stereo sums.
//!
//! Time-domain running totals for one listening session:
//! - **Correlation**: Σ(L·R) / sqrt(ΣL²·ΣR²), in [-1, 1]
//! - **Level imbalance**: left vs right power in dB
//! - **Crest factor**: peak over RMS in dB
//!
//! The sums are purely additive, so feeding a stream in one block or many
//! yields the same totals.

/// Power floor below which a channel counts as silent.
pub(crate) const POWER_EPSILON: f64 = 1e-20;

/// Running time-domain sums for a stereo stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct StereoSums {
    /// Σ L²
    pub sum_left_sq: f64,
    /// Σ R²
    pub sum_right_sq: f64,
    /// Σ L·R
    pub sum_lr: f64,
    /// Σ (|L| + |R|) / 2
    pub sum_abs: f64,
    pub peak_left: f32,
    pub peak_right: f32,
    /// Stereo sample frames seen.
    pub samples: u64,
}

impl StereoSums {
    /// Accumulate a block. Only the overlapping length of the two slices is used.
    pub fn add(&mut self, left: &[f32], right: &[f32]) {
        let len = left.len().min(right.len());

        for (&l, &r) in left[..len].iter().zip(&right[..len]) {
            let (lf, rf) = (l as f64, r as f64);
            self.sum_left_sq += lf * lf;
            self.sum_right_sq += rf * rf;
            self.sum_lr += lf * rf;
            self.sum_abs += 0.5 * (lf.abs() + rf.abs());
            self.peak_left = self.peak_left.max(l.abs());
            self.peak_right = self.peak_right.max(r.abs());
        }

        self.samples += len as u64;
    }

    /// Σ L² + Σ R²
    pub fn total_power(&self) -> f64 {
        self.sum_left_sq + self.sum_right_sq
    }

    /// Full-band correlation, clamped to [-1, 1]. Silence reports 0.
    pub fn correlation(&self) -> f64 {
        let denom = (self.sum_left_sq * self.sum_right_sq).sqrt();
        if denom <= POWER_EPSILON {
            return 0.0;
        }
        (self.sum_lr / denom).clamp(-1.0, 1.0)
    }

    /// Left power relative to right power, in dB. Positive = left louder.
    pub fn level_imbalance_db(&self) -> f64 {
        if self.sum_left_sq <= POWER_EPSILON && self.sum_right_sq <= POWER_EPSILON {
            return 0.0;
        }
        10.0 * ((self.sum_left_sq + POWER_EPSILON) / (self.sum_right_sq + POWER_EPSILON)).log10()
    }

    /// RMS over both channels.
    pub fn rms(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.total_power() / (2.0 * self.samples as f64)).sqrt()
    }

    pub fn peak(&self) -> f32 {
        self.peak_left.max(self.peak_right)
    }

    /// Mean absolute amplitude over both channels.
    pub fn mean_abs(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.sum_abs / self.samples as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 / 100.0).sin()).collect()
    }

    #[test]
    fn test_identical_channels() {
        let samples = sine(1000);
        let mut sums = StereoSums::default();
        sums.add(&samples, &samples);

        assert_abs_diff_eq!(sums.correlation(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sums.level_imbalance_db(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inverted_channels() {
        let left = sine(1000);
        let right: Vec<f32> = left.iter().map(|&s| -s).collect();
        let mut sums = StereoSums::default();
        sums.add(&left, &right);

        assert_abs_diff_eq!(sums.correlation(), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_silence_is_neutral() {
        let silence = vec![0.0f32; 512];
        let mut sums = StereoSums::default();
        sums.add(&silence, &silence);

        assert_eq!(sums.correlation(), 0.0);
        assert_eq!(sums.level_imbalance_db(), 0.0);
        assert_eq!(sums.rms(), 0.0);
        assert_eq!(sums.samples, 512);
    }

    #[test]
    fn test_imbalance_sign() {
        let left = sine(1000);
        let right: Vec<f32> = left.iter().map(|&s| s * 0.5).collect();
        let mut sums = StereoSums::default();
        sums.add(&left, &right);

        // Half amplitude on the right is ~6 dB quieter.
        assert_abs_diff_eq!(sums.level_imbalance_db(), 6.0206, epsilon = 1e-3);
    }

    #[test]
    fn test_chunked_matches_whole() {
        let left = sine(1000);
        let right: Vec<f32> = (0..1000).map(|i| (i as f32 / 37.0).cos()).collect();

        let mut whole = StereoSums::default();
        whole.add(&left, &right);

        let mut chunked = StereoSums::default();
        chunked.add(&left[..333], &right[..333]);
        chunked.add(&left[333..], &right[333..]);

        assert_eq!(whole.samples, chunked.samples);
        assert_abs_diff_eq!(whole.sum_lr, chunked.sum_lr, epsilon = 1e-9);
        assert_abs_diff_eq!(whole.sum_left_sq, chunked.sum_left_sq, epsilon = 1e-9);
        assert_eq!(whole.peak(), chunked.peak());
    }
}
