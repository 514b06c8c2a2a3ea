//! End-of-session statistics.
//!
//! Pure reductions of an [`AnalysisAccumulator`]; none of them mutate it, so a
//! summary can be recomputed from the same sums any number of times.
//! Silent or empty regions report neutral values (0 correlation, 0 width,
//! 0 slope) rather than failing.

use crate::accumulator::AnalysisAccumulator;
use crate::bands::BandLayout;
use crate::stereo::POWER_EPSILON;

/// Low correlation region used by the imaging heuristics.
pub const LOW_REGION_HZ: (f64, f64) = (20.0, 100.0);
pub const MID_REGION_HZ: (f64, f64) = (100.0, 2000.0);
pub const HIGH_REGION_HZ: (f64, f64) = (2000.0, 20000.0);

/// Crest factor (dB) considered neutral for the dryness index.
pub const CREST_REF_DB: f64 = 14.0;
/// Mean spectral flux considered neutral for the dryness index.
pub const FLUX_REF: f64 = 0.15;
const DRYNESS_CREST_GAIN: f64 = 0.35;
const DRYNESS_FLUX_GAIN: f64 = 2.0;

const RUMBLE_HZ: ((f64, f64), (f64, f64)) = ((20.0, 40.0), (80.0, 160.0));
const FIZZ_HZ: ((f64, f64), (f64, f64)) = ((16000.0, 20000.0), (4000.0, 8000.0));
const SIBILANCE_HZ: ((f64, f64), (f64, f64)) = ((6000.0, 10000.0), (1000.0, 4000.0));

/// Mid/side width and weighted correlation for three frequency regions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct WidthSummary {
    /// Es / (Em + Es): 0 = mono, 1 = fully side.
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    /// Power-weighted band correlation per region.
    pub corr_low: f64,
    pub corr_mid: f64,
    pub corr_high: f64,
    /// ΣL² + ΣR² per region; 0 means the region was silent.
    pub power_low: f64,
    pub power_mid: f64,
    pub power_high: f64,
}

/// Energy ratios between neighbouring frequency windows, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TonalBalance {
    /// 20-40 Hz against 80-160 Hz.
    pub rumble: f64,
    /// 16-20 kHz against 4-8 kHz.
    pub fizz: f64,
    /// 6-10 kHz against 1-4 kHz.
    pub sibilance: f64,
}

/// Average mid level of one band, for spectrum displays.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BandLevel {
    pub center_hz: f64,
    pub level_db: f64,
}

/// Everything the proposal builder needs to know about a session.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnalysisSummary {
    /// Whole-signal L/R correlation.
    pub correlation: f64,
    pub band_correlation_low: f64,
    pub band_correlation_mid: f64,
    pub band_correlation_high: f64,
    pub width: WidthSummary,
    /// Least-squares spectral tilt, dB per octave.
    pub slope_db_per_octave: f64,
    /// Points behind the tilt fit; 0 means the slope carries no information.
    pub tilt_points: u64,
    pub crest_db: f64,
    pub flux: f64,
    /// 0-1, higher = closer/drier source.
    pub dryness: f64,
    /// Positive = left louder.
    pub level_imbalance_db: f64,
    pub rms_db: f64,
    pub peak_db: f64,
    pub tonal: TonalBalance,
    pub band_levels: Vec<BandLevel>,
    /// Σ L² + Σ R² over the whole session.
    pub power: f64,
    pub samples: u64,
    pub frames: u64,
}

impl AnalysisSummary {
    /// True when the session heard nothing but digital silence.
    pub fn is_silent(&self) -> bool {
        self.power <= POWER_EPSILON
    }

    /// Reduce a finished session. Returns `None` if no audio was accumulated.
    pub fn from_accumulator(
        acc: &AnalysisAccumulator,
        layout: &BandLayout,
        split_low_hz: f64,
        split_high_hz: f64,
    ) -> Option<Self> {
        if acc.is_empty() {
            return None;
        }

        let correlations: Vec<f64> = (0..layout.len())
            .map(|index| band_correlation(acc, index).unwrap_or(0.0))
            .collect();
        let centers: Vec<f64> = layout.bands().iter().map(|band| band.center_hz).collect();
        let width = summarize_correlation_width(
            &acc.bands.sum_ll,
            &acc.bands.sum_rr,
            &correlations,
            &centers,
            split_low_hz,
            split_high_hz,
        );

        let crest_db = crest_factor_db(acc.stereo.peak() as f64, acc.stereo.rms());
        let flux = acc.mean_flux();

        Some(Self {
            correlation: full_correlation(acc),
            band_correlation_low: band_average_correlation(acc, layout, LOW_REGION_HZ),
            band_correlation_mid: band_average_correlation(acc, layout, MID_REGION_HZ),
            band_correlation_high: band_average_correlation(acc, layout, HIGH_REGION_HZ),
            width,
            slope_db_per_octave: acc.tilt.slope(),
            tilt_points: acc.tilt.count,
            crest_db,
            flux,
            dryness: dryness_index(crest_db, flux),
            level_imbalance_db: acc.stereo.level_imbalance_db(),
            rms_db: amplitude_db(acc.stereo.rms()),
            peak_db: amplitude_db(acc.stereo.peak() as f64),
            tonal: tonal_balance(acc, layout),
            band_levels: band_levels(acc, layout),
            power: acc.stereo.total_power(),
            samples: acc.samples(),
            frames: acc.frames(),
        })
    }
}

/// Whole-signal correlation in [-1, 1], from the time-domain sums.
pub fn full_correlation(acc: &AnalysisAccumulator) -> f64 {
    acc.stereo.correlation()
}

/// Σcross / sqrt(ΣL²·ΣR²) for one band; `None` if either side is silent.
pub fn band_correlation(acc: &AnalysisAccumulator, index: usize) -> Option<f64> {
    let denom = (acc.bands.sum_ll[index] * acc.bands.sum_rr[index]).sqrt();
    if denom <= POWER_EPSILON {
        return None;
    }
    Some((acc.bands.sum_lr[index] / denom).clamp(-1.0, 1.0))
}

/// Mean band correlation over bands centred in `[f0, f1)`.
///
/// Silent bands are left out; a region with no energy at all reports 0.
pub fn band_average_correlation(
    acc: &AnalysisAccumulator,
    layout: &BandLayout,
    (f0, f1): (f64, f64),
) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for corr in layout
        .indices_in(f0, f1)
        .filter_map(|index| band_correlation(acc, index))
    {
        sum += corr;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Mid/side width per region from per-band left power, right power and
/// correlation.
///
/// Regions are `[.., split_low)`, `[split_low, split_high)` and
/// `[split_high, ..)` by band centre. For each band:
/// `Em = 0.5·(PL + PR + 2r·sqrt(PL·PR))`, `Es = 0.5·(PL + PR - 2r·sqrt(PL·PR))`,
/// both floored at 0.
pub fn summarize_correlation_width(
    power_left: &[f64],
    power_right: &[f64],
    correlation: &[f64],
    centers_hz: &[f64],
    split_low_hz: f64,
    split_high_hz: f64,
) -> WidthSummary {
    #[derive(Default)]
    struct Region {
        mid: f64,
        side: f64,
        weighted_corr: f64,
        power: f64,
    }

    impl Region {
        fn width(&self) -> f64 {
            let total = self.mid + self.side;
            if total <= POWER_EPSILON {
                0.0
            } else {
                (self.side / total).clamp(0.0, 1.0)
            }
        }

        fn correlation(&self) -> f64 {
            if self.power <= POWER_EPSILON {
                0.0
            } else {
                (self.weighted_corr / self.power).clamp(-1.0, 1.0)
            }
        }
    }

    let mut regions: [Region; 3] = Default::default();

    let bands = power_left
        .iter()
        .zip(power_right)
        .zip(correlation)
        .zip(centers_hz);
    for (((&pl, &pr), &r), &center) in bands {
        let region = if center < split_low_hz {
            &mut regions[0]
        } else if center < split_high_hz {
            &mut regions[1]
        } else {
            &mut regions[2]
        };

        let cross = 2.0 * r * (pl * pr).sqrt();
        region.mid += (0.5 * (pl + pr + cross)).max(0.0);
        region.side += (0.5 * (pl + pr - cross)).max(0.0);
        region.weighted_corr += r * (pl + pr);
        region.power += pl + pr;
    }

    WidthSummary {
        low: regions[0].width(),
        mid: regions[1].width(),
        high: regions[2].width(),
        corr_low: regions[0].correlation(),
        corr_mid: regions[1].correlation(),
        corr_high: regions[2].correlation(),
        power_low: regions[0].power,
        power_mid: regions[1].power,
        power_high: regions[2].power,
    }
}

/// `20·log10(peak / rms)`; 0 for silence.
pub fn crest_factor_db(peak: f64, rms: f64) -> f64 {
    if peak <= 0.0 || rms <= 0.0 {
        return 0.0;
    }
    20.0 * (peak / rms).log10()
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Likelihood that the source is close and dry, in [0, 1].
///
/// High crest factor raises it, high spectral flux (lots of transient
/// smearing, typically room sound) lowers it.
pub fn dryness_index(crest_db: f64, flux: f64) -> f64 {
    logistic(DRYNESS_CREST_GAIN * (crest_db - CREST_REF_DB) - DRYNESS_FLUX_GAIN * (flux - FLUX_REF))
        .clamp(0.0, 1.0)
}

/// `a / (a + b)`, 0 when both are silent.
pub fn power_ratio(a: f64, b: f64) -> f64 {
    let total = a + b;
    if total <= POWER_EPSILON {
        0.0
    } else {
        (a / total).clamp(0.0, 1.0)
    }
}

fn window_energy(acc: &AnalysisAccumulator, layout: &BandLayout, (f0, f1): (f64, f64)) -> f64 {
    layout
        .indices_in(f0, f1)
        .map(|index| acc.bands.mid_energy(index))
        .sum()
}

/// Rumble, fizz and sibilance ratios from the mid band energies.
pub fn tonal_balance(acc: &AnalysisAccumulator, layout: &BandLayout) -> TonalBalance {
    let ratio = |(a, b): ((f64, f64), (f64, f64))| {
        power_ratio(window_energy(acc, layout, a), window_energy(acc, layout, b))
    };

    TonalBalance {
        rumble: ratio(RUMBLE_HZ),
        fizz: ratio(FIZZ_HZ),
        sibilance: ratio(SIBILANCE_HZ),
    }
}

/// Mean per-bin mid power of each band, in dB (floor -120 dB).
pub fn band_levels(acc: &AnalysisAccumulator, layout: &BandLayout) -> Vec<BandLevel> {
    layout
        .bands()
        .iter()
        .enumerate()
        .map(|(index, band)| {
            let frames = acc.bands.frames[index];
            let power = if frames == 0 {
                0.0
            } else {
                acc.bands.mid_energy(index) / (frames as f64 * band.bin_count() as f64)
            };
            BandLevel {
                center_hz: band.center_hz,
                level_db: 10.0 * (power + 1e-12).log10(),
            }
        })
        .collect()
}

fn amplitude_db(amplitude: f64) -> f64 {
    20.0 * (amplitude + 1e-6).log10()
}
