//! Maps an [`AnalysisSummary`] and session [`Targets`] onto proposals.
//!
//! Three groups are always emitted for a non-empty session, in this order:
//! imaging, tone, then space (reverb / delay / motion). A group may carry no
//! deltas at all when nothing needs changing. Parameters the store does not
//! know are left out of the proposal.

use crate::context::{Context, Targets};
use crate::proposal::{ParamDelta, Proposal};
use field_analysis::AnalysisSummary;
use field_core::{ids, ParamStore};

pub const IMAGING_ID: &str = "imaging";
pub const TONE_ID: &str = "tone";
pub const SPACE_ID: &str = "space";

/// Low-band correlation under which the low end is folded to mono.
pub const MONO_CORR_THRESHOLD: f64 = 0.6;
/// Below this the mono split moves up to 120 Hz.
pub const MONO_CORR_SEVERE: f64 = 0.3;
/// Full-band correlation above which width nudges are amplified.
pub const PHASEY_CORR: f64 = 0.9;
/// Full-band correlation above which a ducking bundle is proposed.
pub const DUCK_CORR: f64 = 0.8;
/// Tilt corrections smaller than this are not worth a move.
pub const TILT_DEADBAND_DB: f64 = 0.3;
pub const TILT_MAX_DB: f64 = 4.0;

/// Deltas moving a parameter less than this along its scale are dropped.
const MATERIAL_FRACTION: f32 = 0.01;
/// Below this a region counts as silent.
const SILENT_POWER: f64 = 1e-12;
/// Width deficit / excess that triggers a shelf nudge.
const SHELF_TRIGGER: f64 = 0.1;

/// Build the proposal list for a finished session.
///
/// `None` (nothing was accumulated) yields an empty list.
pub fn build_proposals(
    summary: Option<&AnalysisSummary>,
    context: &Context,
    targets: &Targets,
    store: &dyn ParamStore,
) -> Vec<Proposal> {
    match summary {
        Some(summary) if summary.samples > 0 => {
            ProposalBuilder::new(summary, context, targets, store).build()
        }
        _ => Vec::new(),
    }
}

pub struct ProposalBuilder<'a> {
    summary: &'a AnalysisSummary,
    context: &'a Context,
    targets: &'a Targets,
    store: &'a dyn ParamStore,
}

impl<'a> ProposalBuilder<'a> {
    pub fn new(
        summary: &'a AnalysisSummary,
        context: &'a Context,
        targets: &'a Targets,
        store: &'a dyn ParamStore,
    ) -> Self {
        Self {
            summary,
            context,
            targets,
            store,
        }
    }

    pub fn build(&self) -> Vec<Proposal> {
        let proposals = vec![self.imaging(), self.tone(), self.space()];
        tracing::debug!(
            deltas = proposals.iter().map(|p| p.deltas.len()).sum::<usize>(),
            track = self.context.track.name(),
            "built proposals"
        );
        proposals
    }

    /// Delta against the store's current value, or `None` if the parameter is
    /// unknown or the move is immaterial.
    fn delta(&self, id: &str, target: f64, weight: f64, rationale: String) -> Option<ParamDelta> {
        let current = self.store.value(id).ok()?;
        let range = self.store.range(id).ok()?;
        let delta = ParamDelta::new(
            id,
            current,
            range.clamp(target as f32),
            (range.min, range.max),
            weight as f32,
            rationale,
        );

        let moved = range.normalize(delta.target) - range.normalize(current);
        if moved.abs() < MATERIAL_FRACTION {
            return None;
        }
        Some(delta)
    }

    fn current(&self, id: &str) -> f64 {
        self.store
            .value(id)
            .ok()
            .or_else(|| self.store.range(id).ok().map(|range| range.default))
            .unwrap_or(0.0) as f64
    }

    fn imaging(&self) -> Proposal {
        let s = self.summary;
        let t = self.targets;
        let w = &s.width;
        let mut p = Proposal::new(IMAGING_ID, "Imaging");
        let mut deltas = Vec::new();

        let low_corr = s.band_correlation_low;
        if w.power_low > SILENT_POWER && low_corr < MONO_CORR_THRESHOLD {
            let mono_hz = if low_corr < MONO_CORR_SEVERE { 120.0 } else { 80.0 };
            deltas.extend(self.delta(
                ids::MONO_HZ,
                mono_hz,
                (MONO_CORR_THRESHOLD - low_corr) / MONO_CORR_THRESHOLD,
                format!("Low-band correlation {low_corr:.2}: keep lows mono below {mono_hz:.0} Hz"),
            ));
        }

        let gain = if s.correlation > PHASEY_CORR { 1.5 } else { 1.0 };
        let regions = [
            (ids::WIDTH_LO, "low", w.low, t.width_low, w.power_low),
            (ids::WIDTH_MID, "mid", w.mid, t.width_mid, w.power_mid),
            (ids::WIDTH_HI, "high", w.high, t.width_high, w.power_high),
        ];
        for (id, name, measured, target, power) in regions {
            if power <= SILENT_POWER {
                continue;
            }
            let deficit = target - measured;
            deltas.extend(self.delta(
                id,
                self.current(id) + gain * deficit,
                (2.0 * deficit.abs()).min(1.0),
                format!("{name} width {measured:.2}, target {target:.2}"),
            ));
        }

        let imbalance = s.level_imbalance_db;
        let rotation = (-0.6 * imbalance).clamp(-10.0, 10.0);
        deltas.extend(self.delta(
            ids::ROTATION_DEG,
            rotation,
            (imbalance.abs() / 6.0).min(1.0),
            format!("L/R imbalance {imbalance:+.1} dB: rotate {rotation:+.1} deg"),
        ));

        if w.low < 0.4 && w.high > 0.6 {
            let spread = w.high - w.low;
            deltas.extend(self.delta(
                ids::XOVER_LO_HZ,
                150.0 + 200.0 * (0.4 - w.low),
                spread,
                format!("Narrow lows ({:.2}) under wide highs ({:.2})", w.low, w.high),
            ));
            deltas.extend(self.delta(
                ids::XOVER_HI_HZ,
                3000.0 - 1000.0 * (w.high - 0.6),
                spread,
                "Move the upper split below the widest content".to_string(),
            ));
            deltas.extend(self.delta(
                ids::SHUFFLER_LO_PCT,
                60.0 * spread,
                spread,
                "Shuffle low mids for perceived width without phase".to_string(),
            ));
            deltas.extend(self.delta(
                ids::SHUFFLER_HI_PCT,
                25.0 * spread,
                spread * 0.5,
                "Light shuffling up top to match".to_string(),
            ));
        }

        p.summary = format!(
            "Correlation {:.2} (low {:.2}), width {:.2}/{:.2}/{:.2}",
            s.correlation, low_corr, w.low, w.mid, w.high
        );
        p.metrics.insert("correlation".into(), s.correlation);
        p.metrics.insert("corr_low".into(), low_corr);
        p.metrics.insert("corr_mid".into(), s.band_correlation_mid);
        p.metrics.insert("corr_high".into(), s.band_correlation_high);
        p.metrics.insert("width_low".into(), w.low);
        p.metrics.insert("width_mid".into(), w.mid);
        p.metrics.insert("width_high".into(), w.high);
        p.metrics.insert("imbalance_db".into(), imbalance);
        p.deltas = deltas;
        p
    }

    fn tone(&self) -> Proposal {
        let s = self.summary;
        let t = self.targets;
        let w = &s.width;
        let mut p = Proposal::new(TONE_ID, "Tone");
        let mut deltas = Vec::new();

        let slope = s.slope_db_per_octave;
        let correction = (t.slope_target_db - slope).clamp(-TILT_MAX_DB, TILT_MAX_DB);
        // A fit with no points reports slope 0, which is not a measurement.
        if s.tilt_points > 0 && correction.abs() > TILT_DEADBAND_DB {
            deltas.extend(self.delta(
                ids::TILT_DB,
                self.current(ids::TILT_DB) + correction,
                correction.abs() / TILT_MAX_DB,
                format!(
                    "Slope {slope:.1} dB/oct vs {:.1} target: tilt {correction:+.1} dB",
                    t.slope_target_db
                ),
            ));
        }

        let low_excess = w.low - t.width_low;
        if w.power_low > SILENT_POWER && low_excess > SHELF_TRIGGER {
            let boost = (4.0 * low_excess).min(3.0);
            deltas.extend(self.delta(
                ids::BASS_DB,
                self.current(ids::BASS_DB) + boost,
                low_excess.min(1.0),
                format!("Diffuse low end ({:.2}): firm up the centre bass", w.low),
            ));
        }

        let high_deficit = t.width_high - w.high;
        if w.power_high > SILENT_POWER && high_deficit > SHELF_TRIGGER {
            let boost = (4.0 * high_deficit).min(3.0);
            deltas.extend(self.delta(
                ids::AIR_DB,
                self.current(ids::AIR_DB) + boost,
                high_deficit.min(1.0),
                format!("Narrow top ({:.2}): lift the air shelf", w.high),
            ));
        }

        let mid_excess = w.mid - t.width_mid;
        if w.power_mid > SILENT_POWER && mid_excess > SHELF_TRIGGER {
            let cut = (4.0 * mid_excess).min(3.0);
            deltas.extend(self.delta(
                ids::SCOOP_DB,
                self.current(ids::SCOOP_DB) - cut,
                mid_excess.min(1.0),
                format!("Spread mids ({:.2}): scoop to clear the centre", w.mid),
            ));
        }

        let tonal = &s.tonal;
        let low_unstable = w.power_low > SILENT_POWER && s.band_correlation_low < t.corr_floor;
        let rumble = tonal.rumble > t.rumble_gate();
        if rumble || low_unstable {
            let hp = if rumble { 40.0 } else { 30.0 };
            let reason = if rumble {
                format!("Rumble ratio {:.2} above {:.2}", tonal.rumble, t.rumble_gate())
            } else {
                format!(
                    "Low-band correlation {:.2} under floor {:.2}",
                    s.band_correlation_low, t.corr_floor
                )
            };
            deltas.extend(self.delta(
                ids::HP_HZ,
                self.current(ids::HP_HZ).max(hp),
                if rumble { tonal.rumble } else { 0.5 },
                reason,
            ));
        }

        let fizz = tonal.fizz > t.fizz_gate();
        let sibilant = tonal.sibilance > t.sibilance_gate();
        if fizz || sibilant {
            let lp = if fizz { 16000.0 } else { 14000.0 };
            let reason = if fizz {
                format!("Fizz ratio {:.2} above {:.2}", tonal.fizz, t.fizz_gate())
            } else {
                format!(
                    "Sibilance ratio {:.2} above {:.2}",
                    tonal.sibilance,
                    t.sibilance_gate()
                )
            };
            deltas.extend(self.delta(
                ids::LP_HZ,
                self.current(ids::LP_HZ).min(lp),
                tonal.fizz.max(tonal.sibilance),
                reason,
            ));
        }

        p.summary = format!(
            "Slope {slope:.1} dB/oct, crest {:.1} dB, rumble {:.2}, fizz {:.2}",
            s.crest_db, tonal.rumble, tonal.fizz
        );
        p.metrics.insert("slope_db_per_oct".into(), slope);
        p.metrics.insert("slope_target".into(), t.slope_target_db);
        p.metrics.insert("crest_db".into(), s.crest_db);
        p.metrics.insert("rumble".into(), tonal.rumble);
        p.metrics.insert("fizz".into(), tonal.fizz);
        p.metrics.insert("sibilance".into(), tonal.sibilance);
        p.deltas = deltas;
        p
    }

    fn space(&self) -> Proposal {
        let s = self.summary;
        let t = self.targets;
        let mut p = Proposal::new(SPACE_ID, "Reverb / Delay / Motion");
        p.metrics.insert("dryness".into(), s.dryness);
        p.metrics.insert("flux".into(), s.flux);
        p.metrics.insert("correlation".into(), s.correlation);

        if self.context.track.is_bus() {
            p.summary = format!(
                "Dryness {:.2}; no automatic sends on a {}",
                s.dryness,
                self.context.track.name()
            );
            return p;
        }

        if s.is_silent() {
            p.summary = "Nothing heard; space left as is".to_string();
            return p;
        }

        let mut deltas = Vec::new();

        let depth = t.depth_min + s.dryness * (t.depth_max - t.depth_min);
        deltas.extend(self.delta(
            ids::SPACE_DEPTH,
            depth,
            s.dryness,
            format!("Dryness {:.2}: depth {depth:.2}", s.dryness),
        ));

        // 1 = bright space for dark sources, 0 = dark space otherwise.
        let bright = s.slope_db_per_octave < 0.0;
        deltas.extend(self.delta(
            ids::SPACE_ALGO,
            if bright { 1.0 } else { 0.0 },
            0.5,
            if bright {
                "Dark source: bright space".to_string()
            } else {
                "Bright source: dark space".to_string()
            },
        ));

        if s.correlation > DUCK_CORR {
            let reason = format!("Correlation {:.2}: duck the wet signal", s.correlation);
            let bundle = [
                (ids::DUCK_DEPTH_DB, t.duck_depth_db),
                (ids::DUCK_ATTACK_MS, t.duck_attack_ms),
                (ids::DUCK_RELEASE_MS, t.duck_release_ms),
                (ids::DUCK_THRESHOLD_DB, t.duck_threshold_db),
                (ids::DUCK_RATIO, t.duck_ratio),
                (ids::DUCK_WET_ONLY, 1.0),
            ];
            for (id, value) in bundle {
                deltas.extend(self.delta(id, value, s.correlation, reason.clone()));
            }
        }

        p.summary = format!("Dryness {:.2}, flux {:.3}", s.dryness, s.flux);
        p.deltas = deltas;
        p
    }
}
