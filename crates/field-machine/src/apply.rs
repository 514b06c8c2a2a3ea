//! Apply, blend and revert proposals against the live parameter store.
//!
//! The first write to any parameter records its prior value in the baseline
//! snapshot; [`ApplyController::revert`] restores every recorded value and
//! [`ApplyController::commit`] forgets them. Two rails hold on every write:
//! `width_hi` never exceeds the session's `width_max`, and `hp_hz` never
//! exceeds the current `mono_hz` plus 20 Hz.

use crate::proposal::{ParamDelta, Proposal};
use field_core::{ids, ParamError, ParamStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Headroom the high-pass keeps below the mono split.
pub const HP_MONO_MARGIN_HZ: f32 = 20.0;

/// Hard ceilings applied at write time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyRails {
    pub width_max: f32,
}

impl Default for SafetyRails {
    fn default() -> Self {
        Self { width_max: 2.0 }
    }
}

/// Per-delta outcome of an apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// `(id, value now in the store)` or the reason the delta was skipped.
    pub results: Vec<(String, Result<f32, ParamError>)>,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &ParamError)> {
        self.results
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (id.as_str(), e)))
    }

    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_ok())
    }

    pub fn value(&self, id: &str) -> Option<f32> {
        self.results
            .iter()
            .find(|(key, _)| key == id)
            .and_then(|(_, r)| r.as_ref().ok().copied())
    }
}

/// Merge deltas by parameter id. A later proposal wins on collision; the
/// merged delta keeps the position of the first occurrence.
pub fn merge_deltas(proposals: &[Proposal]) -> Vec<ParamDelta> {
    let mut merged: Vec<ParamDelta> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for delta in proposals.iter().flat_map(|p| p.deltas.iter()) {
        match index.get(&delta.id) {
            Some(&slot) => merged[slot] = delta.clone(),
            None => {
                index.insert(delta.id.clone(), merged.len());
                merged.push(delta.clone());
            }
        }
    }

    merged
}

pub struct ApplyController {
    store: Arc<dyn ParamStore>,
    baseline: Mutex<Vec<(String, f32)>>,
    rails: SafetyRails,
}

impl ApplyController {
    pub fn new(store: Arc<dyn ParamStore>) -> Self {
        Self {
            store,
            baseline: Mutex::new(Vec::new()),
            rails: SafetyRails::default(),
        }
    }

    pub fn set_rails(&mut self, rails: SafetyRails) {
        self.rails = rails;
    }

    pub fn rails(&self) -> SafetyRails {
        self.rails
    }

    pub fn store(&self) -> &Arc<dyn ParamStore> {
        &self.store
    }

    /// Write every delta's target.
    pub fn apply(&self, proposal: &Proposal) -> ApplyReport {
        self.apply_deltas(&proposal.deltas, 1.0)
    }

    /// Move each parameter `amount` of the way from its live value to the target.
    pub fn apply_blended(&self, proposal: &Proposal, amount: f32) -> ApplyReport {
        self.apply_deltas(&proposal.deltas, amount)
    }

    /// Blend several proposals at once, see [`merge_deltas`].
    pub fn apply_composite(&self, proposals: &[Proposal], amount: f32) -> ApplyReport {
        self.apply_deltas(&merge_deltas(proposals), amount)
    }

    /// Restore every baselined parameter, then clear the baseline.
    ///
    /// A no-op without a baseline.
    pub fn revert(&self) -> ApplyReport {
        let baseline = std::mem::take(&mut *self.baseline.lock());
        let mut report = ApplyReport::default();

        for (id, value) in baseline {
            let result = self.store.write(&id, value);
            report.results.push((id, result));
        }

        if !report.results.is_empty() {
            tracing::debug!(restored = report.applied(), "reverted preview");
        }
        report
    }

    /// Keep the applied values and forget the baseline.
    pub fn commit(&self) {
        self.baseline.lock().clear();
    }

    pub fn has_baseline(&self) -> bool {
        !self.baseline.lock().is_empty()
    }

    pub fn baseline(&self) -> Vec<(String, f32)> {
        self.baseline.lock().clone()
    }

    fn apply_deltas(&self, deltas: &[ParamDelta], amount: f32) -> ApplyReport {
        let mut report = ApplyReport::default();

        for delta in deltas {
            let result = self.apply_one(delta, amount);
            if let Err(err) = &result {
                tracing::warn!(id = %delta.id, %err, "skipping delta");
            }
            report.results.push((delta.id.clone(), result));
        }

        report
    }

    fn apply_one(&self, delta: &ParamDelta, amount: f32) -> Result<f32, ParamError> {
        let current = self.store.value(&delta.id)?;

        {
            let mut baseline = self.baseline.lock();
            if !baseline.iter().any(|(id, _)| id == &delta.id) {
                baseline.push((delta.id.clone(), current));
            }
        }

        // A zero blend is a pure read: no rail, no write.
        if amount <= 0.0 {
            return Ok(current);
        }

        let target = delta.target.clamp(delta.lo, delta.hi);
        let blended = if amount >= 1.0 {
            target
        } else {
            current + (target - current) * amount
        };
        let value = self.rail(&delta.id, blended.clamp(delta.lo, delta.hi));

        if value == current {
            return Ok(current);
        }
        self.store.write(&delta.id, value)
    }

    fn rail(&self, id: &str, value: f32) -> f32 {
        match id {
            ids::WIDTH_HI => value.min(self.rails.width_max),
            ids::HP_HZ => match self.store.value(ids::MONO_HZ) {
                Ok(mono) => value.min(mono + HP_MONO_MARGIN_HZ),
                Err(_) => value,
            },
            _ => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_core::{ParameterEvent, ParameterTree};

    fn setup() -> (Arc<ParameterTree>, ApplyController) {
        let tree = Arc::new(ParameterTree::field_defaults());
        let controller = ApplyController::new(tree.clone());
        (tree, controller)
    }

    fn proposal(id: &str, deltas: &[(&str, f32, (f32, f32))]) -> Proposal {
        let mut p = Proposal::new(id, id);
        for &(param, target, range) in deltas {
            p.deltas
                .push(ParamDelta::new(param, 0.0, target, range, 1.0, "test"));
        }
        p
    }

    #[test]
    fn test_full_apply_writes_targets() {
        let (tree, controller) = setup();
        let p = proposal("tone", &[(ids::TILT_DB, 2.0, (-6.0, 6.0)), (ids::AIR_DB, 1.5, (-6.0, 6.0))]);

        let report = controller.apply(&p);
        assert!(report.is_complete());
        assert_eq!(tree.value(ids::TILT_DB).unwrap(), 2.0);
        assert_eq!(tree.value(ids::AIR_DB).unwrap(), 1.5);
        assert!(controller.has_baseline());
    }

    #[test]
    fn test_blend_reads_live_value() {
        let (tree, controller) = setup();
        tree.write(ids::TILT_DB, 2.0).unwrap();
        let p = proposal("tone", &[(ids::TILT_DB, 4.0, (-6.0, 6.0))]);

        controller.apply_blended(&p, 0.5);
        assert_eq!(tree.value(ids::TILT_DB).unwrap(), 3.0);
    }

    #[test]
    fn test_zero_blend_leaves_store_untouched() {
        let (tree, controller) = setup();
        let events = tree.subscribe();
        let p = proposal("tone", &[(ids::TILT_DB, 4.0, (-6.0, 6.0))]);

        controller.apply_blended(&p, 0.0);
        assert_eq!(tree.value(ids::TILT_DB).unwrap(), 0.0);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_zero_blend_ignores_violated_rails() {
        let (tree, mut controller) = setup();
        tree.write(ids::MONO_HZ, 60.0).unwrap();
        tree.write(ids::HP_HZ, 200.0).unwrap();
        tree.write(ids::WIDTH_HI, 1.8).unwrap();
        controller.set_rails(SafetyRails { width_max: 1.2 });
        let events = tree.subscribe();

        let p = proposal(
            "mix",
            &[(ids::HP_HZ, 250.0, (20.0, 400.0)), (ids::WIDTH_HI, 1.9, (0.0, 2.0))],
        );
        let report = controller.apply_blended(&p, 0.0);

        assert_eq!(report.value(ids::HP_HZ), Some(200.0));
        assert_eq!(tree.value(ids::HP_HZ).unwrap(), 200.0);
        assert_eq!(tree.value(ids::WIDTH_HI).unwrap(), 1.8);
        assert!(events.try_recv().is_err());

        // Any non-zero blend goes through the rails.
        controller.apply_blended(&p, 0.5);
        assert_eq!(tree.value(ids::HP_HZ).unwrap(), 80.0);
        assert_eq!(tree.value(ids::WIDTH_HI).unwrap(), 1.2);
    }

    #[test]
    fn test_unknown_id_is_skipped() {
        let (tree, controller) = setup();
        let p = proposal(
            "x",
            &[("renamed_param", 1.0, (0.0, 2.0)), (ids::BASS_DB, 2.0, (-6.0, 6.0))],
        );

        let report = controller.apply(&p);
        assert_eq!(report.applied(), 1);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(
            skipped,
            vec![("renamed_param", &ParamError::NotFound("renamed_param".into()))]
        );
        assert_eq!(tree.value(ids::BASS_DB).unwrap(), 2.0);
    }

    #[test]
    fn test_revert_restores_and_clears() {
        let (tree, controller) = setup();
        tree.write(ids::AIR_DB, -1.0).unwrap();
        let p = proposal("tone", &[(ids::AIR_DB, 3.0, (-6.0, 6.0))]);

        controller.apply(&p);
        controller.apply_blended(&p, 0.3);
        controller.revert();

        assert_eq!(tree.value(ids::AIR_DB).unwrap(), -1.0);
        assert!(!controller.has_baseline());
        assert!(controller.revert().results.is_empty());
    }

    #[test]
    fn test_commit_keeps_values() {
        let (tree, controller) = setup();
        controller.apply(&proposal("tone", &[(ids::AIR_DB, 3.0, (-6.0, 6.0))]));
        controller.commit();

        assert!(!controller.has_baseline());
        controller.revert();
        assert_eq!(tree.value(ids::AIR_DB).unwrap(), 3.0);
    }

    #[test]
    fn test_width_rail() {
        let (tree, mut controller) = setup();
        controller.set_rails(SafetyRails { width_max: 1.4 });
        controller.apply(&proposal("img", &[(ids::WIDTH_HI, 1.9, (0.0, 2.0))]));
        assert_eq!(tree.value(ids::WIDTH_HI).unwrap(), 1.4);
    }

    #[test]
    fn test_high_pass_rail_tracks_mono() {
        let (tree, controller) = setup();
        tree.write(ids::MONO_HZ, 80.0).unwrap();
        controller.apply(&proposal("tone", &[(ids::HP_HZ, 200.0, (20.0, 400.0))]));
        assert_eq!(tree.value(ids::HP_HZ).unwrap(), 100.0);
    }

    #[test]
    fn test_composite_last_wins() {
        let (tree, controller) = setup();
        let a = proposal("a", &[(ids::TILT_DB, 2.0, (-6.0, 6.0)), (ids::BASS_DB, 1.0, (-6.0, 6.0))]);
        let b = proposal("b", &[(ids::TILT_DB, -2.0, (-6.0, 6.0))]);

        let merged = merge_deltas(&[a.clone(), b.clone()]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, ids::TILT_DB);
        assert_eq!(merged[0].target, -2.0);

        controller.apply_composite(&[a, b], 1.0);
        assert_eq!(tree.value(ids::TILT_DB).unwrap(), -2.0);
        assert_eq!(tree.value(ids::BASS_DB).unwrap(), 1.0);
    }

    #[test]
    fn test_writes_use_gestures() {
        let (tree, controller) = setup();
        let events = tree.subscribe();
        controller.apply(&proposal("tone", &[(ids::TILT_DB, 1.0, (-6.0, 6.0))]));

        let received: Vec<ParameterEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                ParameterEvent::GestureBegin {
                    id: ids::TILT_DB.into()
                },
                ParameterEvent::Changed {
                    id: ids::TILT_DB.into(),
                    value: 1.0
                },
                ParameterEvent::GestureEnd {
                    id: ids::TILT_DB.into()
                },
            ]
        );
    }
}
