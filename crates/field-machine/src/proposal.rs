//! Proposed parameter changes.

use std::collections::BTreeMap;

/// One bounded parameter change with provenance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ParamDelta {
    pub id: String,
    /// Parameter value when the delta was built.
    pub current: f32,
    /// Always within `[lo, hi]`.
    pub target: f32,
    pub lo: f32,
    pub hi: f32,
    /// Relevance / confidence in [0, 1].
    pub weight: f32,
    pub rationale: String,
}

impl ParamDelta {
    /// Target is clamped into `[lo, hi]` and weight into [0, 1].
    pub fn new(
        id: impl Into<String>,
        current: f32,
        target: f32,
        (lo, hi): (f32, f32),
        weight: f32,
        rationale: impl Into<String>,
    ) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Self {
            id: id.into(),
            current,
            target: target.clamp(lo, hi),
            lo,
            hi,
            weight: weight.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }

    /// Signed distance from the snapshot value to the target.
    pub fn magnitude(&self) -> f32 {
        self.target - self.current
    }
}

/// A named bundle of deltas plus display metrics.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub deltas: Vec<ParamDelta>,
    pub metrics: BTreeMap<String, f64>,
}

impl Proposal {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn delta(&self, id: &str) -> Option<&ParamDelta> {
        self.deltas.iter().find(|delta| delta.id == id)
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_clamped() {
        let delta = ParamDelta::new("tilt_db", 0.0, 9.0, (-6.0, 6.0), 1.4, "");
        assert_eq!(delta.target, 6.0);
        assert_eq!(delta.weight, 1.0);
        assert_eq!(delta.magnitude(), 6.0);
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let delta = ParamDelta::new("x", 0.0, -3.0, (2.0, -2.0), 0.5, "");
        assert_eq!((delta.lo, delta.hi), (-2.0, 2.0));
        assert_eq!(delta.target, -2.0);
    }

    #[test]
    fn test_lookup() {
        let mut proposal = Proposal::new("tone", "Tone");
        proposal
            .deltas
            .push(ParamDelta::new("air_db", 0.0, 1.5, (-6.0, 6.0), 0.5, "more air"));
        proposal.metrics.insert("slope".into(), -4.2);

        assert!(proposal.delta("air_db").is_some());
        assert!(proposal.delta("bass_db").is_none());
        assert_eq!(proposal.metric("slope"), Some(-4.2));
    }
}
