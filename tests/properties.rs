//! Property tests for the measurement and apply invariants.
//!
//! Run with:
//! ```bash
//! cargo test -p field --test properties
//! ```

mod helpers;

use field::prelude::*;
use field::{AnalysisSession, ApplyController, SafetyRails};
use helpers::tolerances::*;
use helpers::*;
use proptest::prelude::*;
use std::sync::Arc;

fn small_config() -> MachineConfig {
    MachineConfig {
        fft_order: 10,
        ..MachineConfig::default()
    }
}

fn tone_proposal() -> Proposal {
    let mut p = Proposal::new("tone", "Tone");
    p.deltas
        .push(ParamDelta::new(ids::TILT_DB, 0.0, 3.5, (-6.0, 6.0), 0.8, "tilt"));
    p.deltas
        .push(ParamDelta::new(ids::HP_HZ, 20.0, 300.0, (20.0, 400.0), 0.5, "hp"));
    p.deltas
        .push(ParamDelta::new(ids::WIDTH_HI, 1.0, 2.0, (0.0, 2.0), 0.5, "width"));
    p
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_revert_restores_any_blend(amount in 0.0f32..=1.0, tilt in -6.0f32..6.0) {
        let tree = Arc::new(ParameterTree::field_defaults());
        tree.write(ids::TILT_DB, tilt).unwrap();
        let before = tree.snapshot();

        let controller = ApplyController::new(tree.clone());
        controller.apply_blended(&tone_proposal(), amount);
        controller.revert();

        prop_assert_eq!(tree.snapshot(), before);
    }

    #[test]
    fn prop_writes_respect_ranges_and_rails(
        amount in 0.0f32..=1.0,
        mono in 20.0f32..300.0,
        width_max in 1.0f32..2.0,
    ) {
        let tree = Arc::new(ParameterTree::field_defaults());
        tree.write(ids::MONO_HZ, mono).unwrap();
        let mut controller = ApplyController::new(tree.clone());
        controller.set_rails(SafetyRails { width_max });

        controller.apply_blended(&tone_proposal(), amount);

        let tilt = tree.value(ids::TILT_DB).unwrap();
        prop_assert!((-6.0..=6.0).contains(&tilt));
        let hp = tree.value(ids::HP_HZ).unwrap();
        prop_assert!(hp <= tree.value(ids::MONO_HZ).unwrap() + 20.0 + FLOAT_EPSILON as f32);
        prop_assert!(tree.value(ids::WIDTH_HI).unwrap() <= width_max);
    }

    #[test]
    fn prop_blend_endpoints(
        tilt in -6.0f32..6.0,
        mono in 20.0f32..300.0,
        hp in 20.0f32..400.0,
        width in 0.0f32..2.0,
    ) {
        // Seeded values may already sit outside the rails.
        let tree = Arc::new(ParameterTree::field_defaults());
        tree.write(ids::TILT_DB, tilt).unwrap();
        tree.write(ids::MONO_HZ, mono).unwrap();
        tree.write(ids::HP_HZ, hp).unwrap();
        tree.write(ids::WIDTH_HI, width).unwrap();
        let mut controller = ApplyController::new(tree.clone());
        controller.set_rails(SafetyRails { width_max: 1.2 });
        let p = tone_proposal();

        let before = tree.snapshot();
        controller.apply_blended(&p, 0.0);
        prop_assert_eq!(tree.snapshot(), before);

        controller.apply_blended(&p, 1.0);
        let blended = tree.snapshot();
        controller.revert();
        controller.apply(&p);
        prop_assert_eq!(tree.snapshot(), blended);
    }

    #[test]
    fn prop_sums_are_chunking_invariant(split in 1usize..12_000, seed in 0u64..1000) {
        let left = generate_noise(12_000, seed);
        let right = generate_noise(12_000, seed + 1);

        let mut whole = AnalysisSession::new(&small_config()).unwrap();
        whole.process_block(&left, Some(&right));

        let mut parts = AnalysisSession::new(&small_config()).unwrap();
        parts.process_block(&left[..split], Some(&right[..split]));
        parts.process_block(&left[split..], Some(&right[split..]));

        let a = whole.accumulator();
        let b = parts.accumulator();
        prop_assert_eq!(a.stereo.samples, b.stereo.samples);
        prop_assert_eq!(&a.bands.frames, &b.bands.frames);

        let rel = |x: f64, y: f64| (x - y).abs() / x.abs().max(1.0);
        prop_assert!(rel(a.stereo.sum_lr, b.stereo.sum_lr) < SUM_EPSILON);
        for (x, y) in a.bands.sum_ll.iter().zip(&b.bands.sum_ll) {
            prop_assert!(rel(*x, *y) < SUM_EPSILON);
        }
    }

    #[test]
    fn prop_summary_stays_bounded(mix in 0.0f32..=1.0, seed in 0u64..1000) {
        let a = generate_noise(16_384, seed);
        let b = generate_noise(16_384, seed + 7);
        let right: Vec<f32> = a.iter().zip(&b).map(|(x, y)| mix * x + (1.0 - mix) * y).collect();

        let mut session = AnalysisSession::new(&small_config()).unwrap();
        session.process_block(&a, Some(&right));
        let summary = session.summarize().unwrap();

        prop_assert!((-1.0..=1.0).contains(&summary.correlation));
        for corr in [
            summary.band_correlation_low,
            summary.band_correlation_mid,
            summary.band_correlation_high,
        ] {
            prop_assert!((-1.0..=1.0).contains(&corr));
        }
        for width in [summary.width.low, summary.width.mid, summary.width.high] {
            prop_assert!((0.0..=1.0).contains(&width));
        }
        prop_assert!((0.0..=1.0).contains(&summary.dryness));
    }
}
