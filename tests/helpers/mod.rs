//! Test helpers and fixtures for Field integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (parameter writes, reverts)
//! - `SUM_EPSILON` (1e-9): Relative error between accumulated sums
//! - `CORRELATION_NOISE` (0.05): Statistical slack on noise correlation

#![allow(dead_code)]

pub mod tolerances;

use field::prelude::*;
use field::ManualClock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Default test sample rate (matches the plugin default)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Block size used to mimic tick-sized pulls
pub const TEST_BLOCK_SIZE: usize = 4096;

/// Install a fmt subscriber that writes through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Engine over a fresh default parameter tree, driven by a manual clock.
pub fn test_engine(clock: &ManualClock) -> (MachineEngine, Arc<ParameterTree>) {
    let tree = Arc::new(ParameterTree::field_defaults());
    let engine = MachineEngine::builder()
        .config(MachineConfig::default().with_sample_rate(TEST_SAMPLE_RATE))
        .store(tree.clone())
        .clock(Arc::new(clock.clone()))
        .build()
        .expect("Failed to create test engine");
    (engine, tree)
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (0.5 * (2.0 * std::f64::consts::PI * frequency * t).sin()) as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Seeded white noise in -0.5..0.5.
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples).map(|_| rng.gen_range(-0.5f32..0.5)).collect()
}

/// Feed a stereo stream to the engine in tick-sized blocks.
pub fn feed(engine: &mut MachineEngine, left: &[f32], right: Option<&[f32]>) {
    match right {
        Some(right) => {
            for (l, r) in left.chunks(TEST_BLOCK_SIZE).zip(right.chunks(TEST_BLOCK_SIZE)) {
                engine.process_block(l, Some(r));
            }
        }
        None => {
            for l in left.chunks(TEST_BLOCK_SIZE) {
                engine.process_block(l, None);
            }
        }
    }
}

/// Run one complete Learn session over `left`/`right` and finalize it.
pub fn learn(
    engine: &mut MachineEngine,
    context: Context,
    left: &[f32],
    right: Option<&[f32]>,
) -> Arc<Vec<Proposal>> {
    engine.start_learning(context, ListenSource::Pre);
    feed(engine, left, right);
    engine.stop(true);
    assert_eq!(engine.state(), MachineState::Ready);
    engine.proposals()
}

/// Find a proposal by id.
pub fn proposal<'a>(proposals: &'a [Proposal], id: &str) -> &'a Proposal {
    proposals
        .iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("missing proposal '{id}'"))
}

/// Assert every delta targets a value inside its declared range.
pub fn assert_targets_in_range(proposals: &[Proposal]) {
    for p in proposals {
        for d in &p.deltas {
            assert!(
                d.lo <= d.target && d.target <= d.hi,
                "{}: target {} outside [{}, {}]",
                d.id,
                d.target,
                d.lo,
                d.hi
            );
        }
    }
}
