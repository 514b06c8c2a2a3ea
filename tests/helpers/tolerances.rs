//! Tolerance constants for analysis testing.

/// Floating point rounding errors (parameter writes and reverts).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Relative tolerance between sums accumulated in a different block order.
pub const SUM_EPSILON: f64 = 1e-9;

/// Two seconds of independent noise correlate to well within this.
pub const CORRELATION_NOISE: f64 = 0.05;

/// Width of a fully mono signal.
pub const MONO_WIDTH: f64 = 1e-6;
