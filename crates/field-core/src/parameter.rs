//! Parameter ranges for the plugin's automatable controls.
//!
//! Every control the Machine may touch has a real-valued range, a default and a
//! scale. The scale decides how far apart two values really are: a move from
//! 20 to 40 Hz on a log-scaled filter is as large as one from 200 to 400 Hz.
//!
//! # Example
//!
//! ```
//! use field_core::ParameterRange;
//!
//! // Mono-maker frequency: 20 Hz to 300 Hz, logarithmic
//! let mono = ParameterRange::logarithmic(20.0, 300.0, 60.0);
//! assert_eq!(mono.clamp(500.0), 300.0);
//!
//! let octave_low = mono.normalize(40.0) - mono.normalize(20.0);
//! let octave_high = mono.normalize(300.0) - mono.normalize(150.0);
//! assert!((octave_low - octave_high).abs() < 1e-4);
//! ```

use serde::{Deserialize, Serialize};

/// How a parameter's real values map onto its 0-1 position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ParameterScale {
    /// `position = (value - min) / (max - min)`
    #[default]
    Linear,

    /// `position = ln(value/min) / ln(max/min)`, requires `min > 0`.
    Logarithmic,

    /// Off (`min`) or on (`max`).
    Toggle,

    /// Values are quantized to integers between `min` and `max`.
    Integer,
}

/// Valid range, default and scaling of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub scale: ParameterScale,
}

impl ParameterRange {
    /// Create a new parameter range. `default` is clamped into `[min, max]`.
    pub fn new(min: f32, max: f32, default: f32, scale: ParameterScale) -> Self {
        debug_assert!(max > min, "max must be greater than min");

        Self {
            min,
            max,
            default: default.clamp(min, max),
            scale,
        }
    }

    pub fn linear(min: f32, max: f32, default: f32) -> Self {
        Self::new(min, max, default, ParameterScale::Linear)
    }

    /// # Panics
    ///
    /// Panics in debug mode if `min <= 0`.
    pub fn logarithmic(min: f32, max: f32, default: f32) -> Self {
        debug_assert!(min > 0.0, "logarithmic scale requires min > 0");
        Self::new(min, max, default, ParameterScale::Logarithmic)
    }

    pub fn toggle(default_on: bool) -> Self {
        Self::new(
            0.0,
            1.0,
            if default_on { 1.0 } else { 0.0 },
            ParameterScale::Toggle,
        )
    }

    pub fn integer(min: i32, max: i32, default: i32) -> Self {
        Self::new(
            min as f32,
            max as f32,
            default as f32,
            ParameterScale::Integer,
        )
    }

    /// Position of a real value within the range, 0.0-1.0 along its scale.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let value = self.clamp(value);
        let range = self.span();

        if range <= 0.0 {
            return 0.0;
        }

        match self.scale {
            ParameterScale::Linear => (value - self.min) / range,

            ParameterScale::Logarithmic => {
                if self.min <= 0.0 {
                    (value - self.min) / range
                } else {
                    let log_min = self.min.ln();
                    let log_max = self.max.ln();
                    (value.ln() - log_min) / (log_max - log_min)
                }
            }

            ParameterScale::Toggle => {
                if value >= (self.min + self.max) / 2.0 {
                    1.0
                } else {
                    0.0
                }
            }

            ParameterScale::Integer => (value.round() - self.min) / range,
        }
    }

    /// Clamp a real value to this parameter's range, snapping discrete scales.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let value = value.clamp(self.min, self.max);
        match self.scale {
            ParameterScale::Integer => value.round(),
            ParameterScale::Toggle => {
                if value >= (self.min + self.max) / 2.0 {
                    self.max
                } else {
                    self.min
                }
            }
            _ => value,
        }
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

impl Default for ParameterRange {
    fn default() -> Self {
        Self::linear(0.0, 1.0, 0.5)
    }
}
