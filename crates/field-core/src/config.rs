//! Machine analysis configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Longest listening window a session may request, in seconds.
pub const MAX_LISTEN_SECONDS: f64 = 300.0;

/// Configuration for the Machine analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub sample_rate: f64,
    /// FFT size is `1 << fft_order`.
    pub fft_order: u32,
    /// Default listening window for a Learn session.
    pub listen_seconds: f64,
    /// Cap on samples pulled from a tap per tick.
    pub max_pull_samples: usize,
    pub band_min_hz: f64,
    pub band_max_hz: f64,
    /// Crossover between the low and mid width regions.
    pub width_split_low_hz: f64,
    /// Crossover between the mid and high width regions.
    pub width_split_high_hz: f64,
    /// Capacity (stereo frames) of each audio tap ring buffer.
    pub tap_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            fft_order: 12,
            listen_seconds: 10.0,
            max_pull_samples: 4096,
            band_min_hz: 20.0,
            band_max_hz: 20000.0,
            width_split_low_hz: 120.0,
            width_split_high_hz: 2500.0,
            tap_capacity: 65536,
        }
    }
}

impl MachineConfig {
    /// Parse a (possibly partial) TOML document and validate it.
    ///
    /// Missing keys fall back to [`MachineConfig::default`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: MachineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_listen_seconds(mut self, seconds: f64) -> Self {
        self.listen_seconds = seconds;
        self
    }

    pub fn fft_size(&self) -> usize {
        1usize << self.fft_order
    }

    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if !(8..=15).contains(&self.fft_order) {
            return Err(Error::InvalidFftOrder(self.fft_order));
        }
        if !(self.listen_seconds > 0.0 && self.listen_seconds <= MAX_LISTEN_SECONDS) {
            return Err(Error::InvalidConfig(format!(
                "listen_seconds {} out of range (0-{} s)",
                self.listen_seconds, MAX_LISTEN_SECONDS
            )));
        }
        if self.max_pull_samples == 0 {
            return Err(Error::InvalidConfig(
                "max_pull_samples must be non-zero".into(),
            ));
        }
        if self.tap_capacity == 0 {
            return Err(Error::InvalidConfig("tap_capacity must be non-zero".into()));
        }
        if !(self.band_min_hz > 0.0 && self.band_min_hz < self.band_max_hz) {
            return Err(Error::InvalidConfig(format!(
                "band range {}-{} Hz is empty",
                self.band_min_hz, self.band_max_hz
            )));
        }
        if !(self.width_split_low_hz > 0.0 && self.width_split_low_hz < self.width_split_high_hz)
        {
            return Err(Error::InvalidConfig(format!(
                "width splits {} / {} Hz are not ascending",
                self.width_split_low_hz, self.width_split_high_hz
            )));
        }
        Ok(())
    }
}
