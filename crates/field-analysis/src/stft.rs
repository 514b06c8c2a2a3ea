//! Sliding-window STFT for the listening session.
//!
//! Incoming stereo blocks are queued until a full FFT window is available,
//! then analysed every hop (half a window). Each frame yields three
//! half-spectra (mid, left, right) plus two running measurements:
//!
//! - **Spectral flux**: Σ max(0, |X| - |X_prev|) / Σ (|X| + ε) over the mid
//!   spectrum, a 0-1 measure of frame-to-frame transient energy
//! - **Tilt samples**: `(log2(f), dB)` pairs at fixed log-spaced frequencies
//!   for a later least-squares slope fit
//!
//! Leftover samples carry over to the next call, so the frames produced are
//! independent of how the stream is chunked.

use crate::accumulator::AnalysisAccumulator;
use field_core::{Error, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Number of log-spaced points sampled for the tilt fit.
pub const TILT_POINTS: usize = 18;

const TILT_MIN_HZ: f64 = 40.0;
const TILT_MAX_HZ: f64 = 16000.0;

const FLUX_EPSILON: f64 = 1e-9;

/// Floor added before converting power to dB.
const DB_FLOOR: f64 = 1e-12;

/// One analysed frame. Each slice holds bins `0..=fft_size / 2`.
pub struct SpectralFrame<'a> {
    pub mid: &'a [Complex<f32>],
    pub left: &'a [Complex<f32>],
    pub right: &'a [Complex<f32>],
}

#[derive(Debug, Clone, Copy)]
struct TiltPoint {
    bin: usize,
    log2_hz: f64,
}

/// Windowed STFT over a stereo stream.
pub struct SpectralFrameAnalyzer {
    sample_rate: f64,
    fft_size: usize,
    hop_size: usize,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    window: Vec<f32>,
    /// Amplitude normalisation so a full-scale sine peaks near 0 dB.
    amplitude_scale: f64,
    fifo_left: Vec<f32>,
    fifo_right: Vec<f32>,
    mid_buf: Vec<Complex<f32>>,
    left_buf: Vec<Complex<f32>>,
    right_buf: Vec<Complex<f32>>,
    prev_magnitudes: Vec<f32>,
    tilt_points: Vec<TiltPoint>,
}

impl SpectralFrameAnalyzer {
    /// Allocate the FFT plan, window and buffers for `1 << fft_order` points.
    pub fn prepare(sample_rate: f64, fft_order: u32) -> Result<Self> {
        if !(8..=15).contains(&fft_order) {
            return Err(Error::InvalidFftOrder(fft_order));
        }
        if !(8000.0..=384000.0).contains(&sample_rate) {
            return Err(Error::InvalidSampleRate(sample_rate));
        }

        let fft_size = 1usize << fft_order;
        let hop_size = fft_size / 2;
        let half_len = fft_size / 2 + 1;

        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let window = Self::create_hann_window(fft_size);
        let window_sum: f64 = window.iter().map(|&w| w as f64).sum();

        Ok(Self {
            sample_rate,
            fft_size,
            hop_size,
            fft,
            scratch,
            window,
            amplitude_scale: 2.0 / window_sum,
            fifo_left: Vec::with_capacity(fft_size * 2),
            fifo_right: Vec::with_capacity(fft_size * 2),
            mid_buf: vec![Complex::new(0.0, 0.0); fft_size],
            left_buf: vec![Complex::new(0.0, 0.0); fft_size],
            right_buf: vec![Complex::new(0.0, 0.0); fft_size],
            prev_magnitudes: vec![0.0; half_len],
            tilt_points: Self::tilt_points(sample_rate, fft_size),
        })
    }

    fn create_hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                let angle = 2.0 * core::f32::consts::PI * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - angle.cos())
            })
            .collect()
    }

    fn tilt_points(sample_rate: f64, fft_size: usize) -> Vec<TiltPoint> {
        let half = fft_size / 2;
        let f_hi = TILT_MAX_HZ.min(sample_rate * 0.45);
        let ratio = f_hi / TILT_MIN_HZ;

        (0..TILT_POINTS)
            .map(|i| {
                let hz = TILT_MIN_HZ * ratio.powf(i as f64 / (TILT_POINTS - 1) as f64);
                let bin = ((hz * fft_size as f64 / sample_rate).round() as usize).clamp(1, half);
                let bin_hz = bin as f64 * sample_rate / fft_size as f64;
                TiltPoint {
                    bin,
                    log2_hz: bin_hz.log2(),
                }
            })
            .collect()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Bins per half-spectrum, DC through Nyquist.
    pub fn half_len(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Samples queued but not yet consumed by a full frame.
    pub fn pending_samples(&self) -> usize {
        self.fifo_left.len()
    }

    /// Drop queued audio and flux history.
    pub fn reset(&mut self) {
        self.fifo_left.clear();
        self.fifo_right.clear();
        self.prev_magnitudes.fill(0.0);
    }

    /// Feed a stereo block; `right == None` analyses `left` as dual mono.
    ///
    /// Whole-signal sums, flux and tilt go straight into `acc`; `on_frame`
    /// runs once per completed frame (band aggregation hooks in there).
    /// Returns the number of frames produced.
    pub fn process_block<F>(
        &mut self,
        left: &[f32],
        right: Option<&[f32]>,
        acc: &mut AnalysisAccumulator,
        mut on_frame: F,
    ) -> usize
    where
        F: FnMut(&SpectralFrame<'_>, &mut AnalysisAccumulator),
    {
        let right = right.unwrap_or(left);
        let len = left.len().min(right.len());
        let (left, right) = (&left[..len], &right[..len]);

        acc.stereo.add(left, right);
        self.fifo_left.extend_from_slice(left);
        self.fifo_right.extend_from_slice(right);

        let half_len = self.half_len();
        let mut offset = 0usize;
        let mut frames = 0usize;

        while self.fifo_left.len() - offset >= self.fft_size {
            self.transform(offset);
            self.measure(acc);

            let frame = SpectralFrame {
                mid: &self.mid_buf[..half_len],
                left: &self.left_buf[..half_len],
                right: &self.right_buf[..half_len],
            };
            on_frame(&frame, acc);

            offset += self.hop_size;
            frames += 1;
        }

        self.fifo_left.drain(..offset);
        self.fifo_right.drain(..offset);

        frames
    }

    /// Window and transform the frame starting at `offset` in the queue.
    fn transform(&mut self, offset: usize) {
        let end = offset + self.fft_size;
        let frame_left = &self.fifo_left[offset..end];
        let frame_right = &self.fifo_right[offset..end];

        for i in 0..self.fft_size {
            let w = self.window[i];
            let l = frame_left[i];
            let r = frame_right[i];
            self.mid_buf[i] = Complex::new(0.5 * (l + r) * w, 0.0);
            self.left_buf[i] = Complex::new(l * w, 0.0);
            self.right_buf[i] = Complex::new(r * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.mid_buf, &mut self.scratch);
        self.fft
            .process_with_scratch(&mut self.left_buf, &mut self.scratch);
        self.fft
            .process_with_scratch(&mut self.right_buf, &mut self.scratch);
    }

    /// Flux and tilt sampling on the freshly transformed mid spectrum.
    fn measure(&mut self, acc: &mut AnalysisAccumulator) {
        let half_len = self.half_len();

        let mut rise = 0.0f64;
        let mut total = 0.0f64;
        let mut power = 0.0f64;
        for (prev, c) in self.prev_magnitudes.iter_mut().zip(&self.mid_buf[..half_len]) {
            let mag = c.norm();
            let diff = (mag - *prev) as f64;
            if diff > 0.0 {
                rise += diff;
            }
            total += mag as f64 + FLUX_EPSILON;
            power += c.norm_sqr() as f64;
            *prev = mag;
        }
        acc.add_flux(rise / total);

        // Silent frames carry no tilt information.
        if power <= DB_FLOOR {
            return;
        }

        for point in &self.tilt_points {
            let amplitude = self.mid_buf[point.bin].norm() as f64 * self.amplitude_scale;
            let db = 10.0 * (amplitude * amplitude + DB_FLOOR).log10();
            acc.tilt.add(point.log2_hz, db);
        }
    }
}
