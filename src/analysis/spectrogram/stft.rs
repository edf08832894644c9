//! Magnitude STFT for spectrogram plots
//!
//! # Parameter Choices
//!
//! - **WINDOW_SIZE = 2048**: ~43ms at 48kHz with 1025 bins (~23 Hz resolution),
//!   enough to see a lossy encoder's low-pass shelf.
//! - **HOP_LENGTH = 256**: 87.5% overlap, smooth along the time axis.
//! - **Hann window**: tapers frame edges to limit spectral leakage.
//!
//! Frames are handed to a callback as they are computed, so memory stays at
//! one frame no matter how long the track is.

use rustfft::{num_complex::Complex, FftPlanner};

/// FFT window size
pub const WINDOW_SIZE: usize = 2048;

/// Hop length between frames
pub const HOP_LENGTH: usize = 256;

/// Number of frequency bins in positive-frequency half of spectrum
pub const NUM_FREQ_BINS: usize = WINDOW_SIZE / 2 + 1;

/// Floor for magnitudes before taking the log
const MIN_MAGNITUDE: f32 = 1e-10;

/// Number of frames [`for_each_frame`] yields for `len` samples
///
/// A signal shorter than one window yields a single zero-padded frame; an
/// empty signal yields none.
pub fn frame_count(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    len.saturating_sub(WINDOW_SIZE) / HOP_LENGTH + 1
}

/// Compute dB-scaled magnitude frames of mono samples, in time order
///
/// `on_frame` receives the frame index and `NUM_FREQ_BINS` magnitudes. The
/// slice is reused for the next frame.
pub fn for_each_frame(samples: &[f32], mut on_frame: impl FnMut(usize, &[f32])) {
    let num_frames = frame_count(samples.len());
    if num_frames == 0 {
        return;
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(WINDOW_SIZE);
    let window = hann_window(WINDOW_SIZE);

    let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); WINDOW_SIZE];
    let mut frame = vec![0.0f32; NUM_FREQ_BINS];

    for frame_idx in 0..num_frames {
        let start = frame_idx * HOP_LENGTH;
        let end = (start + WINDOW_SIZE).min(samples.len());

        for (i, (slot, &w)) in buffer.iter_mut().zip(window.iter()).enumerate() {
            let sample = if start + i < end { samples[start + i] } else { 0.0 };
            *slot = Complex::new(sample * w, 0.0);
        }

        fft.process(&mut buffer);

        for (db, c) in frame.iter_mut().zip(&buffer[..NUM_FREQ_BINS]) {
            *db = 20.0 * c.norm().max(MIN_MAGNITUDE).log10();
        }
        on_frame(frame_idx, &frame);
    }
}

/// Centre frequency of a bin in Hz
pub fn bin_frequency(bin: usize, sample_rate: u32) -> f32 {
    bin as f32 * sample_rate as f32 / WINDOW_SIZE as f32
}

/// Generate Hann window of given size
pub fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}
