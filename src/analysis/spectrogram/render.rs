//! Spectrogram image rendering
//!
//! Time runs left to right, frequency bottom to top (0 Hz to Nyquist).
//! Magnitudes are normalized to the track's peak over a fixed dB range and
//! mapped through the viridis colour map.

use super::stft;
use crate::analysis::traits::SpectrogramRenderer;
use crate::error::{RelprepError, Result};
use crate::types::AudioBuffer;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

/// Default plot width in pixels
pub const DEFAULT_WIDTH: u32 = 1600;

/// Default plot height in pixels
pub const DEFAULT_HEIGHT: u32 = 800;

/// Dynamic range shown below the peak
pub const DYNAMIC_RANGE_DB: f32 = 120.0;

/// Viridis anchor colours, evenly spaced from 0.0 to 1.0
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 144, 141],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

/// STFT renderer writing PNG images
#[derive(Debug, Clone, Copy)]
pub struct StftRenderer {
    width: u32,
    height: u32,
}

impl StftRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl Default for StftRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl SpectrogramRenderer for StftRenderer {
    fn render(&self, buffer: &AudioBuffer, title: &str, output: &Path) -> Result<()> {
        if buffer.sample_rate == 0 {
            return Err(RelprepError::render_error(output, "sample rate is 0"));
        }
        if buffer.is_empty() {
            return Err(RelprepError::render_error(output, "no samples decoded"));
        }

        let num_frames = stft::frame_count(buffer.samples.len());
        let mut grid = PixelGrid::new(self.width, self.height, num_frames);
        stft::for_each_frame(&buffer.samples, |index, frame| grid.add_frame(index, frame));
        let image = grid.into_image();

        image
            .save_with_format(output, ImageFormat::Png)
            .map_err(|e| RelprepError::render_error(output, format!("Failed to write image: {}", e)))?;

        debug!(
            "Rendered spectrogram for {} ({} frames, {:.1}s) to {}",
            title,
            num_frames,
            buffer.duration,
            output.display()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stft"
    }
}

/// Max-pooled dB values for every pixel, filled one STFT frame at a time
///
/// Holds `width * height` cells however many frames the track has.
struct PixelGrid {
    width: u32,
    height: u32,
    /// Frame range of each column
    columns: Vec<(usize, usize)>,
    /// Bin range of each row, lowest frequency first
    rows: Vec<(usize, usize)>,
    /// Column-major, row 0 is the lowest frequency
    cells: Vec<f32>,
    /// First column whose frame range has not been passed yet
    next_column: usize,
    row_max: Vec<f32>,
}

impl PixelGrid {
    fn new(width: u32, height: u32, num_frames: usize) -> Self {
        let columns = if num_frames == 0 {
            Vec::new()
        } else {
            (0..width).map(|x| span(x, width, num_frames)).collect()
        };
        let rows = (0..height)
            .map(|r| span(r, height, stft::NUM_FREQ_BINS))
            .collect();

        Self {
            width,
            height,
            columns,
            rows,
            cells: vec![f32::NEG_INFINITY; width as usize * height as usize],
            next_column: 0,
            row_max: vec![f32::NEG_INFINITY; height as usize],
        }
    }

    /// Fold frame `index` into every column covering it
    ///
    /// Frames must arrive in index order.
    fn add_frame(&mut self, index: usize, frame: &[f32]) {
        for (max, &(b0, b1)) in self.row_max.iter_mut().zip(&self.rows) {
            *max = frame[b0..b1].iter().copied().fold(f32::NEG_INFINITY, f32::max);
        }

        while self.next_column < self.columns.len() && self.columns[self.next_column].1 <= index {
            self.next_column += 1;
        }

        let height = self.height as usize;
        for x in self.next_column..self.columns.len() {
            let (f0, f1) = self.columns[x];
            if f0 > index {
                break;
            }
            if index < f1 {
                let column = &mut self.cells[x * height..(x + 1) * height];
                for (cell, &db) in column.iter_mut().zip(&self.row_max) {
                    *cell = cell.max(db);
                }
            }
        }
    }

    /// Normalize against the loudest cell and colour each pixel
    fn into_image(self) -> RgbImage {
        let mut image = RgbImage::new(self.width, self.height);
        if self.columns.is_empty() {
            return image;
        }

        let peak = self.cells.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - DYNAMIC_RANGE_DB;
        let height = self.height as usize;

        for (idx, &db) in self.cells.iter().enumerate() {
            let x = (idx / height) as u32;
            let row = (idx % height) as u32;
            // Image row 0 is the top, i.e. the highest frequency
            let y = self.height - 1 - row;
            let level = ((db - floor) / DYNAMIC_RANGE_DB).clamp(0.0, 1.0);
            image.put_pixel(x, y, viridis(level));
        }

        image
    }
}

/// Source index range covered by pixel `pixel` of `pixels`, never empty
fn span(pixel: u32, pixels: u32, len: usize) -> (usize, usize) {
    let start = (pixel as usize * len) / pixels as usize;
    let end = ((pixel as usize + 1) * len) / pixels as usize;
    let start = start.min(len - 1);
    (start, end.max(start + 1).min(len))
}

/// Map a level in `[0, 1]` onto the viridis colour map
pub fn viridis(level: f32) -> Rgb<u8> {
    let scaled = level.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let t = scaled - lower as f32;

    let (a, b) = (VIRIDIS[lower], VIRIDIS[lower + 1]);
    let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use tempfile::TempDir;

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), Rgb([68, 1, 84]));
        assert_eq!(viridis(1.0), Rgb([253, 231, 37]));
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(7.0), viridis(1.0));
    }

    #[test]
    fn test_span_covers_everything() {
        let covered: Vec<(usize, usize)> = (0..4).map(|p| span(p, 4, 10)).collect();
        assert_eq!(covered.first().unwrap().0, 0);
        assert_eq!(covered.last().unwrap().1, 10);

        // More pixels than samples still yields non-empty ranges
        for p in 0..100 {
            let (s, e) = span(p, 100, 3);
            assert!(s < e && e <= 3);
        }
    }

    /// Pool a fully materialized spectrogram directly, pixel by pixel
    fn pool_all(frames: &[Vec<f32>], width: u32, height: u32) -> RgbImage {
        let mut image = RgbImage::new(width, height);
        let peak = frames
            .iter()
            .flat_map(|f| f.iter().copied())
            .fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - DYNAMIC_RANGE_DB;

        for x in 0..width {
            let (f0, f1) = span(x, width, frames.len());
            for y in 0..height {
                let (b0, b1) = span(height - 1 - y, height, stft::NUM_FREQ_BINS);
                let db = frames[f0..f1]
                    .iter()
                    .flat_map(|f| f[b0..b1].iter().copied())
                    .fold(f32::NEG_INFINITY, f32::max);
                let level = ((db - floor) / DYNAMIC_RANGE_DB).clamp(0.0, 1.0);
                image.put_pixel(x, y, viridis(level));
            }
        }
        image
    }

    fn chirp(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / 44100.0;
                (2.0 * PI * (200.0 + 4000.0 * t) * t).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn test_streamed_grid_matches_full_pooling() {
        let samples = chirp(stft::WINDOW_SIZE + stft::HOP_LENGTH * 40);
        let mut frames = Vec::new();
        stft::for_each_frame(&samples, |_, f| frames.push(f.to_vec()));

        // Fewer columns than frames, more columns than frames, and one column
        for (width, height) in [(7, 13), (97, 40), (1, 5)] {
            let mut grid = PixelGrid::new(width, height, frames.len());
            for (i, f) in frames.iter().enumerate() {
                grid.add_frame(i, f);
            }
            assert_eq!(grid.into_image(), pool_all(&frames, width, height), "{}x{}", width, height);
        }
    }

    #[test]
    fn test_grid_size_is_independent_of_track_length() {
        let samples = chirp(44100 * 5);
        let num_frames = stft::frame_count(samples.len());
        assert!(num_frames > 800);

        let mut grid = PixelGrid::new(20, 10, num_frames);
        stft::for_each_frame(&samples, |i, f| grid.add_frame(i, f));

        assert_eq!(grid.cells.len(), 200);
        assert!(grid.cells.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_render_writes_png() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("plot.png");

        let samples: Vec<f32> = (0..44100)
            .map(|i| (2.0 * PI * 1000.0 * i as f32 / 44100.0).sin() * 0.5)
            .collect();
        let buffer = AudioBuffer::new(samples, 44100);

        StftRenderer::new(200, 100).render(&buffer, "tone.flac", &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = image::open(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100));
    }

    #[test]
    fn test_render_rejects_zero_rate() {
        let dir = TempDir::new().unwrap();
        let buffer = AudioBuffer::new(vec![0.1; 4096], 0);
        let err = StftRenderer::default()
            .render(&buffer, "bad.flac", &dir.path().join("x.png"))
            .unwrap_err();
        assert!(matches!(err, RelprepError::RenderError { .. }));
    }

    #[test]
    fn test_render_rejects_empty_buffer() {
        let dir = TempDir::new().unwrap();
        let buffer = AudioBuffer::new(Vec::new(), 44100);
        assert!(StftRenderer::default()
            .render(&buffer, "empty.flac", &dir.path().join("x.png"))
            .is_err());
    }
}
