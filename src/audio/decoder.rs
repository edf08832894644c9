//! Audio decoding using symphonia
//!
//! Decodes audio files to mono f32 samples at their native sample rate.

use crate::analysis::traits::AudioDecoder;
use crate::error::{RelprepError, Result};
use crate::types::AudioBuffer;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Maximum file size we'll attempt to decode (4GB)
/// Hi-res multichannel albums can exceed 2GB per track
const MAX_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Decoder backed by symphonia
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode_mono(&self, path: &Path) -> Result<AudioBuffer> {
        decode(path)
    }

    fn name(&self) -> &'static str {
        "symphonia"
    }
}

fn decode_error(path: &Path, reason: impl Into<String>) -> RelprepError {
    RelprepError::DecodeError {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Decode an audio file to a mono AudioBuffer
pub fn decode(path: &Path) -> Result<AudioBuffer> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| decode_error(path, format!("Failed to read file metadata: {}", e)))?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(decode_error(
            path,
            format!(
                "File too large ({:.1} GB). Maximum supported size is 4 GB.",
                metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0)
            ),
        ));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| decode_error(path, format!("Failed to open file: {}", e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_error(path, format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_error(path, "No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    // A stream without a declared rate cannot be placed on a time axis
    let sample_rate = codec_params.sample_rate.unwrap_or(0);
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

    debug!(
        "Decoding: {} @ {}Hz, {} channels",
        path.display(),
        sample_rate,
        channels
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(path, format!("Failed to create decoder: {}", e)))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(decode_error(path, format!("Failed to read packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                trace!("Skipping corrupted frame: {}", e);
                continue;
            }
            Err(e) => return Err(decode_error(path, format!("Decode error: {}", e))),
        };

        let spec = *decoded.spec();
        let frame_channels = spec.channels.count().max(1);
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        all_samples.extend(to_mono(sample_buf.samples(), frame_channels));
    }

    let buffer = AudioBuffer::new(all_samples, sample_rate);
    debug!("Decoded {} samples ({:.2}s)", buffer.len(), buffer.duration);

    Ok(buffer)
}

/// Convert interleaved multi-channel audio to mono
fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for _ in 0..channels {
                let v = ((i as f32 * 0.05).sin() * 8000.0) as i16;
                writer.write_sample(v).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_to_mono_stereo() {
        let stereo = vec![0.5, 0.3, 0.8, 0.2, 1.0, 0.0];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.5).abs() < 0.001);
        assert!((mono[2] - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_to_mono_already_mono() {
        let mono = vec![0.5, 0.8, 1.0];
        assert_eq!(to_mono(&mono, 1), mono);
    }

    #[test]
    fn test_decode_keeps_native_rate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, 48000, 4800);

        let buffer = SymphoniaDecoder.decode_mono(&path).unwrap();
        assert_eq!(buffer.sample_rate, 48000);
        assert_eq!(buffer.len(), 4800);
        assert!((buffer.duration - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noise.flac");
        std::fs::write(&path, b"definitely not flac").unwrap();

        let err = SymphoniaDecoder.decode_mono(&path).unwrap_err();
        assert!(matches!(err, RelprepError::DecodeError { .. }));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode(Path::new("/nonexistent/file.flac")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/file.flac"));
    }
}
