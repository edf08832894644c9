//! Capability traits for external collaborators
//!
//! Tag reading, decoding, plotting and image hosting sit behind these traits
//! so the pipeline can run against stub backends in tests.

use crate::error::Result;
use crate::types::{AudioBuffer, StreamMetadata};
use std::path::Path;

/// Tag and stream-info reader
pub trait MetadataReader {
    /// Read tags, stream properties and container type of one file
    fn read(&self, path: &Path) -> Result<StreamMetadata>;

    /// Get the name of this reader (for logging)
    fn name(&self) -> &'static str;
}

/// PCM decoder
pub trait AudioDecoder {
    /// Decode a file and down-mix it to one channel at its native sample rate
    fn decode_mono(&self, path: &Path) -> Result<AudioBuffer>;

    /// Get the name of this decoder (for logging)
    fn name(&self) -> &'static str;
}

/// Spectrogram plotter
pub trait SpectrogramRenderer {
    /// Render a time-frequency magnitude image of `buffer` to `output`
    ///
    /// # Arguments
    /// * `buffer` - Mono samples; the sample rate must be non-zero
    /// * `title` - Caption identifying the track
    /// * `output` - Image path to write
    fn render(&self, buffer: &AudioBuffer, title: &str, output: &Path) -> Result<()>;

    /// Get the name of this renderer (for logging)
    fn name(&self) -> &'static str;
}

/// Image hosting service
pub trait ImageHost {
    /// Upload a local image and return its public URL
    fn upload(&self, image: &Path) -> Result<String>;

    /// Get the name of this host (for logging)
    fn name(&self) -> &'static str;
}
