//! Per-track analysis
//!
//! Capability traits live in [`traits`]; the pipeline only talks to those so
//! tag reading, decoding, plotting and hosting can be swapped independently.

pub mod checksum;
pub mod metadata;
pub mod spectrogram;
pub mod traits;

pub use metadata::{LoftyMetadataReader, MetadataExtractor};
pub use spectrogram::{SpectrogramSelection, SpectrogramStage, StftRenderer};
pub use traits::{AudioDecoder, ImageHost, MetadataReader, SpectrogramRenderer};
