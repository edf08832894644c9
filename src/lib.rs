//! relprep - FLAC release preparation
//!
//! A command-line utility that turns album folders of FLAC files into
//! posting material: a per-track technical table, optional hosted
//! spectrograms, and `.torrent` files built for a tracker profile.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing, runtime settings and tracker profiles
//! - `discovery`: Album directory scanning
//! - `audio`: Audio decoding using symphonia
//! - `analysis`: Metadata extraction, checksums and spectrogram rendering
//! - `upload`: Image host client
//! - `pipeline`: Album aggregation and orchestration
//! - `torrent`: Bencode, piece hashing and descriptor packaging
//! - `export`: BBCode, Markdown, compact and JSON reports
//!
//! # Example
//!
//! ```no_run
//! use relprep::{config::Settings, pipeline};
//!
//! let settings = Settings::default();
//! let result = pipeline::run(&settings).expect("Pipeline failed");
//! eprintln!("Analyzed {} tracks in {} albums", result.tracks, result.albums);
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod torrent;
pub mod types;
pub mod upload;

// Re-export key types at crate root
pub use error::{RelprepError, Result};
pub use types::{AlbumCollection, AlbumRecord, AudioBuffer, Ordinal, Spectrogram, TrackRecord};
