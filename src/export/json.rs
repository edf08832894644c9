//! JSON export for interoperability with other tools

use crate::error::{RelprepError, Result};
use crate::types::{AlbumRecord, TrackRecord};
use serde::Serialize;
use std::path::Path;

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON output structure
#[derive(Debug, Serialize)]
pub struct ReportJson<'a> {
    /// Schema version for forward compatibility
    pub version: &'static str,
    /// relprep version that generated this document
    pub generator_version: &'static str,
    pub albums: Vec<AlbumJson<'a>>,
}

#[derive(Debug, Serialize)]
pub struct AlbumJson<'a> {
    pub path: String,
    /// Whether disc/track ordering was applied
    pub sorted: bool,
    pub tracks: Vec<TrackJson<'a>>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub failures: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct TrackJson<'a> {
    pub filename: &'a str,
    #[serde(flatten)]
    pub record: &'a TrackRecord,
}

/// Render albums as one pretty-printed document
pub fn render(albums: &[AlbumRecord]) -> Result<String> {
    let document = ReportJson {
        version: SCHEMA_VERSION,
        generator_version: env!("CARGO_PKG_VERSION"),
        albums: albums.iter().map(album_to_json).collect(),
    };

    serde_json::to_string_pretty(&document).map_err(|e| RelprepError::OutputError {
        path: albums
            .first()
            .map(|a| a.path().to_path_buf())
            .unwrap_or_else(|| Path::new("-").to_path_buf()),
        reason: format!("Failed to serialize report: {}", e),
    })
}

fn album_to_json(album: &AlbumRecord) -> AlbumJson<'_> {
    AlbumJson {
        path: album.path().to_string_lossy().to_string(),
        sorted: album.is_sorted(),
        tracks: album
            .iter()
            .map(|(filename, record)| TrackJson { filename, record })
            .collect(),
        failures: album.failures(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::table::tests::album;

    #[test]
    fn test_document_shape() {
        let out = render(&[album()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["albums"][0]["path"], "/music/Album");
        assert!(value["albums"][0].get("failures").is_none());

        let track = &value["albums"][0]["tracks"][0];
        assert_eq!(track["filename"], "01 One.flac");
        assert_eq!(track["#"], "1");
        assert_eq!(track["disc"], 1);
        assert_eq!(track["sample_rate"], "44.1 kHz");
        assert_eq!(track["spectrogram"], "N/A");
        assert_eq!(track["embedded_cuesheet"], false);

        assert_eq!(value["albums"][0]["tracks"][1]["spectrogram"], "https://img/2.png");
    }

    #[test]
    fn test_failures_are_listed() {
        let mut album = album();
        album.record_failure("Invalid input '/music/Album/x.flac': bad");
        let out = render(&[album]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["albums"][0]["failures"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_collection() {
        let value: serde_json::Value = serde_json::from_str(&render(&[]).unwrap()).unwrap();
        assert!(value["albums"].as_array().unwrap().is_empty());
    }
}
