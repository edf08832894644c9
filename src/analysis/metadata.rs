//! Metadata extraction from FLAC files
//!
//! Uses lofty to read Vorbis comments and STREAMINFO, plus a direct walk over
//! the FLAC metadata blocks to detect an embedded CUESHEET block.
//!
//! Track and disc numbers are taken verbatim from the Vorbis comments. lofty's
//! generic tag splits `03/12` into a number and a total, which would lose the
//! text shown in the report.

use crate::analysis::checksum;
use crate::analysis::traits::MetadataReader;
use crate::error::{RelprepError, Result};
use crate::types::{EntryKind, StreamMetadata, TrackRecord};
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, FileType, TaggedFile, TaggedFileExt};
use lofty::flac::FlacFile;
use lofty::ogg::VorbisComments;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, trace};

/// Turns one `.flac` file into a [`TrackRecord`]
pub struct MetadataExtractor<R = LoftyMetadataReader> {
    reader: R,
}

impl<R: MetadataReader> MetadataExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Extract one file's facts
    ///
    /// Fails with `InvalidInput` unless `path` is an existing file with a
    /// `.flac` suffix. Absent tags resolve to their defaults instead of failing.
    /// The spectrogram field is left as the "N/A" sentinel.
    pub fn extract(&self, path: &Path) -> Result<TrackRecord> {
        validate_input(path)?;

        let meta = self.reader.read(path)?;
        let audio_md5 = checksum::file_md5(path).map_err(|e| RelprepError::MetadataError {
            path: path.to_path_buf(),
            reason: format!("Failed to read file bytes: {}", e),
        })?;

        let record = TrackRecord::from_stream(meta, audio_md5);
        debug!(
            "Extracted {}: #{} {} - {} ({}, {})",
            path.display(),
            record.ordinal,
            record.artist,
            record.title,
            record.codec,
            record.duration
        );

        Ok(record)
    }
}

impl Default for MetadataExtractor<LoftyMetadataReader> {
    fn default() -> Self {
        Self::new(LoftyMetadataReader)
    }
}

/// Check that a path is an existing file named `*.flac` (any case)
pub fn validate_input(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(RelprepError::invalid_input(path, "not an existing file"));
    }
    if !EntryKind::is_flac_path(path) {
        return Err(RelprepError::invalid_input(path, "expected a .flac file"));
    }
    Ok(())
}

// =============================================================================
// lofty backend
// =============================================================================

/// Metadata reader backed by lofty
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyMetadataReader;

impl MetadataReader for LoftyMetadataReader {
    fn read(&self, path: &Path) -> Result<StreamMetadata> {
        let metadata_error = |reason: String| RelprepError::MetadataError {
            path: path.to_path_buf(),
            reason,
        };

        // Container type comes from the file's magic bytes, not its extension
        let probe = Probe::open(path)
            .map_err(|e| metadata_error(format!("Failed to open file: {}", e)))?
            .guess_file_type()
            .map_err(|e| metadata_error(format!("Failed to probe format: {}", e)))?;

        let file_type = probe
            .file_type()
            .ok_or_else(|| RelprepError::invalid_input(path, "unrecognized audio container"))?;
        let mime_type = mime_for_file_type(file_type)
            .ok_or_else(|| RelprepError::invalid_input(path, format!("unsupported container {:?}", file_type)))?;

        let (tagged_file, raw) = if file_type == FileType::Flac {
            drop(probe);
            let mut reader = BufReader::new(
                File::open(path).map_err(|e| metadata_error(format!("Failed to open file: {}", e)))?,
            );
            let flac = <FlacFile as AudioFile>::read_from(&mut reader, ParseOptions::new())
                .map_err(|e| metadata_error(format!("Failed to read tags: {}", e)))?;
            let raw = flac.vorbis_comments().map(RawComments::from_vorbis).unwrap_or_default();
            (TaggedFile::from(flac), Some(raw))
        } else {
            let tagged_file = probe
                .read()
                .map_err(|e| metadata_error(format!("Failed to read tags: {}", e)))?;
            (tagged_file, None)
        };

        let properties = tagged_file.properties();
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let (track_number, disc_number, cuesheet_comment) = match raw {
            Some(raw) => (raw.track_number, raw.disc_number, raw.has_cuesheet),
            None => (
                tag.and_then(|t| tag_text(t, &ItemKey::TrackNumber)),
                tag.and_then(|t| tag_text(t, &ItemKey::DiscNumber)),
                tag.is_some_and(has_cuesheet_comment),
            ),
        };

        let mut has_cuesheet = cuesheet_comment;
        if !has_cuesheet && file_type == FileType::Flac {
            has_cuesheet = has_cuesheet_block(path).unwrap_or_else(|e| {
                trace!("Metadata block walk failed for {}: {}", path.display(), e);
                false
            });
        }

        if tag.is_none() {
            debug!("No tags found in {}", path.display());
        }

        Ok(StreamMetadata {
            track_number,
            disc_number,
            artist: tag.and_then(|t| non_blank(t.artist().as_deref())),
            title: tag.and_then(|t| non_blank(t.title().as_deref())),
            duration: properties.duration(),
            channels: properties.channels().unwrap_or(0),
            bit_depth: properties.bit_depth().unwrap_or(0),
            sample_rate: properties.sample_rate().unwrap_or(0),
            bitrate_kbps: properties
                .audio_bitrate()
                .or_else(|| properties.overall_bitrate())
                .unwrap_or(0),
            mime_type,
            has_cuesheet,
        })
    }

    fn name(&self) -> &'static str {
        "lofty"
    }
}

/// Vorbis comment fields whose text must survive untouched
#[derive(Debug, Default)]
struct RawComments {
    track_number: Option<String>,
    disc_number: Option<String>,
    has_cuesheet: bool,
}

impl RawComments {
    fn from_vorbis(comments: &VorbisComments) -> Self {
        Self {
            track_number: non_blank(comments.get("TRACKNUMBER")),
            disc_number: non_blank(comments.get("DISCNUMBER")),
            has_cuesheet: comments.get("CUESHEET").is_some(),
        }
    }
}

fn tag_text(tag: &Tag, key: &ItemKey) -> Option<String> {
    non_blank(tag.get_string(key))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn has_cuesheet_comment(tag: &Tag) -> bool {
    tag.items().any(|item| match item.key() {
        ItemKey::Unknown(key) => key.eq_ignore_ascii_case("cuesheet"),
        _ => false,
    })
}

/// Declared MIME type of a probed container
fn mime_for_file_type(file_type: FileType) -> Option<mime::Mime> {
    let essence = match file_type {
        FileType::Flac => "audio/flac",
        FileType::Mpeg => "audio/mpeg",
        FileType::Vorbis | FileType::Opus => "audio/ogg",
        FileType::Wav => "audio/wav",
        FileType::Aiff => "audio/aiff",
        FileType::Mp4 => "audio/mp4",
        _ => return None,
    };
    essence.parse().ok()
}

// =============================================================================
// FLAC metadata blocks
// =============================================================================

const FLAC_MARKER: &[u8; 4] = b"fLaC";
const BLOCK_TYPE_CUESHEET: u8 = 5;

/// Walk the FLAC metadata block chain looking for a CUESHEET block
///
/// A leading ID3v2 tag is skipped. Returns `Ok(false)` for streams that are
/// not FLAC.
pub fn has_cuesheet_block(path: &Path) -> std::io::Result<bool> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut marker = [0u8; 4];
    reader.read_exact(&mut marker)?;

    if &marker[..3] == b"ID3" {
        let mut rest = [0u8; 6];
        reader.read_exact(&mut rest)?;
        // Synchsafe size, 7 bits per byte
        let size = rest[2..6]
            .iter()
            .fold(0i64, |acc, &b| (acc << 7) | i64::from(b & 0x7f));
        // marker[3] is the first byte after "ID3"; 10-byte header total
        reader.seek_relative(size)?;
        reader.read_exact(&mut marker)?;
    }

    if &marker != FLAC_MARKER {
        return Ok(false);
    }

    loop {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header)?;

        let is_last = header[0] & 0x80 != 0;
        let block_type = header[0] & 0x7f;
        let length = u32::from_be_bytes([0, header[1], header[2], header[3]]);

        if block_type == BLOCK_TYPE_CUESHEET {
            return Ok(true);
        }
        if is_last {
            return Ok(false);
        }
        reader.seek_relative(i64::from(length))?;
    }
}
