//! Core data types for relprep
//!
//! These types represent the release model and flow through the pipeline.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Track position
// =============================================================================

/// A track's position within its disc
///
/// Keeps the raw tag text for display and the parsed number for ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordinal {
    raw: String,
    number: Option<u32>,
}

impl Ordinal {
    /// Display text used when the track number tag is absent
    pub const MISSING: &'static str = "-";

    /// Parse a track number tag such as `"3"`, `"03/12"` or `"2-05"`
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            number: parse_ordinal_number(raw),
        }
    }

    pub fn missing() -> Self {
        Self {
            raw: Self::MISSING.to_string(),
            number: None,
        }
    }

    /// Numeric position, if the tag is numeric
    pub fn number(&self) -> Option<u32> {
        self.number
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Ordinal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Numeric value of a track number tag
///
/// Only the part before a `/` counts, a `<disc>-` or `<disc>.` prefix is
/// dropped, and leading zeros do not matter (`"03/12"` and `"3"` are both 3).
pub fn parse_ordinal_number(raw: &str) -> Option<u32> {
    let head = raw.split('/').next().unwrap_or_default().trim();
    parse_digits(strip_disc_prefix(head))
}

/// Numeric value of a disc number tag (`"1"`, `"01"`, `"1/2"`)
pub fn parse_disc_number(raw: &str) -> Option<u32> {
    parse_digits(raw.split('/').next().unwrap_or_default().trim())
}

fn strip_disc_prefix(value: &str) -> &str {
    match value.find(|c: char| c == '-' || c == '.') {
        Some(idx) if idx > 0 && value[..idx].chars().all(|c| c.is_ascii_digit()) => {
            &value[idx + 1..]
        }
        _ => value,
    }
}

fn parse_digits(value: &str) -> Option<u32> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let trimmed = value.trim_start_matches('0');
    if trimmed.is_empty() {
        return Some(0);
    }
    trimmed.parse().ok()
}

// =============================================================================
// Spectrogram reference
// =============================================================================

/// Outcome of the spectrogram stage for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spectrogram {
    /// Not rendered (stage disabled or track not selected)
    NotRequested,
    /// Rendered and uploaded; holds the hosted image URL
    Hosted(String),
    /// Rendering or upload failed; holds the cause
    Failed(String),
}

impl Spectrogram {
    /// Sentinel shown when no spectrogram was requested
    pub const SENTINEL: &'static str = "N/A";
    /// Marker shown when a spectrogram was requested but could not be produced
    pub const FAILURE_MARKER: &'static str = "FAILED";

    pub fn url(&self) -> Option<&str> {
        match self {
            Spectrogram::Hosted(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Spectrogram::NotRequested)
    }
}

impl fmt::Display for Spectrogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spectrogram::NotRequested => f.write_str(Self::SENTINEL),
            Spectrogram::Hosted(url) => f.write_str(url),
            Spectrogram::Failed(_) => f.write_str(Self::FAILURE_MARKER),
        }
    }
}

impl Serialize for Spectrogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Raw stream facts
// =============================================================================

/// Tag and stream-info snapshot produced by a metadata reader
///
/// Tag fields are `None` when the tag is absent or blank; defaults are
/// applied once when the snapshot becomes a [`TrackRecord`].
#[derive(Debug, Clone)]
pub struct StreamMetadata {
    pub track_number: Option<String>,
    pub disc_number: Option<String>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub duration: Duration,
    pub channels: u8,
    pub bit_depth: u8,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Audio bitrate in kbps
    pub bitrate_kbps: u32,
    /// Declared container type, e.g. `audio/flac`
    pub mime_type: mime::Mime,
    pub has_cuesheet: bool,
}

// =============================================================================
// Track representation
// =============================================================================

/// Facts extracted from one audio file
///
/// Field order here is the column order of every rendered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    #[serde(rename = "#")]
    pub ordinal: Ordinal,
    pub disc: Option<u32>,
    pub artist: String,
    pub title: String,
    /// `HH:MM:SS`
    pub duration: String,
    pub channels: u8,
    pub bits_per_sample: u8,
    /// e.g. `44.1 kHz`
    pub sample_rate: String,
    /// e.g. `1021 kbps`
    pub bitrate: String,
    pub codec: String,
    pub embedded_cuesheet: bool,
    pub spectrogram: Spectrogram,
    /// Lowercase hex MD5 of the whole file
    pub audio_md5: String,
}

/// One named field of a [`TrackRecord`], ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: &'static str,
    pub text: String,
    /// Set when the text is a hyperlink target
    pub link: bool,
}

impl TrackRecord {
    /// Default artist and title when the tag is absent
    pub const UNKNOWN: &'static str = "Unknown";

    /// Field names in column order
    pub const FIELD_NAMES: [&'static str; 13] = [
        "#",
        "disc",
        "artist",
        "title",
        "duration",
        "channels",
        "bits_per_sample",
        "sample_rate",
        "bitrate",
        "codec",
        "embedded_cuesheet",
        "spectrogram",
        "audio_md5",
    ];

    /// Build a record from a metadata snapshot, resolving every default once
    pub fn from_stream(meta: StreamMetadata, audio_md5: String) -> Self {
        let ordinal = meta
            .track_number
            .as_deref()
            .map(Ordinal::parse)
            .unwrap_or_else(Ordinal::missing);

        Self {
            ordinal,
            disc: meta.disc_number.as_deref().and_then(parse_disc_number),
            artist: meta.artist.unwrap_or_else(|| Self::UNKNOWN.to_string()),
            title: meta.title.unwrap_or_else(|| Self::UNKNOWN.to_string()),
            duration: format_hms(meta.duration),
            channels: meta.channels,
            bits_per_sample: meta.bit_depth,
            sample_rate: format_sample_rate(meta.sample_rate),
            bitrate: format!("{} kbps", meta.bitrate_kbps),
            codec: meta.mime_type.subtype().as_str().to_uppercase(),
            embedded_cuesheet: meta.has_cuesheet,
            spectrogram: Spectrogram::NotRequested,
            audio_md5,
        }
    }

    /// Attach the spectrogram stage outcome
    pub fn with_spectrogram(self, spectrogram: Spectrogram) -> Self {
        Self { spectrogram, ..self }
    }

    /// `(disc, ordinal)` when both are numeric
    pub fn sort_key(&self) -> Option<(u32, u32)> {
        Some((self.disc?, self.ordinal.number()?))
    }

    /// All fields in column order
    pub fn fields(&self) -> Vec<FieldValue> {
        let texts = [
            self.ordinal.to_string(),
            self.disc.unwrap_or(0).to_string(),
            self.artist.clone(),
            self.title.clone(),
            self.duration.clone(),
            self.channels.to_string(),
            self.bits_per_sample.to_string(),
            self.sample_rate.clone(),
            self.bitrate.clone(),
            self.codec.clone(),
            self.embedded_cuesheet.to_string(),
            self.spectrogram.to_string(),
            self.audio_md5.clone(),
        ];

        Self::FIELD_NAMES
            .iter()
            .zip(texts)
            .map(|(&name, text)| FieldValue {
                name,
                link: name == "spectrogram" && self.spectrogram.url().is_some(),
                text,
            })
            .collect()
    }
}

/// Format a duration as `HH:MM:SS`, truncating fractional seconds
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a sample rate in kHz: `44100` → `44.1 kHz`, `48000` → `48.0 kHz`
pub fn format_sample_rate(hz: u32) -> String {
    let khz = hz as f64 / 1000.0;
    if khz.fract() == 0.0 {
        format!("{:.1} kHz", khz)
    } else {
        format!("{} kHz", khz)
    }
}

// =============================================================================
// Album representation
// =============================================================================

/// Ordered mapping from file name to [`TrackRecord`] for one directory
#[derive(Debug, Clone, Default)]
pub struct AlbumRecord {
    path: PathBuf,
    tracks: Vec<(String, TrackRecord)>,
    sorted: bool,
    failures: Vec<String>,
}

impl AlbumRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a track, replacing any earlier entry with the same file name in place
    pub fn insert(&mut self, file_name: impl Into<String>, record: TrackRecord) {
        let file_name = file_name.into();
        match self.tracks.iter_mut().find(|(name, _)| *name == file_name) {
            Some(entry) => entry.1 = record,
            None => self.tracks.push((file_name, record)),
        }
    }

    pub fn get(&self, file_name: &str) -> Option<&TrackRecord> {
        self.tracks
            .iter()
            .find(|(name, _)| name == file_name)
            .map(|(_, record)| record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrackRecord)> {
        self.tracks.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.tracks.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn first(&self) -> Option<&TrackRecord> {
        self.tracks.first().map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether release ordering was applied (false means encounter order)
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Per-file failures reported while building this album
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    /// Order tracks by `(disc, ordinal)` if every track has both keys
    ///
    /// Either every record yields a key and the whole album is stably
    /// re-ordered, or the album keeps encounter order untouched.
    pub fn apply_release_order(&mut self) -> bool {
        let keys: Option<Vec<(u32, u32)>> =
            self.tracks.iter().map(|(_, record)| record.sort_key()).collect();

        let Some(keys) = keys else {
            self.sorted = false;
            return false;
        };

        let mut keyed: Vec<_> = keys.into_iter().zip(std::mem::take(&mut self.tracks)).collect();
        keyed.sort_by_key(|(key, _)| *key);
        self.tracks = keyed.into_iter().map(|(_, entry)| entry).collect();
        self.sorted = true;
        true
    }
}

/// Albums found under a batch of roots, in walk order
pub type AlbumCollection = Vec<AlbumRecord>;

// =============================================================================
// Audio buffer types
// =============================================================================

/// Decoded mono samples ready for spectrogram rendering
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// File classification
// =============================================================================

/// How a file inside an album directory is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `.flac`, analyzed
    Flac,
    /// Audio in another format, not analyzed and not warned about
    Audio,
    /// Cover art and other images, tolerated silently
    Image,
    /// Cue sheets, rip logs, playlists, notes; tolerated silently
    Sidecar,
    /// Anything else; tolerated with a warning
    Other,
}

impl EntryKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("flac") => EntryKind::Flac,
            Some(
                "mp3" | "wav" | "ogg" | "oga" | "opus" | "m4a" | "aac" | "aif" | "aiff" | "wv" | "ape" | "alac"
                | "dsf" | "dff" | "wma" | "mka",
            ) => EntryKind::Audio,
            Some("jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp") => EntryKind::Image,
            Some("cue" | "log" | "m3u" | "m3u8" | "txt" | "nfo" | "accurip") => EntryKind::Sidecar,
            _ => EntryKind::Other,
        }
    }

    /// Check if a path has a case-insensitive `.flac` suffix
    pub fn is_flac_path(path: &Path) -> bool {
        Self::from_path(path) == EntryKind::Flac
    }
}
